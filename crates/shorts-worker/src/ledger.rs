//! Durable record of published asset names.
//!
//! The ledger is a newline-delimited text file that is only ever appended to.
//! A name present in the file is never selected again, across restarts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PublisherError, PublisherResult};

/// Append-only set of published asset names.
#[derive(Debug)]
pub struct PublicationLedger {
    path: PathBuf,
    published: HashSet<String>,
    /// The file exists and its last byte is not a newline
    needs_separator: bool,
}

impl PublicationLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub async fn open(path: impl Into<PathBuf>) -> PublisherResult<Self> {
        let path = path.into();

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(PublisherError::ledger(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let published: HashSet<String> = contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        let needs_separator = !contents.is_empty() && !contents.ends_with('\n');

        info!(
            entries = published.len(),
            "Loaded publication ledger from {}",
            path.display()
        );

        Ok(Self {
            path,
            published,
            needs_separator,
        })
    }

    /// Whether `name` fits on a single ledger line.
    pub fn can_record(name: &str) -> bool {
        !name.trim().is_empty() && !name.contains(['\n', '\r'])
    }

    pub fn is_published(&self, name: &str) -> bool {
        self.published.contains(name)
    }

    /// Durably record `name`.
    ///
    /// Returns `false` without touching the file when the name is already
    /// recorded. The in-memory set is only updated after the write is synced.
    pub async fn mark_published(&mut self, name: &str) -> PublisherResult<bool> {
        if !Self::can_record(name) {
            return Err(PublisherError::ledger(format!(
                "Asset name {:?} cannot be stored in the ledger",
                name
            )));
        }
        if self.is_published(name) {
            debug!("{} already in ledger", name);
            return Ok(false);
        }

        let mut line = String::with_capacity(name.len() + 2);
        if self.needs_separator {
            line.push('\n');
        }
        line.push_str(name);
        line.push('\n');

        self.append(line.as_bytes()).await.map_err(|e| {
            PublisherError::ledger(format!("Failed to append to {}: {}", self.path.display(), e))
        })?;

        self.needs_separator = false;
        self.published.insert(name.to_string());
        Ok(true)
    }

    async fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_data().await
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
