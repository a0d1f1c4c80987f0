//! Append-only audit log of successful publishes, one JSON object per line.

use std::path::{Path, PathBuf};

use shorts_models::PublishRecord;
use tokio::io::AsyncWriteExt;

use crate::error::{PublisherError, PublisherResult};

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and sync it to disk.
    pub async fn append(&self, record: &PublishRecord) -> PublisherResult<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| PublisherError::audit(format!("Failed to serialize record: {}", e)))?;
        line.push('\n');

        let write = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await
        };

        write.await.map_err(|e| {
            PublisherError::audit(format!("Failed to append to {}: {}", self.path.display(), e))
        })
    }

    /// Read every record back; a missing file has no records.
    pub async fn read_all(&self) -> PublisherResult<Vec<PublishRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| {
                    PublisherError::audit(format!("Malformed record {}: {}", idx + 1, e))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorts_models::{PublishMetadata, VideoProperties};
    use tempfile::TempDir;

    fn metadata() -> PublishMetadata {
        PublishMetadata {
            title: "Hook money 2026 #Shorts".to_string(),
            description: "body".to_string(),
            hashtags: vec!["#Shorts".to_string(), "#money".to_string(), "#goals".to_string()],
        }
    }

    #[tokio::test]
    async fn test_records_are_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("uploads.jsonl"));

        log.append(&PublishRecord::new("a.mp4", "id-a", &metadata())).await.unwrap();
        log.append(
            &PublishRecord::new("b.mp4", "id-b", &metadata())
                .with_notes(vec!["no-ffprobe: ffprobe not found".to_string()])
                .with_properties(Some(VideoProperties::new(1080, 1920, 30.0))),
        )
        .await
        .unwrap();

        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].platform_id, "id-a");
        assert_eq!(records[1].platform_url, "https://youtu.be/id-b");
        assert_eq!(records[1].notes.len(), 1);
        assert_eq!(records[1].properties.unwrap().height, 1920);

        let raw = tokio::fs::read_to_string(log.path()).await.unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("none.jsonl"));
        assert!(log.read_all().await.unwrap().is_empty());
    }
}
