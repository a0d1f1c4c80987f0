//! Google Drive v3 client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use shorts_models::RemoteAsset;

use crate::auth::{BearerSource, ServiceAccountFetcher, DRIVE_READONLY_SCOPE};
use crate::error::{GoogleError, GoogleResult};
use crate::http::{build_client, error_for_response, send_authorized};
use crate::source::AssetSource;
use crate::token_cache::TokenCache;
use crate::DEFAULT_API_BASE;

/// Server-side filter: videos that are not in the trash.
const VIDEO_QUERY: &str = "mimeType contains 'video/' and trashed = false";

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// API root, overridable for tests
    pub base_url: String,
    /// Restrict listing to a single folder
    pub folder_id: Option<String>,
    /// Files per listing page
    pub page_size: u32,
    /// Timeout for metadata requests
    pub timeout: Duration,
    /// Timeout for a whole download
    pub transfer_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            folder_id: None,
            page_size: 100,
            timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// Google Drive REST client.
#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    auth: Arc<dyn BearerSource>,
}

impl DriveClient {
    pub fn new(config: DriveConfig, auth: Arc<dyn BearerSource>) -> GoogleResult<Self> {
        let http = build_client(config.timeout, config.connect_timeout)?;
        Ok(Self { http, config, auth })
    }

    /// Authenticate with a service-account key.
    pub fn from_service_account_json(json: &str, config: DriveConfig) -> GoogleResult<Self> {
        let fetcher = ServiceAccountFetcher::from_json(json, &[DRIVE_READONLY_SCOPE])?;
        Self::new(config, Arc::new(TokenCache::new(fetcher)))
    }

    fn list_query(&self) -> String {
        match &self.config.folder_id {
            Some(folder) => format!(
                "'{}' in parents and {}",
                folder.replace('\'', "\\'"),
                VIDEO_QUERY
            ),
            None => VIDEO_QUERY.to_string(),
        }
    }

    async fn list_page(&self, page_token: Option<&str>) -> GoogleResult<FileList> {
        let url = format!("{}/drive/v3/files", self.config.base_url);
        let query = self.list_query();
        let page_size = self.config.page_size.to_string();

        let response = send_authorized(self.auth.as_ref(), |token| {
            let mut req = self
                .http
                .get(&url)
                .bearer_auth(token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", "nextPageToken, files(id, name)"),
                    ("pageSize", page_size.as_str()),
                ]);
            if let Some(page_token) = page_token {
                req = req.query(&[("pageToken", page_token)]);
            }
            req
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("Drive list", response).await);
        }

        Ok(response.json().await?)
    }
}

/// Local file name for a downloaded asset: `<id>.<ext>`.
fn local_file_name(asset: &RemoteAsset) -> String {
    let id: String = asset
        .id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let ext = asset.extension().unwrap_or_else(|| "mp4".to_string());
    format!("{}.{}", id, ext)
}

#[async_trait]
impl AssetSource for DriveClient {
    async fn list_video_assets(&self) -> GoogleResult<Vec<RemoteAsset>> {
        let mut assets = Vec::new();
        let mut page_token: Option<String> = None;
        let mut listed = 0usize;

        loop {
            let page = self.list_page(page_token.as_deref()).await?;
            listed += page.files.len();
            assets.extend(
                page.files
                    .into_iter()
                    .map(|f| RemoteAsset::new(f.id, f.name))
                    .filter(RemoteAsset::has_video_extension),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            listed = listed,
            eligible = assets.len(),
            "Listed Drive video assets"
        );
        Ok(assets)
    }

    async fn download_asset(&self, asset: &RemoteAsset, dest_dir: &Path) -> GoogleResult<PathBuf> {
        let url = format!("{}/drive/v3/files/{}", self.config.base_url, asset.id);
        let dest = dest_dir.join(local_file_name(asset));

        let response = send_authorized(self.auth.as_ref(), |token| {
            self.http
                .get(&url)
                .bearer_auth(token)
                .query(&[("alt", "media")])
                .timeout(self.config.transfer_timeout)
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("Drive download", response).await);
        }

        match write_body(response, &dest).await {
            Ok(bytes) => {
                info!(
                    asset = %asset.name,
                    bytes = bytes,
                    "Downloaded {} to {}",
                    asset.id,
                    dest.display()
                );
                Ok(dest)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial download {}: {}", dest.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }
}

/// Stream a response body to `dest`, returning the number of bytes written.
async fn write_body(response: reqwest::Response, dest: &Path) -> GoogleResult<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    if written == 0 {
        return Err(GoogleError::invalid_response("Drive download returned an empty body"));
    }
    Ok(written)
}
