//! YouTube Data API v3 client.
//!
//! Uploads use the resumable protocol: a session is opened with the video
//! metadata, then the file is sent in a single PUT to the session URL.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::auth::{AuthorizedUser, AuthorizedUserFetcher, BearerSource};
use crate::error::{GoogleError, GoogleResult};
use crate::http::{build_client, error_for_response, send_authorized};
use crate::publisher::{Publisher, UploadRequest};
use crate::token_cache::TokenCache;
use crate::DEFAULT_API_BASE;

const VIDEO_MIME: &str = "video/*";
const THUMBNAIL_MIME: &str = "image/jpeg";

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// API root, overridable for tests
    pub base_url: String,
    /// Timeout for metadata requests
    pub timeout: Duration,
    /// Timeout for a whole media transfer
    pub transfer_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(1800),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// YouTube REST client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    config: YouTubeConfig,
    auth: Arc<dyn BearerSource>,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig, auth: Arc<dyn BearerSource>) -> GoogleResult<Self> {
        let http = build_client(config.timeout, config.connect_timeout)?;
        Ok(Self { http, config, auth })
    }

    /// Authenticate with an authorized-user token JSON.
    pub fn from_token_json(json: &str, config: YouTubeConfig) -> GoogleResult<Self> {
        let user = AuthorizedUser::from_json(json)?;
        let fetcher = AuthorizedUserFetcher::new(user)?;
        Self::new(config, Arc::new(TokenCache::new(fetcher)))
    }

    /// Open a resumable upload session and return its URL.
    async fn start_upload_session(
        &self,
        request: &UploadRequest,
        content_length: u64,
    ) -> GoogleResult<String> {
        let url = format!("{}/upload/youtube/v3/videos", self.config.base_url);
        let body = json!({
            "snippet": {
                "title": request.title,
                "description": request.description,
                "tags": request.tags,
                "categoryId": request.category_id,
            },
            "status": {
                "privacyStatus": request.visibility.as_str(),
                "selfDeclaredMadeForKids": false,
            }
        });
        let length = content_length.to_string();

        let response = send_authorized(self.auth.as_ref(), |token| {
            self.http
                .post(&url)
                .bearer_auth(token)
                .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
                .header("X-Upload-Content-Type", VIDEO_MIME)
                .header("X-Upload-Content-Length", length.as_str())
                .json(&body)
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("YouTube upload session", response).await);
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GoogleError::invalid_response("Upload session has no Location header"))
    }
}

#[async_trait]
impl Publisher for YouTubeClient {
    async fn upload_video(&self, path: &Path, request: &UploadRequest) -> GoogleResult<String> {
        let data = Bytes::from(tokio::fs::read(path).await?);
        let session_url = self.start_upload_session(request, data.len() as u64).await?;
        debug!("Opened upload session for {}", path.display());

        let response = send_authorized(self.auth.as_ref(), |token| {
            self.http
                .put(&session_url)
                .bearer_auth(token)
                .header(CONTENT_TYPE, VIDEO_MIME)
                .timeout(self.config.transfer_timeout)
                .body(data.clone())
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("YouTube upload", response).await);
        }

        let video: VideoResource = response.json().await?;
        info!(video_id = %video.id, "Uploaded {} to YouTube", path.display());
        Ok(video.id)
    }

    async fn post_comment(&self, video_id: &str, text: &str) -> GoogleResult<()> {
        let url = format!("{}/youtube/v3/commentThreads", self.config.base_url);
        let body = json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": {
                    "snippet": { "textOriginal": text }
                }
            }
        });

        let response = send_authorized(self.auth.as_ref(), |token| {
            self.http
                .post(&url)
                .bearer_auth(token)
                .query(&[("part", "snippet")])
                .json(&body)
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("YouTube comment", response).await);
        }
        Ok(())
    }

    async fn set_thumbnail(&self, video_id: &str, image_path: &Path) -> GoogleResult<()> {
        let url = format!("{}/upload/youtube/v3/thumbnails/set", self.config.base_url);
        let data = Bytes::from(tokio::fs::read(image_path).await?);

        let response = send_authorized(self.auth.as_ref(), |token| {
            self.http
                .post(&url)
                .bearer_auth(token)
                .query(&[("videoId", video_id), ("uploadType", "media")])
                .header(CONTENT_TYPE, THUMBNAIL_MIME)
                .timeout(self.config.transfer_timeout)
                .body(data.clone())
        })
        .await?;

        if !response.status().is_success() {
            return Err(error_for_response("YouTube thumbnail", response).await);
        }
        Ok(())
    }
}
