//! Publishing collaborator contract.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use shorts_models::{PublishMetadata, Visibility};

use crate::error::GoogleResult;

/// Everything the platform needs besides the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    /// Tags without the leading `#`
    pub tags: Vec<String>,
    pub category_id: String,
    pub visibility: Visibility,
}

impl UploadRequest {
    pub fn from_metadata(
        metadata: &PublishMetadata,
        category_id: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            tags: metadata.tags(),
            category_id: category_id.into(),
            visibility,
        }
    }
}

/// Uploads videos and performs follow-up actions on them.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload the file and return the platform video id.
    async fn upload_video(&self, path: &Path, request: &UploadRequest) -> GoogleResult<String>;

    /// Post a top-level comment on a published video.
    async fn post_comment(&self, video_id: &str, text: &str) -> GoogleResult<()>;

    /// Replace the thumbnail of a published video.
    async fn set_thumbnail(&self, video_id: &str, image_path: &Path) -> GoogleResult<()>;
}
