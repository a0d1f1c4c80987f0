//! Storage collaborator contract.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shorts_models::RemoteAsset;

use crate::error::GoogleResult;

/// Lists and downloads source videos.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Every non-trashed video asset visible to the account.
    async fn list_video_assets(&self) -> GoogleResult<Vec<RemoteAsset>>;

    /// Download `asset` into `dest_dir`, returning the local path once the
    /// file is fully written.
    async fn download_asset(&self, asset: &RemoteAsset, dest_dir: &Path) -> GoogleResult<PathBuf>;
}
