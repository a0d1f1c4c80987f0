//! Source asset models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File extensions accepted as publishable video, lowercase, without the dot.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// Opaque identifier assigned to an asset by the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A video file listed by the storage service.
///
/// The display name doubles as the ledger key: an asset is considered
/// published once its name has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAsset {
    /// Storage-assigned identifier
    pub id: AssetId,
    /// Display name (file name in storage)
    pub name: String,
}

impl RemoteAsset {
    pub fn new(id: impl Into<AssetId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the name carries one of the supported video extensions.
    pub fn has_video_extension(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}
