//! Publish metadata and audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::video::VideoProperties;

/// Title, description and hashtags generated for one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    /// Hashtags including the leading `#`
    pub hashtags: Vec<String>,
}

impl PublishMetadata {
    /// Hashtags as platform tags (leading `#` removed).
    pub fn tags(&self) -> Vec<String> {
        self.hashtags
            .iter()
            .map(|h| h.trim_start_matches('#').to_string())
            .collect()
    }

    /// Hashtags joined by single spaces.
    pub fn hashtag_line(&self) -> String {
        self.hashtags.join(" ")
    }
}

/// Platform visibility of a published video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility '{0}', expected public, unlisted or private")]
pub struct VisibilityParseError(pub String);

impl FromStr for Visibility {
    type Err = VisibilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            other => Err(VisibilityParseError(other.to_string())),
        }
    }
}

/// One row of the append-only audit log, written after a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub timestamp: DateTime<Utc>,
    /// Name of the source asset in storage
    pub source_name: String,
    /// Video id assigned by the platform
    pub platform_id: String,
    pub platform_url: String,
    pub title: String,
    pub hashtags: Vec<String>,
    /// Validation and repair notes (probe warnings, advisory duration, trims)
    #[serde(default)]
    pub notes: Vec<String>,
    /// Probed properties, absent when probing was unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<VideoProperties>,
}

impl PublishRecord {
    pub fn new(
        source_name: impl Into<String>,
        platform_id: impl Into<String>,
        metadata: &PublishMetadata,
    ) -> Self {
        let platform_id = platform_id.into();
        Self {
            timestamp: Utc::now(),
            source_name: source_name.into(),
            platform_url: short_url(&platform_id),
            platform_id,
            title: metadata.title.clone(),
            hashtags: metadata.hashtags.clone(),
            notes: Vec::new(),
            properties: None,
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_properties(mut self, properties: Option<VideoProperties>) -> Self {
        self.properties = properties;
        self
    }
}

/// Public short link for a platform video id.
pub fn short_url(video_id: &str) -> String {
    format!("https://youtu.be/{}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PublishMetadata {
        PublishMetadata {
            title: "title".to_string(),
            description: "description".to_string(),
            hashtags: vec!["#Shorts".to_string(), "#success".to_string()],
        }
    }

    #[test]
    fn test_tags_strip_hash() {
        assert_eq!(metadata().tags(), vec!["Shorts", "success"]);
        assert_eq!(metadata().hashtag_line(), "#Shorts #success");
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("Public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!(" unlisted ".parse::<Visibility>().unwrap(), Visibility::Unlisted);
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_record_url_and_serialization() {
        let record = PublishRecord::new("clip.mp4", "abc123", &metadata())
            .with_notes(vec!["no-ffprobe".to_string()]);
        assert_eq!(record.platform_url, "https://youtu.be/abc123");

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("properties"));
        let back: PublishRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
