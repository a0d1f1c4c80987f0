//! Shared data models for the shorts publisher.
//!
//! This crate provides Serde-serializable types for:
//! - Source assets listed in cloud storage
//! - Probed video properties and validation verdicts
//! - Publish metadata and audit records
//! - Daily schedule slots

pub mod asset;
pub mod publish;
pub mod schedule;
pub mod video;

// Re-export common types
pub use asset::{AssetId, RemoteAsset, SUPPORTED_VIDEO_EXTENSIONS};
pub use publish::{PublishMetadata, PublishRecord, Visibility, VisibilityParseError};
pub use schedule::{ScheduleSlot, TimeOfDay, TimeOfDayError, MINUTES_PER_DAY};
pub use video::{ValidationIssue, ValidationVerdict, VideoProperties};
