#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the publish pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - Best-effort probing of width, height and duration via FFprobe
//! - Validation of probed properties against platform constraints
//! - Lossless trimming of over-length videos
//! - Thumbnail frame extraction

pub mod command;
pub mod error;
pub mod inspector;
pub mod probe;
pub mod repair;
pub mod thumbnail;
pub mod validation;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use inspector::{FfmpegInspector, MediaInspector};
pub use probe::{probe_properties, ProbeOutcome};
pub use repair::{trim_to_cap, RepairOutcome};
pub use thumbnail::generate_thumbnail;
pub use validation::{Assessment, ValidationRules};
