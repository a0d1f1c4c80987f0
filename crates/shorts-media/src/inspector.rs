//! Seam between the publish pipeline and the media tooling.

use async_trait::async_trait;
use std::path::Path;

use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::probe::{probe_properties, ProbeOutcome};
use crate::repair::{trim_to_cap, RepairOutcome};
use crate::thumbnail::generate_thumbnail;

/// Media operations the pipeline needs from its environment.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Inspect dimensions and duration.
    async fn probe(&self, path: &Path) -> ProbeOutcome;

    /// Trim to `cap_secs` when `duration` exceeds it.
    async fn trim(&self, path: &Path, duration: f64, cap_secs: f64) -> RepairOutcome;

    /// Write a thumbnail image for `video` to `output`.
    async fn thumbnail(&self, video: &Path, output: &Path) -> MediaResult<()>;
}

/// [`MediaInspector`] backed by the FFmpeg/FFprobe binaries on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegInspector {
    runner: FfmpegRunner,
}

impl FfmpegInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg invocations that run longer than `secs`.
    pub fn with_timeout(secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(secs),
        }
    }
}

#[async_trait]
impl MediaInspector for FfmpegInspector {
    async fn probe(&self, path: &Path) -> ProbeOutcome {
        probe_properties(path).await
    }

    async fn trim(&self, path: &Path, duration: f64, cap_secs: f64) -> RepairOutcome {
        trim_to_cap(&self.runner, path, duration, cap_secs).await
    }

    async fn thumbnail(&self, video: &Path, output: &Path) -> MediaResult<()> {
        generate_thumbnail(&self.runner, video, output).await
    }
}
