//! Lossless trimming of over-length videos.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};

/// Result of attempting to bring a video under the duration cap.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// Already within the cap; the original file is used.
    Unchanged(PathBuf),
    /// A trimmed copy was written next to the original.
    Trimmed { path: PathBuf, original_duration: f64, cap_secs: f64 },
    /// Trimming failed; the original file is used.
    Failed { path: PathBuf, reason: String },
}

impl RepairOutcome {
    /// Path of the file to publish.
    pub fn path(&self) -> &Path {
        match self {
            RepairOutcome::Unchanged(path) => path,
            RepairOutcome::Trimmed { path, .. } => path,
            RepairOutcome::Failed { path, .. } => path,
        }
    }

    /// Audit note describing what happened, if anything did.
    pub fn note(&self) -> Option<String> {
        match self {
            RepairOutcome::Unchanged(_) => None,
            RepairOutcome::Trimmed {
                original_duration,
                cap_secs,
                ..
            } => Some(format!(
                "trimmed from {:.1}s to {:.0}s",
                original_duration, cap_secs
            )),
            RepairOutcome::Failed { reason, .. } => Some(format!("trim failed: {}", reason)),
        }
    }
}

/// Path for the trimmed copy: `name.mp4` becomes `name_trim.mp4`.
pub fn trimmed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}_trim.{}", stem, ext.to_string_lossy()),
        None => format!("{}_trim", stem),
    };
    input.with_file_name(file_name)
}

/// Trim `input` to `cap_secs` with a stream copy when `duration` exceeds it.
///
/// Never fails: on FFmpeg errors the original path is returned inside
/// [`RepairOutcome::Failed`] and any partial output is removed.
pub async fn trim_to_cap(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    duration: f64,
    cap_secs: f64,
) -> RepairOutcome {
    let input = input.as_ref();

    if duration <= cap_secs {
        return RepairOutcome::Unchanged(input.to_path_buf());
    }

    let output = trimmed_path(input);
    info!(
        "Trimming {} from {:.1}s to {:.0}s -> {}",
        input.display(),
        duration,
        cap_secs,
        output.display()
    );

    let cmd = FfmpegCommand::new(input, &output)
        .max_duration(cap_secs)
        .codec_copy();

    match runner.run(&cmd).await {
        Ok(()) => RepairOutcome::Trimmed {
            path: output,
            original_duration: duration,
            cap_secs,
        },
        Err(e) => {
            warn!("Trim failed, publishing original {}: {}", input.display(), e);
            if let Err(rm) = tokio::fs::remove_file(&output).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial trim {}: {}", output.display(), rm);
                }
            }
            RepairOutcome::Failed {
                path: input.to_path_buf(),
                reason: e.to_string(),
            }
        }
    }
}
