//! Thumbnail generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Offset into the video at which the thumbnail frame is taken.
pub const THUMBNAIL_TIMESTAMP_SECS: f64 = 1.0;

/// Thumbnail width in pixels; height keeps the aspect ratio.
pub const THUMBNAIL_SCALE_WIDTH: u32 = 720;

fn thumbnail_filter() -> String {
    format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH)
}

/// Extract a single JPEG frame from a video file.
pub async fn generate_thumbnail(
    runner: &FfmpegRunner,
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video_path.as_ref(), output_path.as_ref())
        .seek(THUMBNAIL_TIMESTAMP_SECS)
        .single_frame()
        .video_filter(thumbnail_filter())
        .output_args(["-q:v", "2"])
        .log_level("error");

    runner.run(&cmd).await
}
