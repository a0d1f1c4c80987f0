//! FFprobe video inspection.
//!
//! Probing is best-effort: callers get a [`ProbeOutcome`] rather than an
//! error, so that a missing or broken FFprobe never blocks publishing.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use shorts_models::VideoProperties;

use crate::command::{check_ffprobe, stderr_tail};

/// Result of inspecting a local video file.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// FFprobe ran and reported usable properties.
    Available(VideoProperties),
    /// FFprobe could not be run at all.
    Unavailable { reason: String },
    /// FFprobe ran but its output could not be interpreted.
    ParseError { reason: String },
}

impl ProbeOutcome {
    pub fn properties(&self) -> Option<&VideoProperties> {
        match self {
            ProbeOutcome::Available(props) => Some(props),
            _ => None,
        }
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe width, height and duration of the first video stream.
pub async fn probe_properties(path: impl AsRef<Path>) -> ProbeOutcome {
    let path = path.as_ref();

    if let Err(e) = check_ffprobe() {
        warn!("Skipping probe of {}: {}", path.display(), e);
        return ProbeOutcome::Unavailable {
            reason: e.to_string(),
        };
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to spawn ffprobe: {}", e);
            return ProbeOutcome::Unavailable {
                reason: format!("failed to run ffprobe: {}", e),
            };
        }
    };

    if !output.status.success() {
        let stderr = stderr_tail(&output.stderr);
        warn!("FFprobe failed on {}: {}", path.display(), stderr);
        return ProbeOutcome::ParseError {
            reason: format!("ffprobe exited with {:?}: {}", output.status.code(), stderr),
        };
    }

    match parse_probe_output(&output.stdout) {
        Ok(props) => {
            debug!(
                width = props.width,
                height = props.height,
                duration = props.duration,
                "Probed {}",
                path.display()
            );
            ProbeOutcome::Available(props)
        }
        Err(reason) => {
            warn!("Unparsable ffprobe output for {}: {}", path.display(), reason);
            ProbeOutcome::ParseError { reason }
        }
    }
}

/// Interpret FFprobe JSON output.
///
/// Stream duration is preferred; containers that only report a format-level
/// duration (e.g. Matroska) fall back to it.
fn parse_probe_output(stdout: &[u8]) -> Result<VideoProperties, String> {
    let probe: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| format!("invalid JSON: {}", e))?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| "no video stream found".to_string())?;

    let width = stream.width.ok_or_else(|| "missing width".to_string())?;
    let height = stream.height.ok_or_else(|| "missing height".to_string())?;

    let duration = stream
        .duration
        .as_deref()
        .and_then(parse_duration)
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_duration)
        })
        .ok_or_else(|| "missing duration".to_string())?;

    Ok(VideoProperties::new(width, height, duration))
}

fn parse_duration(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_duration() {
        let json = br#"{"programs":[],"streams":[{"width":1080,"height":1920,"duration":"30.033"}],"format":{"duration":"30.100"}}"#;
        let props = parse_probe_output(json).unwrap();
        assert_eq!(props.width, 1080);
        assert_eq!(props.height, 1920);
        assert!((props.duration - 30.033).abs() < 1e-9);
    }

    #[test]
    fn test_parse_falls_back_to_format_duration() {
        let json = br#"{"streams":[{"width":720,"height":1280}],"format":{"duration":"42.5"}}"#;
        let props = parse_probe_output(json).unwrap();
        assert!((props.duration - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_probe_output(b"not json").is_err());
        assert_eq!(
            parse_probe_output(br#"{"streams":[]}"#).unwrap_err(),
            "no video stream found"
        );
        assert_eq!(
            parse_probe_output(br#"{"streams":[{"width":720,"height":1280,"duration":"N/A"}]}"#)
                .unwrap_err(),
            "missing duration"
        );
    }

    #[tokio::test]
    async fn test_probe_garbage_file_is_not_available() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.mp4");
        tokio::fs::write(&path, b"definitely not a video").await.unwrap();

        // Either ffprobe is missing or it fails to read the file; never Available.
        let outcome = probe_properties(&path).await;
        assert!(outcome.properties().is_none());
    }
}
