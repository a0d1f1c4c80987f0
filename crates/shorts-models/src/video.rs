//! Probed video properties and validation verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry and duration of a local video file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl VideoProperties {
    pub fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            width,
            height,
            duration,
        }
    }

    /// Aspect ratio as width / height; 0.0 when height is zero.
    ///
    /// A vertical 9:16 frame gives 0.5625.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// A single reason a video fails admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    LowResolution { height: u32, min_height: u32 },
    NotVertical { aspect: f64, min: f64, max: f64 },
    TooLong { duration: f64, max_duration: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowResolution { height, min_height } => {
                write!(f, "low resolution: {}px < {}px", height, min_height)
            }
            Self::NotVertical { aspect, min, max } => write!(
                f,
                "not vertical 9:16: aspect {:.3} outside [{:.2}, {:.2}]",
                aspect, min, max
            ),
            Self::TooLong {
                duration,
                max_duration,
            } => write!(f, "too long: {:.1}s > {:.0}s", duration, max_duration),
        }
    }
}

/// Outcome of validating a video against the platform constraints.
///
/// Built once and never mutated; `admitted` holds exactly when no issue
/// was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    admitted: bool,
    issues: Vec<ValidationIssue>,
}

impl ValidationVerdict {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            admitted: issues.is_empty(),
            issues,
        }
    }

    pub fn admitted(&self) -> bool {
        self.admitted
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues rendered as human-readable strings, in evaluation order.
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let props = VideoProperties::new(1080, 1920, 30.0);
        assert!((props.aspect_ratio() - 0.5625).abs() < 1e-9);
    }

    #[test]
    fn test_aspect_ratio_zero_height() {
        let props = VideoProperties::new(1080, 0, 30.0);
        assert_eq!(props.aspect_ratio(), 0.0);
    }

    #[test]
    fn test_verdict_admitted_iff_no_issues() {
        assert!(ValidationVerdict::from_issues(vec![]).admitted());

        let verdict = ValidationVerdict::from_issues(vec![ValidationIssue::LowResolution {
            height: 480,
            min_height: 720,
        }]);
        assert!(!verdict.admitted());
        assert_eq!(verdict.issue_messages(), vec!["low resolution: 480px < 720px"]);
    }
}
