//! Admission rules for short-form vertical video.

use serde::{Deserialize, Serialize};

use shorts_models::{ValidationIssue, ValidationVerdict, VideoProperties};

use crate::probe::ProbeOutcome;

/// Thresholds a video must meet to be published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Minimum frame height in pixels
    pub min_height: u32,
    /// Inclusive lower bound of width / height
    pub aspect_min: f64,
    /// Inclusive upper bound of width / height
    pub aspect_max: f64,
    /// Longest admitted duration in seconds
    pub max_duration_secs: f64,
    /// Advisory band start; never causes rejection
    pub target_min_secs: f64,
    /// Advisory band end; never causes rejection
    pub target_max_secs: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_height: 720,
            aspect_min: 0.55,
            aspect_max: 0.60,
            max_duration_secs: 60.0,
            target_min_secs: 20.0,
            target_max_secs: 45.0,
        }
    }
}

impl ValidationRules {
    /// Evaluate every rule and collect all issues.
    pub fn validate(&self, props: &VideoProperties) -> ValidationVerdict {
        let mut issues = Vec::new();

        if props.height < self.min_height {
            issues.push(ValidationIssue::LowResolution {
                height: props.height,
                min_height: self.min_height,
            });
        }

        let aspect = props.aspect_ratio();
        if !(self.aspect_min..=self.aspect_max).contains(&aspect) {
            issues.push(ValidationIssue::NotVertical {
                aspect,
                min: self.aspect_min,
                max: self.aspect_max,
            });
        }

        if props.duration > self.max_duration_secs {
            issues.push(ValidationIssue::TooLong {
                duration: props.duration,
                max_duration: self.max_duration_secs,
            });
        }

        ValidationVerdict::from_issues(issues)
    }

    /// Note for durations outside the advisory band.
    pub fn advisory_note(&self, props: &VideoProperties) -> Option<String> {
        if props.duration < self.target_min_secs || props.duration > self.target_max_secs {
            Some(format!(
                "duration {:.1}s outside target {:.0}-{:.0}s",
                props.duration, self.target_min_secs, self.target_max_secs
            ))
        } else {
            None
        }
    }

    /// Turn a probe outcome into an admission decision.
    ///
    /// Only measured properties can reject a video. When probing did not
    /// produce properties the video is admitted and the reason is kept as a
    /// note.
    pub fn assess(&self, outcome: &ProbeOutcome) -> Assessment {
        match outcome {
            ProbeOutcome::Available(props) => {
                let verdict = self.validate(props);
                let notes = self.advisory_note(props).into_iter().collect();
                Assessment {
                    verdict,
                    properties: Some(*props),
                    notes,
                }
            }
            ProbeOutcome::Unavailable { reason } => Assessment {
                verdict: ValidationVerdict::from_issues(Vec::new()),
                properties: None,
                notes: vec![format!("no-ffprobe: {}", reason)],
            },
            ProbeOutcome::ParseError { reason } => Assessment {
                verdict: ValidationVerdict::from_issues(Vec::new()),
                properties: None,
                notes: vec![format!("probe-unparsable: {}", reason)],
            },
        }
    }
}

/// Admission decision plus whatever the probe learned.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: ValidationVerdict,
    pub properties: Option<VideoProperties>,
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_issues_reported_together() {
        let rules = ValidationRules::default();
        // 192x480 is aspect 0.4
        let verdict = rules.validate(&VideoProperties::new(192, 480, 70.0));

        assert!(!verdict.admitted());
        assert_eq!(verdict.issues().len(), 3);
        assert!(matches!(verdict.issues()[0], ValidationIssue::LowResolution { .. }));
        assert!(matches!(verdict.issues()[1], ValidationIssue::NotVertical { .. }));
        assert!(matches!(verdict.issues()[2], ValidationIssue::TooLong { .. }));
    }

    #[test]
    fn test_standard_vertical_admitted() {
        let rules = ValidationRules::default();
        let verdict = rules.validate(&VideoProperties::new(1080, 1920, 30.0));
        assert!(verdict.admitted());
        assert!(verdict.issues().is_empty());
    }

    #[test]
    fn test_aspect_band_is_inclusive() {
        let rules = ValidationRules::default();
        assert!(rules.validate(&VideoProperties::new(1100, 2000, 30.0)).admitted()); // 0.55
        assert!(rules.validate(&VideoProperties::new(1200, 2000, 30.0)).admitted()); // 0.60
        assert!(!rules.validate(&VideoProperties::new(1220, 2000, 30.0)).admitted()); // 0.61
    }

    #[test]
    fn test_landscape_rejected() {
        let rules = ValidationRules::default();
        let verdict = rules.validate(&VideoProperties::new(1920, 1080, 30.0));
        assert_eq!(verdict.issues().len(), 1);
        assert!(matches!(verdict.issues()[0], ValidationIssue::NotVertical { .. }));
    }

    #[test]
    fn test_exact_cap_is_not_too_long() {
        let rules = ValidationRules::default();
        assert!(rules.validate(&VideoProperties::new(1080, 1920, 60.0)).admitted());
        assert!(!rules.validate(&VideoProperties::new(1080, 1920, 60.5)).admitted());
    }

    #[test]
    fn test_advisory_band_never_rejects() {
        let rules = ValidationRules::default();
        let short = VideoProperties::new(1080, 1920, 8.0);
        assert!(rules.validate(&short).admitted());
        assert!(rules.advisory_note(&short).is_some());
        assert!(rules.advisory_note(&VideoProperties::new(1080, 1920, 30.0)).is_none());
    }

    #[test]
    fn test_unavailable_probe_admits_with_note() {
        let rules = ValidationRules::default();
        let assessment = rules.assess(&ProbeOutcome::Unavailable {
            reason: "FFprobe not found in PATH".to_string(),
        });
        assert!(assessment.verdict.admitted());
        assert!(assessment.properties.is_none());
        assert!(assessment.notes[0].starts_with("no-ffprobe"));
    }

    #[test]
    fn test_parse_error_admits_with_distinct_note() {
        let rules = ValidationRules::default();
        let assessment = rules.assess(&ProbeOutcome::ParseError {
            reason: "invalid JSON".to_string(),
        });
        assert!(assessment.verdict.admitted());
        assert!(assessment.notes[0].starts_with("probe-unparsable"));
    }

    #[test]
    fn test_available_probe_rejects_on_measured_values() {
        let rules = ValidationRules::default();
        let assessment = rules.assess(&ProbeOutcome::Available(VideoProperties::new(
            720, 1280, 90.0,
        )));
        assert!(!assessment.verdict.admitted());
        assert_eq!(assessment.properties.unwrap().duration, 90.0);
    }
}
