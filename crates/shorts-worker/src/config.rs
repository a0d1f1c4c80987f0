//! Publisher configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use shorts_media::ValidationRules;
use shorts_models::{TimeOfDay, Visibility};
use tracing::warn;

use crate::error::{PublisherError, PublisherResult};

pub const DEFAULT_PUBLISH_TIMES: &str = "8:00,15:00";
pub const DEFAULT_FIRST_COMMENT: &str = "Which tip are you trying first? Tell me below 👇";

/// Credential material that must never end up in logs.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Drive service-account key JSON
    pub service_account_json: Secret,
    /// YouTube authorized-user token JSON
    pub token_json: Secret,
    /// Restrict listing to one Drive folder
    pub drive_folder_id: Option<String>,
    /// Nominal daily publish times
    pub publish_times: Vec<TimeOfDay>,
    /// Jitter window in minutes, applied on both sides
    pub jitter_minutes: u32,
    /// Admission thresholds
    pub validation: ValidationRules,
    /// Duration over which a video is trimmed
    pub hard_cap_secs: f64,
    /// Hashtag pool; `None` uses the built-in pool
    pub hashtags: Option<Vec<String>>,
    /// Keyword pool; `None` uses the built-in pool
    pub keywords: Option<Vec<String>>,
    pub visibility: Visibility,
    pub category_id: String,
    /// First comment text; `None` disables the comment
    pub first_comment: Option<String>,
    pub set_thumbnail: bool,
    pub ledger_path: PathBuf,
    pub audit_log_path: PathBuf,
    /// Parent directory for per-run scratch directories
    pub work_dir: PathBuf,
    /// Run the pipeline once immediately at startup
    pub run_on_start: bool,
    /// Kill FFmpeg invocations after this many seconds
    pub ffmpeg_timeout_secs: u64,
}

impl PublisherConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PublisherResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PublisherResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_account_json = required(&lookup, "SERVICE_ACCOUNT_JSON")?;
        let token_json = required(&lookup, "TOKEN_JSON")?;

        let defaults = ValidationRules::default();
        let validation = ValidationRules {
            min_height: parsed_or(&lookup, "SHORTS_MIN_HEIGHT", defaults.min_height),
            aspect_min: parsed_or(&lookup, "SHORTS_ASPECT_MIN", defaults.aspect_min),
            aspect_max: parsed_or(&lookup, "SHORTS_ASPECT_MAX", defaults.aspect_max),
            max_duration_secs: parsed_or(
                &lookup,
                "SHORTS_MAX_DURATION_SECS",
                defaults.max_duration_secs,
            ),
            target_min_secs: parsed_or(&lookup, "SHORTS_TARGET_MIN_SECS", defaults.target_min_secs),
            target_max_secs: parsed_or(&lookup, "SHORTS_TARGET_MAX_SECS", defaults.target_max_secs),
        };
        if validation.aspect_min > validation.aspect_max {
            return Err(PublisherError::config(format!(
                "SHORTS_ASPECT_MIN ({}) is greater than SHORTS_ASPECT_MAX ({})",
                validation.aspect_min, validation.aspect_max
            )));
        }

        let publish_times = parse_publish_times(
            &non_empty(&lookup, "SHORTS_PUBLISH_TIMES")
                .unwrap_or_else(|| DEFAULT_PUBLISH_TIMES.to_string()),
        )?;

        let visibility = match non_empty(&lookup, "SHORTS_VISIBILITY") {
            Some(raw) => raw
                .parse::<Visibility>()
                .map_err(|e| PublisherError::config(e.to_string()))?,
            None => Visibility::default(),
        };

        let hashtags = non_empty(&lookup, "SHORTS_HASHTAGS")
            .map(|raw| parse_hashtags(&raw))
            .transpose()?;

        let keywords = non_empty(&lookup, "SHORTS_KEYWORDS").map(|raw| split_list(&raw));
        if matches!(&keywords, Some(k) if k.is_empty()) {
            return Err(PublisherError::config("SHORTS_KEYWORDS has no entries"));
        }

        // Unset means the default comment, set-but-empty disables it.
        let first_comment = match lookup("SHORTS_FIRST_COMMENT") {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => Some(text.trim().to_string()),
            None => Some(DEFAULT_FIRST_COMMENT.to_string()),
        };

        Ok(Self {
            service_account_json: Secret::new(service_account_json),
            token_json: Secret::new(token_json),
            drive_folder_id: non_empty(&lookup, "DRIVE_FOLDER_ID"),
            publish_times,
            jitter_minutes: parsed_or(&lookup, "SHORTS_JITTER_MINUTES", 15),
            hard_cap_secs: parsed_or(&lookup, "SHORTS_HARD_CAP_SECS", 60.0),
            validation,
            hashtags,
            keywords,
            visibility,
            category_id: non_empty(&lookup, "SHORTS_CATEGORY_ID").unwrap_or_else(|| "22".to_string()),
            first_comment,
            set_thumbnail: flag_or(&lookup, "SHORTS_SET_THUMBNAIL", false),
            ledger_path: non_empty(&lookup, "SHORTS_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("posted_from_drive.txt")),
            audit_log_path: non_empty(&lookup, "SHORTS_AUDIT_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads_log.jsonl")),
            work_dir: non_empty(&lookup, "SHORTS_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            run_on_start: flag_or(&lookup, "SHORTS_RUN_ON_START", false),
            ffmpeg_timeout_secs: parsed_or(&lookup, "SHORTS_FFMPEG_TIMEOUT_SECS", 300),
        })
    }
}

/// Parse a comma separated list of `H:MM` times.
pub fn parse_publish_times(raw: &str) -> PublisherResult<Vec<TimeOfDay>> {
    let times = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            TimeOfDay::from_str(s).map_err(|e| {
                PublisherError::config(format!("Invalid publish time '{}': {}", s, e))
            })
        })
        .collect::<PublisherResult<Vec<_>>>()?;

    if times.is_empty() {
        return Err(PublisherError::config("No publish times configured"));
    }
    Ok(times)
}

/// Normalize a hashtag list: leading `#`, no duplicates, at least three entries.
pub fn parse_hashtags(raw: &str) -> PublisherResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for entry in split_list(raw) {
        let body = entry.trim_start_matches('#');
        if body.is_empty() || body.contains(char::is_whitespace) {
            return Err(PublisherError::config(format!("Invalid hashtag '{}'", entry)));
        }
        let tag = format!("#{}", body);
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }

    if tags.len() < 3 {
        return Err(PublisherError::config(format!(
            "SHORTS_HASHTAGS needs at least 3 unique entries, got {}",
            tags.len()
        )));
    }
    Ok(tags)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn required<F>(lookup: &F, key: &str) -> PublisherResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or_else(|| PublisherError::credential_missing(key))
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default {}", raw, key, default);
            default
        }),
        None => default,
    }
}

fn flag_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key).map(|v| v.to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            warn!("Invalid value '{}' for {}, using default {}", v, key, default);
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDS: [(&str, &str); 2] = [("SERVICE_ACCOUNT_JSON", "{}"), ("TOKEN_JSON", "{}")];

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::from_lookup(lookup(&CREDS)).unwrap();

        assert_eq!(
            config.publish_times,
            vec![TimeOfDay::new(8, 0).unwrap(), TimeOfDay::new(15, 0).unwrap()]
        );
        assert_eq!(config.jitter_minutes, 15);
        assert_eq!(config.validation, ValidationRules::default());
        assert_eq!(config.hard_cap_secs, 60.0);
        assert_eq!(config.visibility, Visibility::Public);
        assert_eq!(config.category_id, "22");
        assert_eq!(config.first_comment.as_deref(), Some(DEFAULT_FIRST_COMMENT));
        assert!(!config.set_thumbnail);
        assert!(!config.run_on_start);
        assert_eq!(config.ledger_path, PathBuf::from("posted_from_drive.txt"));
        assert!(config.hashtags.is_none());
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let err = PublisherConfig::from_lookup(lookup(&[("SERVICE_ACCOUNT_JSON", "{}")]))
            .unwrap_err();
        assert!(matches!(err, PublisherError::CredentialMissing(ref k) if k == "TOKEN_JSON"));
        assert!(err.is_fatal());

        let err = PublisherConfig::from_lookup(lookup(&[
            ("SERVICE_ACCOUNT_JSON", "  "),
            ("TOKEN_JSON", "{}"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PublisherError::CredentialMissing(ref k) if k == "SERVICE_ACCOUNT_JSON"));
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let mut vars = CREDS.to_vec();
        vars.push(("SHORTS_JITTER_MINUTES", "lots"));
        vars.push(("SHORTS_MIN_HEIGHT", "1080"));
        let config = PublisherConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.jitter_minutes, 15);
        assert_eq!(config.validation.min_height, 1080);
    }

    #[test]
    fn test_invalid_publish_time_is_config_error() {
        let mut vars = CREDS.to_vec();
        vars.push(("SHORTS_PUBLISH_TIMES", "8:00,25:00"));
        let err = PublisherConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, PublisherError::Config(_)));
    }

    #[test]
    fn test_empty_first_comment_disables_it() {
        let mut vars = CREDS.to_vec();
        vars.push(("SHORTS_FIRST_COMMENT", ""));
        let config = PublisherConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.first_comment.is_none());
    }

    #[test]
    fn test_parse_hashtags_normalizes_and_dedups() {
        let tags = parse_hashtags("Shorts, #money ,#Money, habits").unwrap();
        assert_eq!(tags, vec!["#Shorts", "#money", "#habits"]);

        assert!(parse_hashtags("#a,#b").is_err());
        assert!(parse_hashtags("#a,#b c,#d").is_err());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let config = PublisherConfig::from_lookup(lookup(&[
            ("SERVICE_ACCOUNT_JSON", "private-key-material"),
            ("TOKEN_JSON", "refresh-token-material"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("private-key-material"));
        assert!(!debug.contains("refresh-token-material"));
    }
}
