//! Structured run logging and subscriber setup.
//!
//! Every pipeline run gets a short run id so that the lines of one run can be
//! grouped, even in JSON output.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "shorts_worker=info,shorts_google=info,shorts_media=info";

/// Filter from a `RUST_LOG` value, falling back to [`DEFAULT_FILTER`].
pub fn build_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines; anything else gets ANSI output.
/// `RUST_LOG` replaces the default filter when set.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Logger for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    trigger: String,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    ///
    /// `trigger` names what started the run (`schedule`, `startup`).
    pub fn new(trigger: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            run_id: id[..8].to_string(),
            trigger: trigger.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, trigger = %self.trigger, "Run started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, trigger = %self.trigger, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, trigger = %self.trigger, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, trigger = %self.trigger, "Run error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, trigger = %self.trigger, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "publish_run",
            run_id = %self.run_id,
            trigger = %self.trigger
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_short_and_distinct() {
        let a = RunLogger::new("schedule");
        let b = RunLogger::new("schedule");

        assert_eq!(a.run_id().len(), 8);
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.trigger(), "schedule");
    }

    #[test]
    fn test_rust_log_is_not_overridden_by_default() {
        let filter = build_filter(Some("shorts_worker=debug")).to_string();
        assert!(filter.contains("shorts_worker=debug"), "{}", filter);
        assert!(!filter.contains("shorts_worker=info"), "{}", filter);
    }

    #[test]
    fn test_default_filter_when_rust_log_unset() {
        for value in [None, Some(""), Some("  ")] {
            let filter = build_filter(value).to_string();
            assert!(filter.contains("shorts_worker=info"), "{}", filter);
            assert!(filter.contains("shorts_google=info"), "{}", filter);
            assert!(filter.contains("shorts_media=info"), "{}", filter);
        }
    }
}
