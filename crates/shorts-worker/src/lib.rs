//! Scheduled shorts publisher.
//!
//! This crate provides:
//! - Environment configuration and the error taxonomy
//! - The durable publication ledger and the JSONL audit log
//! - Metadata synthesis (titles, descriptions, hashtags)
//! - The publish pipeline with scratch cleanup on every exit path
//! - The jittered daily scheduler and graceful shutdown

pub mod audit;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod retry;
pub mod scheduler;

pub use audit::AuditLog;
pub use config::PublisherConfig;
pub use error::{PublisherError, PublisherResult};
pub use ledger::PublicationLedger;
pub use logging::{init_tracing, RunLogger};
pub use metadata::{MetadataPools, MetadataSynthesizer};
pub use pipeline::{PipelineSettings, PipelineStage, PublishPipeline, RunOutcome};
pub use retry::RetryConfig;
pub use scheduler::{JitteredScheduler, ScheduledTask};
