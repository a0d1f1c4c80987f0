//! Google Drive and YouTube Data API clients.
//!
//! This crate provides:
//! - The [`AssetSource`] and [`Publisher`] contracts the pipeline consumes
//! - A Drive v3 client (paged listing, streamed download)
//! - A YouTube v3 client (resumable upload, comments, thumbnails)
//! - Service-account and authorized-user authentication with token caching

pub mod auth;
pub mod drive;
pub mod error;
mod http;
pub mod publisher;
pub mod source;
pub mod token_cache;
pub mod youtube;

/// Root of the Google REST APIs.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

pub use auth::{BearerSource, StaticBearer};
pub use drive::{DriveClient, DriveConfig};
pub use error::{GoogleError, GoogleResult};
pub use publisher::{Publisher, UploadRequest};
pub use source::AssetSource;
pub use token_cache::TokenCache;
pub use youtube::{YouTubeClient, YouTubeConfig};
