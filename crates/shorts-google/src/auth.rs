//! Credentials for the Drive and YouTube clients.
//!
//! Drive is accessed with a service account (`SERVICE_ACCOUNT_JSON`),
//! YouTube with an authorized-user OAuth token (`TOKEN_JSON`) whose refresh
//! token is exchanged for short-lived access tokens.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GoogleError, GoogleResult};

/// Read-only Drive access, enough to list and download.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Upload videos to YouTube.
pub const YOUTUBE_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Manage comments and thumbnails.
pub const YOUTUBE_FORCE_SSL_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Something that can put a bearer token on a request.
#[async_trait]
pub trait BearerSource: Send + Sync {
    async fn bearer(&self) -> GoogleResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// A fixed token, for tests and short-lived tooling.
#[derive(Debug, Clone)]
pub struct StaticBearer(pub String);

#[async_trait]
impl BearerSource for StaticBearer {
    async fn bearer(&self) -> GoogleResult<String> {
        Ok(self.0.clone())
    }
}

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct FetchedToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Mints access tokens; wrapped by [`crate::token_cache::TokenCache`].
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> GoogleResult<FetchedToken>;
}

/// Service-account tokens via `gcp_auth`.
pub struct ServiceAccountFetcher {
    account: CustomServiceAccount,
    scopes: Vec<&'static str>,
}

impl ServiceAccountFetcher {
    /// Build from the contents of a service-account key file.
    pub fn from_json(json: &str, scopes: &[&'static str]) -> GoogleResult<Self> {
        let account = CustomServiceAccount::from_json(json).map_err(|e| {
            GoogleError::auth_error(format!("Failed to load service account: {}", e))
        })?;
        Ok(Self {
            account,
            scopes: scopes.to_vec(),
        })
    }
}

#[async_trait]
impl TokenFetcher for ServiceAccountFetcher {
    async fn fetch(&self) -> GoogleResult<FetchedToken> {
        let token = self
            .account
            .token(&self.scopes)
            .await
            .map_err(|e| GoogleError::auth_error(e.to_string()))?;

        Ok(FetchedToken {
            access_token: token.as_str().to_string(),
            expires_at: Some(token.expires_at()),
        })
    }
}

/// Authorized-user credentials as written by Google's OAuth client libraries.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl AuthorizedUser {
    pub fn from_json(json: &str) -> GoogleResult<Self> {
        let user: AuthorizedUser = serde_json::from_str(json)
            .map_err(|e| GoogleError::auth_error(format!("Invalid authorized-user JSON: {}", e)))?;
        if user.refresh_token.trim().is_empty() {
            return Err(GoogleError::auth_error("Authorized-user JSON has an empty refresh_token"));
        }
        Ok(user)
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Exchanges a refresh token for access tokens.
pub struct AuthorizedUserFetcher {
    http: Client,
    user: AuthorizedUser,
}

impl AuthorizedUserFetcher {
    pub fn new(user: AuthorizedUser) -> GoogleResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("shorts-google/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, user })
    }
}

#[async_trait]
impl TokenFetcher for AuthorizedUserFetcher {
    async fn fetch(&self) -> GoogleResult<FetchedToken> {
        debug!("Refreshing OAuth access token at {}", self.user.token_uri);

        let response = self
            .http
            .post(&self.user.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.user.client_id.as_str()),
                ("client_secret", self.user.client_secret.as_str()),
                ("refresh_token", self.user.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::auth_error(format!(
                "Token refresh returned {}: {}",
                status, body
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;
        Ok(FetchedToken {
            access_token: refreshed.access_token,
            expires_at: refreshed
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }
}
