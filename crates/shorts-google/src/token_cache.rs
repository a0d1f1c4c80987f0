//! Token caching for Google API authentication.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests (uploads can be slow)
//! - Single-flight refresh under a write lock
//! - Graceful fallback to existing valid token on refresh failure

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{BearerSource, TokenFetcher};
use crate::error::{GoogleError, GoogleResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Check if token is still valid with refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Check if token is technically still usable (even if refresh is needed).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Caches access tokens produced by a [`TokenFetcher`].
pub struct TokenCache<F> {
    fetcher: F,
    cache: RwLock<Option<CachedToken>>,
}

impl<F: TokenFetcher> TokenCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(None),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> GoogleResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> GoogleResult<String> {
        match self.fetcher.fetch().await {
            Ok(token) => {
                let expires_at = match token.expires_at {
                    Some(exp) => {
                        let now = Utc::now();
                        if exp > now {
                            (exp - now)
                                .to_std()
                                .map(|ttl| Instant::now() + ttl)
                                .unwrap_or_else(|_| Instant::now() + TOKEN_DEFAULT_TTL)
                        } else {
                            // Force refresh on the next request
                            Instant::now()
                        }
                    }
                    None => Instant::now() + TOKEN_DEFAULT_TTL,
                };

                let access_token = token.access_token;
                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Google access token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(GoogleError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl<F: TokenFetcher> BearerSource for TokenCache<F> {
    async fn bearer(&self) -> GoogleResult<String> {
        self.get_token().await
    }

    async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FetchedToken;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingFetcher {
        calls: AtomicU32,
        ttl_secs: i64,
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch(&self) -> GoogleResult<FetchedToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedToken {
                access_token: format!("token-{}", n),
                expires_at: Some(Utc::now() + chrono::Duration::seconds(self.ttl_secs)),
            })
        }
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let cache = TokenCache::new(CountingFetcher {
            calls: AtomicU32::new(0),
            ttl_secs: 3600,
        });

        assert_eq!(cache.bearer().await.unwrap(), "token-0");
        assert_eq!(cache.bearer().await.unwrap(), "token-0");
        assert_eq!(cache.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed() {
        let cache = TokenCache::new(CountingFetcher {
            calls: AtomicU32::new(0),
            ttl_secs: 30,
        });

        assert_eq!(cache.bearer().await.unwrap(), "token-0");
        assert_eq!(cache.bearer().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = TokenCache::new(CountingFetcher {
            calls: AtomicU32::new(0),
            ttl_secs: 3600,
        });

        tokio_test::assert_ok!(cache.bearer().await);
        cache.invalidate().await;
        assert_eq!(cache.bearer().await.unwrap(), "token-1");
    }
}
