//! Shared HTTP plumbing for the Google clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::auth::BearerSource;
use crate::error::{GoogleError, GoogleResult};

/// Build a tuned HTTP client.
pub(crate) fn build_client(timeout: Duration, connect_timeout: Duration) -> GoogleResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("shorts-google/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send a request with a bearer token, refreshing the token once on 401.
pub(crate) async fn send_authorized<F>(auth: &dyn BearerSource, build: F) -> GoogleResult<Response>
where
    F: Fn(&str) -> RequestBuilder,
{
    let token = auth.bearer().await?;
    let response = build(&token).send().await?;

    if response.status() == StatusCode::UNAUTHORIZED {
        debug!("Access token rejected, refreshing and retrying once");
        auth.invalidate().await;
        let token = auth.bearer().await?;
        return Ok(build(&token).send().await?);
    }

    Ok(response)
}

/// Turn a non-success response into an error carrying its body.
pub(crate) async fn error_for_response(context: &str, response: Response) -> GoogleError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GoogleError::from_http_status(status.as_u16(), format!("{} failed: {}", context, body))
}
