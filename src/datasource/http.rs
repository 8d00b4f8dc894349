//! JSON-over-HTTP POST with retry, shared by both network clients.

use super::FetchError;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;

/// Build a client whose requests time out after `timeout`.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            Client::new()
        })
}

/// POST `payload` to `url` and decode the JSON response.
///
/// Connect failures, 429 and 5xx are retried with exponential backoff until
/// `max_elapsed` has passed; other failures are returned immediately.
pub async fn post_json(
    client: &Client,
    url: &str,
    payload: &serde_json::Value,
    max_elapsed: Duration,
) -> Result<serde_json::Value, FetchError> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    retry(backoff, || async {
        let response = client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(FetchError::NetworkError(e.to_string())))?;

        let status = response.status();
        if status == 429 {
            return Err(backoff::Error::transient(FetchError::RateLimited));
        }
        if status.is_server_error() {
            return Err(backoff::Error::transient(FetchError::HttpError {
                status: status.as_u16(),
                message: "Server error".to_string(),
            }));
        }
        if !status.is_success() {
            return Err(backoff::Error::permanent(FetchError::HttpError {
                status: status.as_u16(),
                message: "Client error".to_string(),
            }));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| backoff::Error::permanent(FetchError::ParseError(e.to_string())))
    })
    .await
}
