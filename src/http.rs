//! Shared JSON-over-HTTP call with optional retry, used by the embedding and
//! chat backends.
//!
//! # Retry Strategy
//!
//! With `max_retries > 0`, transient failures are retried with exponential
//! backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! The default is `max_retries = 0`: one attempt, failures surface at once.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Why a backend call failed.
#[derive(Debug)]
pub enum HttpFailure {
    /// Connection, timeout, or client construction failure.
    Request(String),
    /// Non-success HTTP status.
    Status { status: u16, body: String },
    /// Success status with a body that did not match the expected shape.
    Malformed(String),
}

/// Build a client with a per-call timeout.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client, HttpFailure> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| HttpFailure::Request(e.to_string()))
}

/// POST `body` as JSON to `url` and decode the JSON response.
pub async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &B,
    max_retries: u32,
) -> Result<R, HttpFailure>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).json(body);
        if let Some(key) = bearer {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let text = response
                        .text()
                        .await
                        .map_err(|e| HttpFailure::Request(e.to_string()))?;
                    return serde_json::from_str(&text)
                        .map_err(|e| HttpFailure::Malformed(e.to_string()));
                }

                let body_text = response.text().await.unwrap_or_default();
                let failure = HttpFailure::Status {
                    status: status.as_u16(),
                    body: body_text,
                };

                // Rate limited or server error: retryable
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(failure);
                    continue;
                }

                return Err(failure);
            }
            Err(e) => {
                last_err = Some(HttpFailure::Request(format!("{} ({})", e, url)));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| HttpFailure::Request("request failed after retries".to_string())))
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
