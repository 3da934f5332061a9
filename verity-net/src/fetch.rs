//! Deadline-bounded fetches
//!
//! Every call runs under `tokio::time::timeout_at`, so the deadline is a hard
//! cutoff covering connect, headers and body. Dropping the future aborts the
//! in-flight request.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use verity_core::ErrorKind;

/// Errors from outbound HTTP calls
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Deadline exceeded")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// The serializable kind recorded in provider outcomes
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout => ErrorKind::ProviderTimeout,
            FetchError::Status(status) => ErrorKind::ProviderHttpError { status: *status },
            FetchError::Decode(_) => ErrorKind::ProviderParseError,
            FetchError::ClientBuild(_) | FetchError::Transport(_) => ErrorKind::ProviderTransport,
        }
    }

    /// Worth another attempt if time remains
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status(status) => *status == 429 || *status >= 500,
            FetchError::Transport(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Send a request and return the body of a 2xx response
pub async fn send_text(request: RequestBuilder, deadline: Instant) -> Result<String, FetchError> {
    let exchange = async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    };

    timeout_at(deadline, exchange)
        .await
        .map_err(|_| FetchError::Timeout)?
}

/// Send a request and decode a 2xx JSON body
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    deadline: Instant,
) -> Result<T, FetchError> {
    let body = send_text(request, deadline).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Retry policy internal to one adapter call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(300),
        }
    }
}

/// [`send_text`] with retries on transient failures.
///
/// A retry is attempted only when the backoff still fits before the deadline,
/// so the whole call never outlives it.
pub async fn send_text_retrying<F>(
    make_request: F,
    deadline: Instant,
    policy: RetryPolicy,
) -> Result<String, FetchError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        match send_text(make_request(), deadline).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let wake = Instant::now() + policy.backoff;
                if wake >= deadline {
                    return Err(e);
                }
                attempt += 1;
                debug!("Retrying after {} (attempt {})", e, attempt);
                tokio::time::sleep_until(wake).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(FetchError::Timeout.kind(), ErrorKind::ProviderTimeout);
        assert_eq!(
            FetchError::Status(503).kind(),
            ErrorKind::ProviderHttpError { status: 503 }
        );
        assert_eq!(
            FetchError::Decode("eof".to_string()).kind(),
            ErrorKind::ProviderParseError
        );
        assert_eq!(
            FetchError::Transport("refused".to_string()).kind(),
            ErrorKind::ProviderTransport
        );
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::Status(429).is_retryable());
        assert!(FetchError::Status(502).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Timeout.is_retryable());
        assert!(!FetchError::Decode(String::new()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP status 404");
        assert_eq!(FetchError::Timeout.to_string(), "Deadline exceeded");
    }
}
