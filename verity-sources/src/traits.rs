//! Common traits for evidence providers and reasoning engines

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use verity_core::{EngineId, EngineVerdict, ErrorKind, EvidenceItem, ProviderId, Query};
use verity_net::FetchError;

use crate::LlmError;

/// Errors from provider and engine calls
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not configured (missing API key)")]
    NotConfigured(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Deadline exceeded")]
    Timeout,

    #[error("No verdict: {0}")]
    NoVerdict(String),
}

impl ProviderError {
    /// The serializable kind recorded in outcomes and error maps
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NotConfigured(_) => ErrorKind::ProviderNotConfigured,
            ProviderError::Fetch(e) => e.kind(),
            ProviderError::Parse(_) | ProviderError::NoVerdict(_) => ErrorKind::ProviderParseError,
            ProviderError::Llm(e) => e.kind(),
            ProviderError::Timeout => ErrorKind::ProviderTimeout,
        }
    }
}

/// Normalized evidence from one provider call
#[derive(Debug, Clone, Default)]
pub struct ProviderFetch {
    pub items: Vec<EvidenceItem>,
    /// Records that could not be normalized
    pub warnings: Vec<String>,
}

impl ProviderFetch {
    pub fn new(items: Vec<EvidenceItem>, warnings: Vec<String>) -> Self {
        Self { items, warnings }
    }
}

/// One external evidence source
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether the credentials this provider needs are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetch up to `max_results` items, finishing before `deadline`.
    ///
    /// Unparseable records are skipped and reported as warnings; only a
    /// response that is unusable as a whole is an error. Items come back
    /// unranked with a provisional credibility score.
    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError>;
}

/// An external service that produces a verdict on a claim
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    fn id(&self) -> EngineId;

    async fn assess(&self, query: &Query, deadline: Instant)
        -> Result<EngineVerdict, ProviderError>;
}

/// Thread-safe reference to an evidence provider
pub type SharedProvider = Arc<dyn EvidenceProvider>;

/// Thread-safe reference to a reasoning engine
pub type SharedEngine = Arc<dyn ReasoningEngine>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ProviderError::NotConfigured("brave".to_string()).kind(),
            ErrorKind::ProviderNotConfigured
        );
        assert_eq!(
            ProviderError::Fetch(FetchError::Status(404)).kind(),
            ErrorKind::ProviderHttpError { status: 404 }
        );
        assert_eq!(ProviderError::Timeout.kind(), ErrorKind::ProviderTimeout);
        assert_eq!(
            ProviderError::NoVerdict("empty".to_string()).kind(),
            ErrorKind::ProviderParseError
        );
        assert_eq!(
            ProviderError::Llm(LlmError::RateLimited).kind(),
            ErrorKind::ProviderHttpError { status: 429 }
        );
    }

    #[test]
    fn test_display_is_transparent_for_fetch() {
        let err = ProviderError::from(FetchError::Status(500));
        assert_eq!(err.to_string(), "HTTP status 500");
    }
}
