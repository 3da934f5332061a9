//! Independent second-opinion engine
//!
//! Runs beside the fallback chain rather than inside it, so most runs
//! consolidate two verdicts.

use async_trait::async_trait;
use tokio::time::Instant;

use verity_core::{EngineId, EngineVerdict, Query};

use super::{llm_verdict, DEFAULT_ENGINE_CONFIDENCE};
use crate::{Prompt, ProviderError, ReasoningEngine, SharedBackend};

/// Highest confidence the ungrounded second opinion may carry
pub const CROSS_CHECK_MAX_CONFIDENCE: f64 = 0.7;

pub struct CrossCheckEngine {
    backend: SharedBackend,
    prompt: Prompt,
}

impl CrossCheckEngine {
    pub fn new(backend: SharedBackend, prompt: Prompt) -> Self {
        Self { backend, prompt }
    }
}

#[async_trait]
impl ReasoningEngine for CrossCheckEngine {
    fn id(&self) -> EngineId {
        EngineId::CrossCheck
    }

    async fn assess(&self, query: &Query, deadline: Instant) -> Result<EngineVerdict, ProviderError> {
        let parsed = llm_verdict(&self.backend, &self.prompt, &query.text, deadline).await?;
        let confidence = parsed
            .confidence
            .unwrap_or(DEFAULT_ENGINE_CONFIDENCE)
            .min(CROSS_CHECK_MAX_CONFIDENCE);

        Ok(EngineVerdict::new(EngineId::CrossCheck, parsed.label, confidence, &parsed.summary)
            .with_raw_label(&parsed.raw_label)
            .ungrounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError, PromptRegistry};
    use std::sync::Arc;
    use std::time::Duration;
    use verity_core::VerdictLabel;

    struct SlowBackend;

    #[async_trait]
    impl LlmBackend for SlowBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("VERDICT: True".to_string())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    struct MisleadingBackend;

    #[async_trait]
    impl LlmBackend for MisleadingBackend {
        async fn generate(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            assert!(user.contains("Coffee cures cancer"));
            Ok("VERDICT: Misleading\nCONFIDENCE: 90%\nSUMMARY: Correlation only.".to_string())
        }

        fn model_name(&self) -> &str {
            "misleading"
        }
    }

    fn prompt() -> Prompt {
        PromptRegistry::load_embedded().require("cross_check").unwrap().clone()
    }

    #[tokio::test]
    async fn test_normalizes_and_caps() {
        let engine = CrossCheckEngine::new(Arc::new(MisleadingBackend), prompt());
        let deadline = Instant::now() + Duration::from_secs(1);
        let verdict = engine.assess(&Query::new("Coffee cures cancer"), deadline).await.unwrap();

        assert_eq!(verdict.label, VerdictLabel::Mixed);
        assert_eq!(verdict.raw_label, "Misleading");
        assert_eq!(verdict.confidence, CROSS_CHECK_MAX_CONFIDENCE);
        assert!(!verdict.grounded);
    }

    #[tokio::test]
    async fn test_deadline_maps_to_timeout() {
        let engine = CrossCheckEngine::new(Arc::new(SlowBackend), prompt());
        let deadline = Instant::now() + Duration::from_millis(100);
        let err = engine.assess(&Query::new("x"), deadline).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout));
    }
}
