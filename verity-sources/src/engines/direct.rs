//! Plain-knowledge engine: last resort of the fallback chain

use async_trait::async_trait;
use tokio::time::Instant;

use verity_core::{EngineId, EngineVerdict, Query};

use super::{llm_verdict, DEFAULT_ENGINE_CONFIDENCE};
use crate::{Prompt, ProviderError, ReasoningEngine, SharedBackend};

/// Highest confidence an answer without external evidence may carry
pub const DIRECT_MAX_CONFIDENCE: f64 = 0.5;

/// LLM verdict from model knowledge alone
pub struct DirectKnowledgeEngine {
    backend: SharedBackend,
    prompt: Prompt,
}

impl DirectKnowledgeEngine {
    pub fn new(backend: SharedBackend, prompt: Prompt) -> Self {
        Self { backend, prompt }
    }
}

#[async_trait]
impl ReasoningEngine for DirectKnowledgeEngine {
    fn id(&self) -> EngineId {
        EngineId::DirectKnowledge
    }

    async fn assess(&self, query: &Query, deadline: Instant) -> Result<EngineVerdict, ProviderError> {
        let parsed = llm_verdict(&self.backend, &self.prompt, &query.text, deadline).await?;
        let confidence = parsed
            .confidence
            .unwrap_or(DEFAULT_ENGINE_CONFIDENCE)
            .min(DIRECT_MAX_CONFIDENCE);
        let summary = format!("{} (model knowledge only, no external evidence)", parsed.summary.trim());

        Ok(EngineVerdict::new(EngineId::DirectKnowledge, parsed.label, confidence, summary.trim())
            .with_raw_label(&parsed.raw_label)
            .ungrounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError, PromptRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use verity_core::VerdictLabel;

    struct FixedBackend(&'static str);

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn engine(answer: &'static str) -> DirectKnowledgeEngine {
        let prompt = PromptRegistry::load_embedded().require("direct_knowledge").unwrap().clone();
        DirectKnowledgeEngine::new(Arc::new(FixedBackend(answer)), prompt)
    }

    #[tokio::test]
    async fn test_confidence_is_capped_and_ungrounded() {
        let engine = engine(r#"{"verdict": "False", "confidence": 0.95, "summary": "Debunked."}"#);
        let deadline = Instant::now() + Duration::from_secs(1);
        let verdict = engine.assess(&Query::new("The moon is cheese"), deadline).await.unwrap();

        assert_eq!(verdict.label, VerdictLabel::False);
        assert_eq!(verdict.confidence, DIRECT_MAX_CONFIDENCE);
        assert!(!verdict.grounded);
        assert!(verdict.summary.contains("no external evidence"));
    }

    #[tokio::test]
    async fn test_unparseable_answer() {
        let engine = engine("I would rather not say.");
        let deadline = Instant::now() + Duration::from_secs(1);
        let err = engine.assess(&Query::new("x"), deadline).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoVerdict(_)));
    }
}
