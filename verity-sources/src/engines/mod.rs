//! Reasoning engines
//!
//! Each engine turns a claim into an [`EngineVerdict`]. The web-reasoning
//! and registry engines rest on external evidence; the LLM-only engines
//! are marked ungrounded so consolidation and readers can tell them apart.

pub mod cross_check;
pub mod direct;
pub mod fact_check;
pub mod web_reasoning;

pub use cross_check::CrossCheckEngine;
pub use direct::DirectKnowledgeEngine;
pub use fact_check::FactCheckEngine;
pub use web_reasoning::WebReasoningEngine;

use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::{parse_verdict, ParsedVerdict, Prompt, ProviderError, SharedBackend};

/// Confidence assumed when an engine names a label but no confidence
pub const DEFAULT_ENGINE_CONFIDENCE: f64 = 0.5;

/// Run one prompt against an LLM backend and parse the verdict out of it
pub(crate) async fn llm_verdict(
    backend: &SharedBackend,
    prompt: &Prompt,
    claim: &str,
    deadline: Instant,
) -> Result<ParsedVerdict, ProviderError> {
    let user = prompt.user_message(claim);
    let text = timeout_at(deadline, backend.generate(prompt.system_prompt(), &user))
        .await
        .map_err(|_| ProviderError::Timeout)??;

    debug!(model = backend.model_name(), prompt = %prompt.prompt.id, "LLM answered");

    parse_verdict(&text).ok_or_else(|| {
        ProviderError::NoVerdict(format!("{} returned no recognizable verdict", prompt.prompt.id))
    })
}
