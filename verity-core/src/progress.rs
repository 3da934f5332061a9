//! Structured progress updates emitted while a fact check runs
//!
//! Updates are fire-and-forget: a sink may render them, store them or drop
//! them. The orchestrator emits one at each milestone:
//! - run started, or answered from cache
//! - classification done
//! - each provider outcome and engine verdict arrived
//! - consolidation done

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineId, ErrorKind, ProviderId, TerminalState, VerdictLabel};

/// Milestone-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressStage {
    /// The run was admitted and started
    Started { query: String },

    /// A cached result answered the query
    CacheHit { fingerprint: String },

    /// Domain classification finished
    Classified {
        domain: String,
        confidence: f64,
        providers: Vec<ProviderId>,
    },

    /// One provider branch finished, successfully or not
    ProviderFinished {
        provider: ProviderId,
        items: usize,
        elapsed_ms: u64,
        error: Option<ErrorKind>,
    },

    /// A reasoning engine produced a verdict or gave up
    EngineFinished {
        engine: EngineId,
        label: Option<VerdictLabel>,
        error: Option<ErrorKind>,
    },

    /// The final verdict is ready
    Consolidated {
        label: VerdictLabel,
        confidence: f64,
        state: TerminalState,
    },
}

/// A progress update for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub stage: ProgressStage,
    pub created_at: DateTime<Utc>,
}

impl ProgressUpdate {
    pub fn builder(stage: ProgressStage) -> ProgressUpdateBuilder {
        ProgressUpdateBuilder::new(stage)
    }

    /// Short human-readable description
    pub fn describe(&self) -> String {
        match &self.stage {
            ProgressStage::Started { .. } => "Fact check started".to_string(),
            ProgressStage::CacheHit { .. } => "Answered from cache".to_string(),
            ProgressStage::Classified { domain, confidence, providers } => format!(
                "Classified as {} ({:.0}%), querying {} providers",
                domain,
                confidence * 100.0,
                providers.len()
            ),
            ProgressStage::ProviderFinished { provider, items, error: None, .. } => {
                format!("{} returned {} items", provider, items)
            }
            ProgressStage::ProviderFinished { provider, error: Some(e), .. } => {
                format!("{} failed: {}", provider, e)
            }
            ProgressStage::EngineFinished { engine, label: Some(label), .. } => {
                format!("{} verdict: {}", engine, label)
            }
            ProgressStage::EngineFinished { engine, error, .. } => format!(
                "{} gave no verdict{}",
                engine,
                error.as_ref().map(|e| format!(": {}", e)).unwrap_or_default()
            ),
            ProgressStage::Consolidated { label, confidence, .. } => {
                format!("Verdict: {} ({:.0}%)", label, confidence * 100.0)
            }
        }
    }
}

/// Builder for progress updates
pub struct ProgressUpdateBuilder {
    stage: ProgressStage,
    session_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl ProgressUpdateBuilder {
    pub fn new(stage: ProgressStage) -> Self {
        Self {
            stage,
            session_id: None,
            created_at: None,
        }
    }

    pub fn session(mut self, session_id: Option<&str>) -> Self {
        self.session_id = session_id.map(str::to_string);
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> ProgressUpdate {
        ProgressUpdate {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            stage: self.stage,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

/// Sink that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _update: ProgressUpdate) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn emit(&self, update: ProgressUpdate) {
        self(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_builder() {
        let update = ProgressUpdate::builder(ProgressStage::Started {
            query: "is water wet".to_string(),
        })
        .session(Some("s-1"))
        .build();

        assert_eq!(update.session_id.as_deref(), Some("s-1"));
        assert_eq!(update.describe(), "Fact check started");
    }

    #[test]
    fn test_stage_serializes_tagged() {
        let update = ProgressUpdate::builder(ProgressStage::ProviderFinished {
            provider: ProviderId::PubMed,
            items: 3,
            elapsed_ms: 120,
            error: None,
        })
        .build();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["stage"]["type"], "provider_finished");
        assert_eq!(json["stage"]["provider"], "pubmed");
    }

    #[test]
    fn test_describe_failure() {
        let update = ProgressUpdate::builder(ProgressStage::ProviderFinished {
            provider: ProviderId::Gdelt,
            items: 0,
            elapsed_ms: 5000,
            error: Some(ErrorKind::ProviderTimeout),
        })
        .build();
        assert_eq!(update.describe(), "gdelt failed: timed out");
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |u: ProgressUpdate| seen.lock().push(u.describe());
        sink.emit(ProgressUpdate::builder(ProgressStage::CacheHit {
            fingerprint: "abc".to_string(),
        })
        .build());
        NoopSink.emit(ProgressUpdate::builder(ProgressStage::CacheHit {
            fingerprint: "abc".to_string(),
        })
        .build());
        assert_eq!(seen.lock().as_slice(), ["Answered from cache".to_string()]);
    }
}
