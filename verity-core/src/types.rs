//! Data model shared by every stage of a fact check
//!
//! Values flow leaf-first through the pipeline:
//! - [`Query`] is classified into a [`DomainContext`]
//! - provider adapters produce [`EvidenceItem`]s wrapped in a [`ProviderOutcome`]
//! - reasoning engines produce [`EngineVerdict`]s
//! - the orchestrator assembles one [`ConsolidatedResult`]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ProviderId;

/// A natural-language factual query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Text exactly as submitted
    pub text: String,
    /// Lowercased, trimmed, whitespace-collapsed form
    pub normalized: String,
    /// Caller session, if any
    pub session_id: Option<String>,
}

impl Query {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            normalized: normalize_text(text),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<&str>) -> Self {
        self.session_id = session_id.map(str::to_string);
        self
    }

    /// Stable cache key over the normalized text, the provider set and the
    /// per-provider result limit.
    ///
    /// Provider order does not matter: the set is sorted before hashing.
    pub fn fingerprint(&self, providers: &[ProviderId], max_results: usize) -> String {
        let mut ids: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut hasher = Sha256::new();
        hasher.update(self.normalized.as_bytes());
        for id in ids {
            hasher.update(b"|");
            hasher.update(id.as_bytes());
        }
        hasher.update(format!("|max={}", max_results).as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

/// Lowercase, trim and collapse runs of whitespace
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Subject-matter classification of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainContext {
    pub domain: String,
    /// Classification confidence (0.0 - 1.0)
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub suggested_providers: Vec<ProviderId>,
    /// True when no pattern matched and the general domain was used
    #[serde(default)]
    pub fallback: bool,
}

/// Kind of publisher behind an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Government,
    Academic,
    #[serde(rename = "factcheck")]
    FactCheck,
    News,
    Preprint,
    Medical,
    ClinicalTrial,
    Economic,
    Environmental,
    Biodiversity,
    Citation,
    General,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Government => "government",
            SourceType::Academic => "academic",
            SourceType::FactCheck => "factcheck",
            SourceType::News => "news",
            SourceType::Preprint => "preprint",
            SourceType::Medical => "medical",
            SourceType::ClinicalTrial => "clinical_trial",
            SourceType::Economic => "economic",
            SourceType::Environmental => "environmental",
            SourceType::Biodiversity => "biodiversity",
            SourceType::Citation => "citation",
            SourceType::General => "general",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized citation contributed by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub title: String,
    /// Deduplication key
    pub url: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source_type: SourceType,
    /// Credibility score (0 - 100)
    pub credibility_score: u8,
    pub provider_id: ProviderId,
    /// 1-based position after ranking; 0 until ranked
    pub rank: usize,
    pub snippet: Option<String>,
    /// Other providers that surfaced the same URL
    #[serde(default)]
    pub also_found_by: Vec<ProviderId>,
}

impl EvidenceItem {
    pub fn new(provider_id: ProviderId, url: &str, title: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            publisher: String::new(),
            published_at: None,
            source_type: SourceType::General,
            credibility_score: 50,
            provider_id,
            rank: 0,
            snippet: None,
            also_found_by: Vec::new(),
        }
    }

    pub fn with_publisher(mut self, publisher: &str) -> Self {
        self.publisher = publisher.to_string();
        self
    }

    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_credibility(mut self, score: u8) -> Self {
        self.credibility_score = score.min(100);
        self
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.snippet = snippet.filter(|s| !s.trim().is_empty());
        self
    }
}

/// Why a provider or engine branch produced no usable result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The branch did not finish inside its deadline
    ProviderTimeout,
    /// The backing API answered with a non-2xx status
    ProviderHttpError { status: u16 },
    /// Connection-level failure before any status was received
    ProviderTransport,
    /// The payload was malformed or had an unexpected shape
    ProviderParseError,
    /// Required credentials are missing
    ProviderNotConfigured,
    /// The branch task panicked before returning
    ProviderPanicked,
    /// Every branch of the query failed
    AllProvidersFailed,
    /// No reasoning engine produced a verdict
    ConsolidationNoVerdicts,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ProviderTimeout => f.write_str("timed out"),
            ErrorKind::ProviderHttpError { status } => write!(f, "HTTP {}", status),
            ErrorKind::ProviderTransport => f.write_str("connection failed"),
            ErrorKind::ProviderParseError => f.write_str("unparseable response"),
            ErrorKind::ProviderNotConfigured => f.write_str("not configured"),
            ErrorKind::ProviderPanicked => f.write_str("crashed"),
            ErrorKind::AllProvidersFailed => f.write_str("all providers failed"),
            ErrorKind::ConsolidationNoVerdicts => f.write_str("no verdicts"),
        }
    }
}

/// Result of one fan-out branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider_id: ProviderId,
    pub items: Vec<EvidenceItem>,
    pub elapsed_ms: u64,
    pub error: Option<ErrorKind>,
    /// Non-fatal problems such as records that could not be parsed
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ProviderOutcome {
    pub fn success(provider_id: ProviderId, items: Vec<EvidenceItem>, elapsed_ms: u64) -> Self {
        Self {
            provider_id,
            items,
            elapsed_ms,
            error: None,
            warnings: Vec::new(),
        }
    }

    pub fn failure(provider_id: ProviderId, error: ErrorKind, elapsed_ms: u64) -> Self {
        Self {
            provider_id,
            items: Vec::new(),
            elapsed_ms,
            error: Some(error),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Normalized verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerdictLabel {
    True,
    False,
    Mixed,
    Unclear,
}

impl VerdictLabel {
    /// Parse one of the four canonical labels, ignoring case and surrounding space
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "true" => Some(VerdictLabel::True),
            "false" => Some(VerdictLabel::False),
            "mixed" => Some(VerdictLabel::Mixed),
            "unclear" => Some(VerdictLabel::Unclear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::True => "True",
            VerdictLabel::False => "False",
            VerdictLabel::Mixed => "Mixed",
            VerdictLabel::Unclear => "Unclear",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a reasoning engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineId {
    /// Rich web-search reasoning
    WebReasoning,
    /// Professional fact-check registry
    FactCheckRegistry,
    /// Plain-knowledge LLM call without external evidence
    DirectKnowledge,
    /// Independent second LLM opinion
    CrossCheck,
}

impl EngineId {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::WebReasoning => "web_reasoning",
            EngineId::FactCheckRegistry => "fact_check_registry",
            EngineId::DirectKnowledge => "direct_knowledge",
            EngineId::CrossCheck => "cross_check",
        }
    }

    /// Evidence provider whose items this engine's citations are attributed to
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            EngineId::WebReasoning => Some(ProviderId::WebReasoning),
            EngineId::FactCheckRegistry => Some(ProviderId::FactCheck),
            EngineId::DirectKnowledge | EngineId::CrossCheck => None,
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict produced by one reasoning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineVerdict {
    pub engine_id: EngineId,
    pub label: VerdictLabel,
    /// Label as worded by the engine before normalization
    pub raw_label: String,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    pub summary: String,
    pub supporting_evidence: Vec<EvidenceItem>,
    /// False when the verdict rests on model knowledge alone
    pub grounded: bool,
}

impl EngineVerdict {
    pub fn new(engine_id: EngineId, label: VerdictLabel, confidence: f64, summary: &str) -> Self {
        Self {
            engine_id,
            label,
            raw_label: label.as_str().to_string(),
            confidence: confidence.clamp(0.0, 1.0),
            summary: summary.to_string(),
            supporting_evidence: Vec::new(),
            grounded: true,
        }
    }

    pub fn with_raw_label(mut self, raw: &str) -> Self {
        self.raw_label = raw.to_string();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<EvidenceItem>) -> Self {
        self.supporting_evidence = evidence;
        self
    }

    pub fn ungrounded(mut self) -> Self {
        self.grounded = false;
        self
    }
}

/// The final answer of a fact check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    pub confidence: f64,
    pub summary: String,
    pub engine_agreement: bool,
}

/// Terminal state of the orchestrator for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Done,
    Failed,
}

/// The sole externally visible artifact of a fact check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedResult {
    pub query: String,
    pub fingerprint: String,
    pub verdict: Verdict,
    /// Deduplicated and ranked
    pub evidence: Vec<EvidenceItem>,
    pub engine_verdicts: Vec<EngineVerdict>,
    pub domain_context: DomainContext,
    pub timing_ms: u64,
    /// Failed providers and engines keyed by id
    pub errors: BTreeMap<String, ErrorKind>,
    pub state: TerminalState,
    /// True when served from the result cache
    #[serde(default)]
    pub cached: bool,
}

impl ConsolidatedResult {
    pub fn is_degraded(&self) -> bool {
        self.state == TerminalState::Failed || !self.errors.is_empty()
    }
}
