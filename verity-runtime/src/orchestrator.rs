//! Fan-out orchestrator
//!
//! One fact check moves through `Classifying → Dispatching → Collecting →
//! Done | Failed`:
//! - the query is classified and a provider set is selected
//! - every evidence provider, the reasoning fallback chain and the optional
//!   cross-check are spawned as independent tasks, each under its own tier
//!   deadline
//! - results are collected by a single owner in completion order until all
//!   branches finish, the overall deadline passes or the caller cancels
//! - evidence is ranked, verdicts consolidated, and the result stored
//!
//! Branch failures are data. The only `Err` is an admission deny.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::{Id as TaskId, JoinSet};
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use verity_core::{
    classify, consolidate, pool_outcomes, rank_evidence, select_providers, ConsolidatedResult,
    DomainContext, EngineId, EngineVerdict, ErrorKind, ProgressSink, ProgressStage,
    ProgressUpdate, ProviderId, ProviderOutcome, ProviderTier, Query, SessionStore,
    TerminalState, Verdict, VerdictLabel, FAILED_CONFIDENCE_CEILING, NO_VERDICT_CONFIDENCE,
};
use verity_sources::{
    ChainProgress, ChainReport, FallbackChain, ProviderError, ProviderRegistry, SharedEngine,
    SourceSet,
};

use crate::{
    AdmissionGate, AllowAll, FactCheckConfig, MemoryCache, NoCache, ResultCache, RunConfig,
    TierBudgets,
};

/// Error-map key recorded when every branch failed
pub const PIPELINE_ERROR_KEY: &str = "pipeline";

/// Error-map key recorded when evidence arrived but no engine gave a verdict
pub const CONSOLIDATION_ERROR_KEY: &str = "consolidation";

/// Admission identifier for runs without a session
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Why a fact check was not run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Query rejected by admission control")]
    Rejected { retry_after: Option<Duration> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKey {
    Provider(ProviderId),
    Chain,
    CrossCheck,
}

enum BranchOutput {
    Provider(ProviderOutcome),
    Chain(ChainReport),
    CrossCheck(Result<EngineVerdict, ErrorKind>),
}

impl BranchOutput {
    fn key(&self) -> BranchKey {
        match self {
            BranchOutput::Provider(outcome) => BranchKey::Provider(outcome.provider_id),
            BranchOutput::Chain(_) => BranchKey::Chain,
            BranchOutput::CrossCheck(_) => BranchKey::CrossCheck,
        }
    }
}

/// Emits progress to the caller's sink and, for session runs, the store.
///
/// A caller that passes the session store itself as the sink gets each
/// update recorded once.
struct Reporter<'a> {
    sink: &'a dyn ProgressSink,
    sessions: Option<&'a SessionStore>,
    session_id: Option<&'a str>,
}

impl Reporter<'_> {
    fn emit(&self, stage: ProgressStage) {
        let update = ProgressUpdate::builder(stage).session(self.session_id).build();
        if let (Some(store), Some(_)) = (self.sessions, self.session_id) {
            if !std::ptr::addr_eq(self.sink as *const dyn ProgressSink, store as *const SessionStore) {
                store.record_update(update.clone());
            }
        }
        self.sink.emit(update);
    }

    fn finish(&self, result: &ConsolidatedResult) {
        if let (Some(store), Some(session_id)) = (self.sessions, self.session_id) {
            store.record_result(session_id, result.clone());
        }
    }
}

/// Everything the single-owner collect loop accumulates
#[derive(Default)]
struct Collected {
    outcomes: Vec<ProviderOutcome>,
    chain: Option<ChainReport>,
    cross_check: Option<Result<EngineVerdict, ErrorKind>>,
}

/// Runs fact checks against a set of providers and engines
pub struct FactChecker {
    registry: ProviderRegistry,
    chain: FallbackChain,
    cross_check: Option<SharedEngine>,
    tiers: TierBudgets,
    cache: Arc<dyn ResultCache>,
    cache_ttl: Duration,
    admission: Arc<dyn AdmissionGate>,
    sessions: Option<Arc<SessionStore>>,
}

impl FactChecker {
    /// A checker with default tiers, no cache, no admission limit and no
    /// session store
    pub fn new(sources: SourceSet) -> Self {
        Self {
            registry: sources.registry,
            chain: sources.chain,
            cross_check: sources.cross_check,
            tiers: TierBudgets::default(),
            cache: Arc::new(NoCache),
            cache_ttl: Duration::from_secs(3600),
            admission: Arc::new(AllowAll),
            sessions: None,
        }
    }

    /// A checker wired the way a config file describes
    pub fn from_config(sources: SourceSet, config: &FactCheckConfig) -> Self {
        let sessions = SessionStore::new(config.max_sessions, config.session_ttl());
        Self::new(sources)
            .with_tiers(config.tiers)
            .with_cache(Arc::new(MemoryCache::new(config.cache_capacity)), config.cache_ttl())
            .with_sessions(Arc::new(sessions))
    }

    pub fn with_tiers(mut self, tiers: TierBudgets) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_admission(mut self, admission: Arc<dyn AdmissionGate>) -> Self {
        self.admission = admission;
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Providers a query would be sent to under `config`.
    ///
    /// With `auto`, unregistered and unconfigured providers are dropped.
    /// An explicit list keeps registered but unconfigured providers so the
    /// result reports them as not configured. `web_reasoning` stands for
    /// the reasoning chain and survives only when the chain has engines.
    pub fn plan(&self, domain: &DomainContext, text: &str, config: &RunConfig) -> Vec<ProviderId> {
        let filter = config.enabled_providers.as_filter();
        select_providers(domain, text, filter)
            .into_iter()
            .filter(|id| match id {
                ProviderId::WebReasoning => !self.chain.is_empty(),
                _ => self
                    .registry
                    .get(*id)
                    .is_some_and(|p| filter.is_some() || p.is_configured()),
            })
            .collect()
    }

    /// Run one fact check with no outside cancellation
    pub async fn run_fact_check(
        &self,
        text: &str,
        session_id: Option<&str>,
        config: &RunConfig,
        sink: &dyn ProgressSink,
    ) -> Result<ConsolidatedResult, RunError> {
        self.run_fact_check_with_cancel(text, session_id, config, sink, CancellationToken::new())
            .await
    }

    /// Run one fact check. Cancelling `cancel` ends collection early; the
    /// branches still outstanding are recorded as timed out.
    pub async fn run_fact_check_with_cancel(
        &self,
        text: &str,
        session_id: Option<&str>,
        config: &RunConfig,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<ConsolidatedResult, RunError> {
        let admission = self.admission.allow(session_id.unwrap_or(ANONYMOUS_CALLER)).await;
        if !admission.allowed {
            warn!(retry_after = ?admission.retry_after, "Fact check rejected by admission gate");
            return Err(RunError::Rejected {
                retry_after: admission.retry_after,
            });
        }

        let start = Instant::now();
        let budget = config.overall_budget();
        let cutoff = start + budget.saturating_sub(Duration::from_millis(config.grace_ms));
        let reporter = Reporter {
            sink,
            sessions: self.sessions.as_deref(),
            session_id,
        };

        let query = Query::new(text).with_session(session_id);
        debug!(query = %query.text, "Fact check started");
        reporter.emit(ProgressStage::Started {
            query: query.text.clone(),
        });

        // Classifying
        let domain = classify(&query.text);
        let providers = self.plan(&domain, &query.text, config);
        let fingerprint = query.fingerprint(&providers, config.max_results_per_provider);
        reporter.emit(ProgressStage::Classified {
            domain: domain.domain.clone(),
            confidence: domain.confidence,
            providers: providers.clone(),
        });

        if let Some(mut hit) = self.cache.get(&fingerprint).await {
            info!(fingerprint = %fingerprint, "Answered from cache");
            hit.cached = true;
            reporter.emit(ProgressStage::CacheHit { fingerprint });
            reporter.finish(&hit);
            return Ok(hit);
        }

        // Dispatching
        info!(
            fingerprint = %fingerprint,
            domain = %domain.domain,
            providers = providers.len(),
            "Dispatching fact check"
        );
        let mut set = JoinSet::new();
        let mut pending: Vec<(TaskId, BranchKey)> = Vec::new();
        let chain_progress = ChainProgress::default();
        for id in &providers {
            let spawned = self.spawn_branch(&mut set, *id, &query, config, start, cutoff, &chain_progress);
            pending.extend(spawned);
        }
        if providers.contains(&ProviderId::WebReasoning) {
            if let Some(engine) = &self.cross_check {
                let engine = engine.clone();
                let query = query.clone();
                let deadline = self.tiers.deadline_for(ProviderTier::Reasoning, start, budget, cutoff);
                let handle = set.spawn(async move {
                    let result = timeout_at(deadline, engine.assess(&query, deadline))
                        .await
                        .unwrap_or(Err(ProviderError::Timeout))
                        .map_err(|e| {
                            warn!(engine = %EngineId::CrossCheck, "Cross-check failed: {}", e);
                            e.kind()
                        });
                    BranchOutput::CrossCheck(result)
                });
                pending.push((handle.id(), BranchKey::CrossCheck));
            }
        }

        // Collecting
        let mut collected = Collected::default();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(outstanding = pending.len(), "Fact check cancelled");
                    break;
                }
                _ = sleep_until(cutoff) => {
                    warn!(outstanding = pending.len(), "Overall deadline reached");
                    break;
                }
                joined = set.join_next_with_id() => match joined {
                    None => break,
                    Some(Ok((task, output))) => {
                        debug_assert_eq!(Some(output.key()), branch_of(&pending, task));
                        pending.retain(|(t, _)| *t != task);
                        self.record(output, &mut collected, &reporter);
                    }
                    Some(Err(e)) => {
                        let task = e.id();
                        if let Some(key) = branch_of(&pending, task) {
                            warn!(branch = ?key, "Branch task ended abnormally: {}", e);
                            pending.retain(|(t, _)| *t != task);
                            let kind = if e.is_panic() {
                                ErrorKind::ProviderPanicked
                            } else {
                                ErrorKind::ProviderTimeout
                            };
                            let output = self.abandoned(key, kind, start, &chain_progress);
                            self.record(output, &mut collected, &reporter);
                        }
                    }
                },
            }
        }
        set.abort_all();

        for (_, key) in pending {
            let output = self.abandoned(key, ErrorKind::ProviderTimeout, start, &chain_progress);
            self.record(output, &mut collected, &reporter);
        }

        let result = self.assemble(&query, fingerprint, domain, collected, start);
        reporter.emit(ProgressStage::Consolidated {
            label: result.verdict.label,
            confidence: result.verdict.confidence,
            state: result.state,
        });
        info!(
            label = %result.verdict.label,
            confidence = result.verdict.confidence,
            evidence = result.evidence.len(),
            failed = result.errors.len(),
            timing_ms = result.timing_ms,
            "Fact check finished"
        );

        if result.state == TerminalState::Done && !result.engine_verdicts.is_empty() {
            self.cache.set(&result.fingerprint, result.clone(), self.cache_ttl).await;
        }
        reporter.finish(&result);
        Ok(result)
    }

    /// Spawn the branch for `id`, returning its task and key unless nothing
    /// was spawned
    #[allow(clippy::too_many_arguments)]
    fn spawn_branch(
        &self,
        set: &mut JoinSet<BranchOutput>,
        id: ProviderId,
        query: &Query,
        config: &RunConfig,
        start: Instant,
        cutoff: Instant,
        chain_progress: &ChainProgress,
    ) -> Option<(TaskId, BranchKey)> {
        let budget = config.overall_budget();
        let deadline = self.tiers.deadline_for(id.tier(), start, budget, cutoff);
        let query = query.clone();

        if id == ProviderId::WebReasoning {
            let chain = self.chain.clone();
            let progress = chain_progress.clone();
            let handle = set.spawn(async move {
                chain.run_recorded(&query, deadline, &progress).await;
                let report = progress.lock().clone();
                BranchOutput::Chain(report)
            });
            return Some((handle.id(), BranchKey::Chain));
        }

        let provider = self.registry.get(id)?.clone();
        let max_results = config.max_results_per_provider;
        let handle = set.spawn(async move {
            let began = Instant::now();
            let result = timeout_at(deadline, provider.fetch(&query, max_results, deadline)).await;
            let elapsed_ms = began.elapsed().as_millis() as u64;
            let outcome = match result {
                Ok(Ok(mut fetch)) => {
                    fetch.items.truncate(max_results);
                    debug!(provider = %id, items = fetch.items.len(), elapsed_ms, "Provider finished");
                    ProviderOutcome::success(id, fetch.items, elapsed_ms).with_warnings(fetch.warnings)
                }
                Ok(Err(e)) => {
                    warn!(provider = %id, "Provider failed: {}", e);
                    ProviderOutcome::failure(id, e.kind(), elapsed_ms)
                }
                Err(_) => {
                    warn!(provider = %id, elapsed_ms, "Provider missed its deadline");
                    ProviderOutcome::failure(id, ErrorKind::ProviderTimeout, elapsed_ms)
                }
            };
            BranchOutput::Provider(outcome)
        });
        Some((handle.id(), BranchKey::Provider(id)))
    }

    /// Output for a branch that never returned. The chain keeps whatever
    /// steps it finished before it was stopped.
    fn abandoned(
        &self,
        key: BranchKey,
        kind: ErrorKind,
        start: Instant,
        chain_progress: &ChainProgress,
    ) -> BranchOutput {
        match key {
            BranchKey::Provider(id) => BranchOutput::Provider(ProviderOutcome::failure(
                id,
                kind,
                start.elapsed().as_millis() as u64,
            )),
            BranchKey::Chain => {
                let partial = chain_progress.lock().clone();
                BranchOutput::Chain(self.chain.interrupted(partial, kind))
            }
            BranchKey::CrossCheck => BranchOutput::CrossCheck(Err(kind)),
        }
    }

    fn record(&self, output: BranchOutput, collected: &mut Collected, reporter: &Reporter<'_>) {
        match output {
            BranchOutput::Provider(outcome) => {
                reporter.emit(ProgressStage::ProviderFinished {
                    provider: outcome.provider_id,
                    items: outcome.items.len(),
                    elapsed_ms: outcome.elapsed_ms,
                    error: outcome.error.clone(),
                });
                collected.outcomes.push(outcome);
            }
            BranchOutput::Chain(report) => {
                for (engine, kind) in &report.failures {
                    reporter.emit(ProgressStage::EngineFinished {
                        engine: *engine,
                        label: None,
                        error: Some(kind.clone()),
                    });
                }
                if let Some(verdict) = &report.verdict {
                    reporter.emit(ProgressStage::EngineFinished {
                        engine: verdict.engine_id,
                        label: Some(verdict.label),
                        error: None,
                    });
                }
                collected.chain = Some(report);
            }
            BranchOutput::CrossCheck(result) => {
                let (label, error) = match &result {
                    Ok(verdict) => (Some(verdict.label), None),
                    Err(kind) => (None, Some(kind.clone())),
                };
                reporter.emit(ProgressStage::EngineFinished {
                    engine: EngineId::CrossCheck,
                    label,
                    error,
                });
                collected.cross_check = Some(result);
            }
        }
    }

    /// Rank, consolidate and build the result from a fixed completed set
    fn assemble(
        &self,
        query: &Query,
        fingerprint: String,
        domain: DomainContext,
        mut collected: Collected,
        start: Instant,
    ) -> ConsolidatedResult {
        // Completion order is not reproducible; provider order is
        collected.outcomes.sort_by_key(|o| o.provider_id);

        let mut errors: BTreeMap<String, ErrorKind> = BTreeMap::new();
        for outcome in &collected.outcomes {
            if let Some(kind) = &outcome.error {
                errors.insert(outcome.provider_id.to_string(), kind.clone());
            }
        }

        let mut verdicts: Vec<EngineVerdict> = Vec::new();
        if let Some(report) = collected.chain {
            for (engine, kind) in report.failures {
                errors.insert(engine.to_string(), kind);
            }
            verdicts.extend(report.verdict);
        }
        match collected.cross_check {
            Some(Ok(verdict)) => verdicts.push(verdict),
            Some(Err(kind)) => {
                errors.insert(EngineId::CrossCheck.to_string(), kind);
            }
            None => {}
        }

        let any_provider = collected.outcomes.iter().any(ProviderOutcome::is_success);
        let timing_ms = start.elapsed().as_millis() as u64;

        if !any_provider && verdicts.is_empty() {
            warn!(failed = errors.len(), "Every branch failed");
            let summary = degraded_summary("No provider or engine returned a result.", &errors);
            errors.insert(PIPELINE_ERROR_KEY.to_string(), ErrorKind::AllProvidersFailed);
            return ConsolidatedResult {
                query: query.text.clone(),
                fingerprint,
                verdict: Verdict {
                    label: VerdictLabel::Unclear,
                    confidence: NO_VERDICT_CONFIDENCE.min(FAILED_CONFIDENCE_CEILING),
                    summary,
                    engine_agreement: false,
                },
                evidence: Vec::new(),
                engine_verdicts: Vec::new(),
                domain_context: domain,
                timing_ms,
                errors,
                state: TerminalState::Failed,
                cached: false,
            };
        }

        let mut pool = pool_outcomes(&collected.outcomes);
        for verdict in &verdicts {
            pool.extend(verdict.supporting_evidence.iter().cloned());
        }
        let evidence = rank_evidence(pool, &domain);

        let mut verdict = consolidate(&verdicts);
        verdict.summary = degraded_summary(&verdict.summary, &errors);
        if verdicts.is_empty() {
            errors.insert(CONSOLIDATION_ERROR_KEY.to_string(), ErrorKind::ConsolidationNoVerdicts);
        }

        ConsolidatedResult {
            query: query.text.clone(),
            fingerprint,
            verdict,
            evidence,
            engine_verdicts: verdicts,
            domain_context: domain,
            timing_ms,
            errors,
            state: TerminalState::Done,
            cached: false,
        }
    }
}

fn branch_of(pending: &[(TaskId, BranchKey)], task: TaskId) -> Option<BranchKey> {
    pending.iter().find(|(t, _)| *t == task).map(|(_, key)| *key)
}

/// Append the failed branches to a summary, if any
fn degraded_summary(summary: &str, errors: &BTreeMap<String, ErrorKind>) -> String {
    if errors.is_empty() {
        return summary.to_string();
    }
    let failed: Vec<String> = errors
        .iter()
        .map(|(id, kind)| format!("{} ({})", id, kind))
        .collect();
    format!("{} Unavailable: {}.", summary.trim_end(), failed.join(", "))
}
