//! Fallback strategy runner for reasoning engines
//!
//! Engines are tried in order until one produces a verdict. The order is
//! plain data so deployments can reorder or drop steps without touching
//! the runner.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use verity_core::{EngineId, EngineVerdict, ErrorKind, Query};

use crate::{ProviderError, SharedEngine};

/// Fraction of the remaining budget a non-final step may use
pub const DEFAULT_STEP_SHARE: f64 = 0.6;

/// Outcome of running the chain once
#[derive(Debug, Clone, Default)]
pub struct ChainReport {
    pub verdict: Option<EngineVerdict>,
    /// Engines that failed before the winner, in attempt order
    pub failures: Vec<(EngineId, ErrorKind)>,
}

impl ChainReport {
    pub fn succeeded(&self) -> bool {
        self.verdict.is_some()
    }
}

/// Steps a running chain has finished so far.
///
/// Shared with the caller so an aborted run still reports what its
/// completed steps returned.
pub type ChainProgress = Arc<Mutex<ChainReport>>;

/// Ordered reasoning engines, first success wins
#[derive(Clone)]
pub struct FallbackChain {
    steps: Vec<SharedEngine>,
    step_share: f64,
}

impl FallbackChain {
    pub fn new(steps: Vec<SharedEngine>) -> Self {
        Self {
            steps,
            step_share: DEFAULT_STEP_SHARE,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_step_share(mut self, share: f64) -> Self {
        self.step_share = share.clamp(0.1, 1.0);
        self
    }

    pub fn push(&mut self, engine: SharedEngine) {
        self.steps.push(engine);
    }

    pub fn engine_ids(&self) -> Vec<EngineId> {
        self.steps.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Deadline for the step at `idx`; the last step gets everything left
    fn step_deadline(&self, idx: usize, now: Instant, deadline: Instant) -> Instant {
        if idx + 1 == self.steps.len() {
            return deadline;
        }
        let remaining: Duration = deadline.saturating_duration_since(now);
        now + remaining.mul_f64(self.step_share)
    }

    /// Try each engine in order until one returns a verdict
    pub async fn run(&self, query: &Query, deadline: Instant) -> ChainReport {
        let progress = ChainProgress::default();
        self.run_recorded(query, deadline, &progress).await;
        let report = progress.lock().clone();
        report
    }

    /// Like [`run`](Self::run), recording each step into `progress` as it
    /// finishes
    pub async fn run_recorded(&self, query: &Query, deadline: Instant, progress: &Mutex<ChainReport>) {
        for (idx, engine) in self.steps.iter().enumerate() {
            let id = engine.id();
            let now = Instant::now();
            if now >= deadline {
                debug!(engine = %id, "No budget left for engine");
                progress.lock().failures.push((id, ErrorKind::ProviderTimeout));
                continue;
            }

            let step_deadline = self.step_deadline(idx, now, deadline);
            let result = timeout_at(step_deadline, engine.assess(query, step_deadline))
                .await
                .unwrap_or(Err(ProviderError::Timeout));

            match result {
                Ok(verdict) => {
                    debug!(engine = %id, label = %verdict.label, "Engine produced a verdict");
                    progress.lock().verdict = Some(verdict);
                    return;
                }
                Err(e) => {
                    warn!(engine = %id, "Engine failed: {}", e);
                    progress.lock().failures.push((id, e.kind()));
                }
            }
        }
    }

    /// Close out a run that was stopped early. Engines with no recorded
    /// result are marked `kind`; recorded failures keep their own kind.
    pub fn interrupted(&self, mut partial: ChainReport, kind: ErrorKind) -> ChainReport {
        if partial.verdict.is_some() {
            return partial;
        }
        for id in self.engine_ids() {
            if !partial.failures.iter().any(|(failed, _)| *failed == id) {
                partial.failures.push((id, kind.clone()));
            }
        }
        partial
    }
}
