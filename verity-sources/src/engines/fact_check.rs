//! Fact-check registry engine
//!
//! Turns published reviews into a verdict by majority of their normalized
//! ratings. A tie between the leading labels reads as Mixed.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

use verity_core::{EngineId, EngineVerdict, Query, VerdictLabel};

use crate::adapters::{ClaimReview, FactCheckProvider};
use crate::{normalize_label, ProviderError, ReasoningEngine};

/// Reviews consulted per claim
pub const MAX_REVIEWS: usize = 10;

/// Confidence at a bare majority, rising with the majority share
const BASE_CONFIDENCE: f64 = 0.5;
const SHARE_WEIGHT: f64 = 0.4;

/// Verdict from professional fact-checkers
pub struct FactCheckEngine {
    provider: Arc<FactCheckProvider>,
}

impl FactCheckEngine {
    pub fn new(provider: Arc<FactCheckProvider>) -> Self {
        Self { provider }
    }
}

/// Majority label over reviews, with its share of all reviews
pub fn tally(reviews: &[ClaimReview]) -> Option<(VerdictLabel, f64)> {
    if reviews.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<VerdictLabel, usize> = BTreeMap::new();
    for review in reviews {
        *counts.entry(normalize_label(&review.rating)).or_default() += 1;
    }

    let top = counts.values().copied().max().unwrap_or_default();
    let leaders: Vec<VerdictLabel> = counts
        .iter()
        .filter(|(_, &count)| count == top)
        .map(|(label, _)| *label)
        .collect();

    let label = match leaders.as_slice() {
        [single] => *single,
        _ => VerdictLabel::Mixed,
    };
    Some((label, top as f64 / reviews.len() as f64))
}

fn summarize(reviews: &[ClaimReview], label: VerdictLabel) -> String {
    let named: Vec<String> = reviews
        .iter()
        .take(3)
        .map(|r| format!("{} rated it \"{}\"", r.item.publisher, r.rating))
        .collect();
    format!(
        "{} published fact-check(s) found; overall {}. {}.",
        reviews.len(),
        label,
        named.join("; ")
    )
}

#[async_trait]
impl ReasoningEngine for FactCheckEngine {
    fn id(&self) -> EngineId {
        EngineId::FactCheckRegistry
    }

    async fn assess(&self, query: &Query, deadline: Instant) -> Result<EngineVerdict, ProviderError> {
        let (reviews, _warnings) = self.provider.search_reviews(query, MAX_REVIEWS, deadline).await?;

        let (label, share) = tally(&reviews)
            .ok_or_else(|| ProviderError::NoVerdict("no published fact-checks".to_string()))?;

        let raw_label = reviews
            .iter()
            .find(|r| normalize_label(&r.rating) == label)
            .map(|r| r.rating.clone())
            .unwrap_or_else(|| label.to_string());

        let summary = summarize(&reviews, label);
        let evidence = reviews.into_iter().map(|r| r.item).collect();

        Ok(EngineVerdict::new(
            EngineId::FactCheckRegistry,
            label,
            BASE_CONFIDENCE + SHARE_WEIGHT * share,
            &summary,
        )
        .with_raw_label(&raw_label)
        .with_evidence(evidence))
    }
}
