//! Evidence deduplication and ranking
//!
//! Merges the items of every successful provider outcome into one list:
//!
//! 1. group by exact URL, keeping the first-seen item
//! 2. record every other provider that surfaced the same URL
//! 3. sort by credibility (descending), then preferred source type for the
//!    domain, then publish date (newest first, undated last), then original order
//! 4. assign dense 1-based ranks
//!
//! Scores are never modified here.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{preferred_source_types, DomainContext, EvidenceItem, ProviderOutcome};

/// Deduplicate and rank evidence for a domain
pub fn rank_evidence(items: Vec<EvidenceItem>, domain: &DomainContext) -> Vec<EvidenceItem> {
    let preferred = preferred_source_types(&domain.domain);
    let mut merged = deduplicate(items);

    // `sort_by` is stable, so first-seen order settles every remaining tie
    merged.sort_by(|a, b| {
        b.credibility_score
            .cmp(&a.credibility_score)
            .then_with(|| {
                let a_pref = preferred.contains(&a.source_type);
                let b_pref = preferred.contains(&b.source_type);
                b_pref.cmp(&a_pref)
            })
            .then_with(|| compare_dates_desc(a, b))
    });

    for (idx, item) in merged.iter_mut().enumerate() {
        item.rank = idx + 1;
    }

    merged
}

/// Collect the evidence of every successful outcome, in outcome order
pub fn pool_outcomes(outcomes: &[ProviderOutcome]) -> Vec<EvidenceItem> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .flat_map(|o| o.items.iter().cloned())
        .collect()
}

/// Group by exact URL preserving first-seen order
pub fn deduplicate(items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<EvidenceItem> = Vec::with_capacity(items.len());

    for item in items {
        match index.get(&item.url) {
            Some(&pos) => {
                let kept = &mut merged[pos];
                let others = std::iter::once(item.provider_id).chain(item.also_found_by);
                for provider in others {
                    if provider != kept.provider_id && !kept.also_found_by.contains(&provider) {
                        kept.also_found_by.push(provider);
                    }
                }
            }
            None => {
                index.insert(item.url.clone(), merged.len());
                merged.push(item);
            }
        }
    }

    merged
}

fn compare_dates_desc(a: &EvidenceItem, b: &EvidenceItem) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
