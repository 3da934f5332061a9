//! Provider selection for a classified query

use crate::{DomainContext, ProviderId, ALWAYS_ON_PROVIDERS};

/// Contested topics that warrant broader coverage
pub static SENSITIVE_TERMS: &[&str] = &[
    "vaccine", "vaccines", "abortion", "election", "elections", "fraud", "climate change",
    "global warming", "gun", "guns", "immigration", "immigrants", "covid", "pandemic",
    "genocide", "holocaust", "war", "israel", "gaza", "ukraine", "russia", "transgender",
    "conspiracy", "5g", "fluoride",
];

/// Providers added when a query touches a sensitive topic
pub static SENSITIVE_EXTRAS: &[ProviderId] = &[
    ProviderId::Brave,
    ProviderId::Gdelt,
    ProviderId::OpenAlex,
];

/// Whole-word check against [`SENSITIVE_TERMS`]
pub fn is_sensitive(text: &str) -> bool {
    let view = word_view(text);
    SENSITIVE_TERMS
        .iter()
        .any(|term| view.contains(&format!(" {} ", term)))
}

/// Which providers a query should be sent to.
///
/// Always-on providers come first, then the domain's suggestions, then the
/// sensitive-topic extras. Order is preserved and repeats are dropped.
/// When `enabled` is given, only providers it contains survive.
pub fn select_providers(
    domain: &DomainContext,
    text: &str,
    enabled: Option<&[ProviderId]>,
) -> Vec<ProviderId> {
    let extras: &[ProviderId] = if is_sensitive(text) { SENSITIVE_EXTRAS } else { &[] };

    let mut selected: Vec<ProviderId> = Vec::new();
    for id in ALWAYS_ON_PROVIDERS
        .iter()
        .chain(domain.suggested_providers.iter())
        .chain(extras.iter())
    {
        if !selected.contains(id) && enabled.map_or(true, |set| set.contains(id)) {
            selected.push(*id);
        }
    }
    selected
}

fn word_view(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}
