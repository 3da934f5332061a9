//! NASA EONET natural events adapter
//!
//! EONET has no free-text search, so a recent window of events is fetched
//! and filtered locally on title and category words shared with the claim.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_date, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://eonet.gsfc.nasa.gov";

/// Events fetched before local filtering
const EVENT_WINDOW: usize = 50;

/// Words shorter than this never count as a match
const MIN_TERM_LEN: usize = 4;

/// NASA EONET provider
pub struct EonetProvider {
    client: Client,
    base_url: String,
}

impl EonetProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }
}

#[derive(Debug, Deserialize)]
struct Event {
    id: String,
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    sources: Vec<EventSource>,
    #[serde(default)]
    geometry: Vec<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Category {
    title: String,
}

#[derive(Debug, Deserialize)]
struct EventSource {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    date: Option<String>,
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

impl Event {
    fn matches(&self, claim_terms: &HashSet<String>) -> bool {
        let mut own = terms(&self.title);
        for category in &self.categories {
            own.extend(terms(&category.title));
        }
        // "wildfires" in a claim should match the "Wildfires" category and "wildfire" titles
        claim_terms.iter().any(|term| {
            own.contains(term)
                || own.iter().any(|o| {
                    term.strip_suffix('s') == Some(o.as_str())
                        || o.strip_suffix('s') == Some(term.as_str())
                })
        })
    }
}

#[async_trait]
impl EvidenceProvider for EonetProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Eonet
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let limit = EVENT_WINDOW.to_string();
        let request = self
            .client
            .get(format!("{}/api/v3/events", self.base_url))
            .query(&[("limit", limit.as_str()), ("status", "all")]);

        let body: Value = send_json(request, deadline).await?;
        let (events, mut warnings) = parse_records::<Event>(body.get("events"), "event")?;

        let claim_terms = terms(&query.normalized);
        let as_of = Utc::now();
        let mut items = Vec::new();
        for event in events.iter().filter(|e| e.matches(&claim_terms)) {
            let Some(url) = event
                .sources
                .first()
                .map(|s| s.url.clone())
                .or_else(|| event.link.clone())
            else {
                warnings.push(format!("event {}: no source url", event.id));
                continue;
            };

            let categories: Vec<&str> = event.categories.iter().map(|c| c.title.as_str()).collect();
            let reporters: Vec<&str> = event.sources.iter().map(|s| s.id.as_str()).collect();
            let text = format!("{}. Reported by {}", categories.join(", "), reporters.join(", "));
            let latest = event.geometry.iter().filter_map(|g| g.date.as_deref()).last();

            let item = EvidenceItem::new(ProviderId::Eonet, &url, &event.title)
                .with_publisher("NASA EONET")
                .with_source_type(SourceType::Environmental)
                .with_published_at(latest.and_then(parse_date))
                .with_snippet(snippet(&text));
            items.push(assessed(item, as_of));
            if items.len() == max_results {
                break;
            }
        }

        Ok(ProviderFetch::new(items, warnings))
    }
}
