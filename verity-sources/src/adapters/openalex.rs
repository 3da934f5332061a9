//! OpenAlex scholarly works adapter
//!
//! OpenAlex ships abstracts as an inverted index (word -> positions) rather
//! than text, so the snippet is rebuilt by placing each word at its
//! positions.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_date, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org";

/// OpenAlex works search provider
pub struct OpenAlexProvider {
    client: Client,
    base_url: String,
    /// Contact address for the polite pool
    mailto: Option<String>,
}

impl OpenAlexProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            mailto: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }

    pub fn with_mailto(mut self, mailto: &str) -> Self {
        self.mailto = Some(mailto.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
struct Work {
    id: String,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    abstract_inverted_index: Option<BTreeMap<String, Vec<usize>>>,
    #[serde(default)]
    primary_location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(default)]
    source: Option<LocationSource>,
}

#[derive(Debug, Deserialize)]
struct LocationSource {
    #[serde(default)]
    display_name: Option<String>,
}

/// Rebuild abstract text from an inverted index
pub fn reconstruct_abstract(index: &BTreeMap<String, Vec<usize>>) -> String {
    let mut positioned: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
        .collect();
    positioned.sort_unstable_by_key(|(p, _)| *p);
    positioned
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl EvidenceProvider for OpenAlexProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAlex
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let per_page = max_results.to_string();
        let mut params = vec![("search", query.text.as_str()), ("per-page", per_page.as_str())];
        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.as_str()));
        }

        let request = self
            .client
            .get(format!("{}/works", self.base_url))
            .query(&params);

        let body: Value = send_json(request, deadline).await?;
        let (works, warnings) = parse_records::<Work>(body.get("results"), "work")?;

        let as_of = Utc::now();
        let items = works
            .into_iter()
            .take(max_results)
            .map(|work| {
                let url = work.doi.clone().filter(|d| !d.is_empty()).unwrap_or(work.id);
                let title = work
                    .display_name
                    .or(work.title)
                    .unwrap_or_else(|| "Untitled work".to_string());
                let publisher = work
                    .primary_location
                    .and_then(|l| l.source)
                    .and_then(|s| s.display_name)
                    .unwrap_or_default();
                let text = work
                    .abstract_inverted_index
                    .as_ref()
                    .map(reconstruct_abstract)
                    .unwrap_or_default();

                let item = EvidenceItem::new(ProviderId::OpenAlex, &url, &title)
                    .with_publisher(&publisher)
                    .with_source_type(SourceType::Academic)
                    .with_published_at(work.publication_date.as_deref().and_then(parse_date))
                    .with_snippet(snippet(&text));
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_abstract() {
        let mut index = BTreeMap::new();
        index.insert("Vaccines".to_string(), vec![0]);
        index.insert("reduce".to_string(), vec![1]);
        index.insert("risk".to_string(), vec![3]);
        index.insert("the".to_string(), vec![2]);
        assert_eq!(reconstruct_abstract(&index), "Vaccines reduce the risk");
    }

    #[test]
    fn test_repeated_words() {
        let mut index = BTreeMap::new();
        index.insert("a".to_string(), vec![0, 2]);
        index.insert("b".to_string(), vec![1]);
        assert_eq!(reconstruct_abstract(&index), "a b a");
        assert_eq!(reconstruct_abstract(&BTreeMap::new()), "");
    }
}
