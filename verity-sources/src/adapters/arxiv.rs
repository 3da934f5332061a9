//! arXiv preprint adapter
//!
//! The arXiv API answers with an Atom feed. Preprints are not peer
//! reviewed, which the assessor reflects in their score.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::{parse_atom_entries, send_text};

use super::{assessed, base, parse_date, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://export.arxiv.org";

/// arXiv search provider
pub struct ArxivProvider {
    client: Client,
    base_url: String,
}

impl ArxivProvider {
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

#[async_trait]
impl EvidenceProvider for ArxivProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Arxiv
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let search = format!("all:{}", query.text);
        let limit = max_results.to_string();
        let request = self
            .client
            .get(format!("{}/api/query", self.base_url))
            .query(&[("search_query", search.as_str()), ("max_results", limit.as_str())]);

        let xml = send_text(request, deadline).await?;
        if !xml.contains("<feed") {
            return Err(ProviderError::Parse("response is not an Atom feed".to_string()));
        }

        let as_of = Utc::now();
        let mut items = Vec::new();
        let mut warnings = Vec::new();
        for (idx, entry) in parse_atom_entries(&xml).into_iter().enumerate() {
            let Some(url) = entry.link.clone().or(entry.id.clone()) else {
                warnings.push(format!("entry {}: no link", idx));
                continue;
            };
            let Some(title) = entry.title.clone() else {
                warnings.push(format!("entry {}: no title", idx));
                continue;
            };

            let item = EvidenceItem::new(ProviderId::Arxiv, &url, &title)
                .with_publisher("arXiv")
                .with_source_type(SourceType::Preprint)
                .with_published_at(entry.published.as_deref().and_then(parse_date))
                .with_snippet(entry.summary.as_deref().and_then(snippet));
            items.push(assessed(item, as_of));
            if items.len() == max_results {
                break;
            }
        }

        Ok(ProviderFetch::new(items, warnings))
    }
}
