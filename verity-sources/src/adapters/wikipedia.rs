//! Wikipedia search adapter (MediaWiki `list=search`)

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::{html_to_text, send_json};

use super::{assessed, base, parse_date, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";

const ARTICLE_URL: &str = "https://en.wikipedia.org/wiki";

/// Wikipedia search provider
pub struct WikipediaProvider {
    client: Client,
    base_url: String,
}

impl WikipediaProvider {
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
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Canonical article URL for a page title
pub fn article_url(title: &str) -> String {
    format!("{}/{}", ARTICLE_URL, urlencoding::encode(&title.replace(' ', "_")))
}

#[async_trait]
impl EvidenceProvider for WikipediaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wikipedia
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let limit = max_results.to_string();
        let request = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query.text.as_str()),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ]);

        let body: Value = send_json(request, deadline).await?;
        let (hits, warnings) = parse_records::<SearchHit>(body.pointer("/query/search"), "search hit")?;

        let as_of = Utc::now();
        let items = hits
            .into_iter()
            .take(max_results)
            .map(|hit| {
                let item = EvidenceItem::new(ProviderId::Wikipedia, &article_url(&hit.title), &hit.title)
                    .with_publisher("Wikipedia")
                    .with_source_type(SourceType::General)
                    .with_published_at(hit.timestamp.as_deref().and_then(parse_date))
                    .with_snippet(snippet(&html_to_text(&hit.snippet)));
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
    fn test_article_url() {
        assert_eq!(article_url("Moon landing"), "https://en.wikipedia.org/wiki/Moon_landing");
        assert_eq!(
            article_url("Apollo 11 (mission)"),
            "https://en.wikipedia.org/wiki/Apollo_11_%28mission%29"
        );
    }
}
