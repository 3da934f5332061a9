//! Brave Web Search adapter
//!
//! General web results, used for broad coverage and on sensitive topics.
//! Requires `BRAVE_API_KEY`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::{html_to_text, send_json};

use super::{assessed, base, parse_date, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://api.search.brave.com";

/// Brave Search API provider
pub struct BraveProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl BraveProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }
}

#[derive(Debug, Deserialize)]
struct BraveWebResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    page_age: Option<String>,
    #[serde(default)]
    profile: Option<BraveProfile>,
}

#[derive(Debug, Deserialize)]
struct BraveProfile {
    name: String,
}

#[async_trait]
impl EvidenceProvider for BraveProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Brave
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured(self.id().to_string()))?;

        let url = format!(
            "{}/res/v1/web/search?q={}&count={}",
            self.base_url,
            urlencoding::encode(&query.text),
            max_results
        );

        let request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key);

        let body: Value = send_json(request, deadline).await?;

        // Brave omits the `web` section entirely when nothing matched
        if body.get("web").is_none() {
            debug!("Brave returned no web section");
            return Ok(ProviderFetch::default());
        }

        let (results, warnings) =
            parse_records::<BraveWebResult>(body.pointer("/web/results"), "web result")?;

        let as_of = Utc::now();
        let items = results
            .into_iter()
            .take(max_results)
            .map(|r| {
                let mut item = EvidenceItem::new(ProviderId::Brave, &r.url, &html_to_text(&r.title))
                    .with_source_type(SourceType::News)
                    .with_published_at(r.page_age.as_deref().and_then(parse_date))
                    .with_snippet(snippet(&html_to_text(&r.description)));
                if let Some(profile) = r.profile {
                    item = item.with_publisher(&profile.name);
                }
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}
