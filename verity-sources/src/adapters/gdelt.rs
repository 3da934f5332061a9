//! GDELT DOC 2.0 news adapter
//!
//! GDELT rate-limits aggressively and occasionally returns transient 5xx,
//! so this adapter retries once inside its own deadline. It answers with
//! an empty body or `{}` when nothing matched, and with a plain-text
//! message (not JSON) when it rejects the query.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::{send_text_retrying, RetryPolicy};

use super::{assessed, base, parse_date, parse_records};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://api.gdeltproject.org";

/// GDELT article search provider
pub struct GdeltProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GdeltProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct Article {
    url: String,
    title: String,
    #[serde(default)]
    seendate: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    sourcecountry: Option<String>,
}

#[async_trait]
impl EvidenceProvider for GdeltProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gdelt
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let url = format!("{}/api/v2/doc/doc", self.base_url);
        let max_records = max_results.to_string();
        let make_request = || {
            self.client.get(&url).query(&[
                ("query", query.text.as_str()),
                ("mode", "artlist"),
                ("format", "json"),
                ("maxrecords", max_records.as_str()),
                ("sort", "datedesc"),
            ])
        };

        let body = send_text_retrying(make_request, deadline, self.retry).await?;
        let body = body.trim();
        if body.is_empty() {
            debug!("GDELT returned an empty body");
            return Ok(ProviderFetch::default());
        }

        let value: Value = serde_json::from_str(body).map_err(|_| {
            let first_line = body.lines().next().unwrap_or_default();
            ProviderError::Parse(format!("GDELT rejected query: {}", first_line))
        })?;
        let Some(articles) = value.get("articles") else {
            return Ok(ProviderFetch::default());
        };
        let (articles, warnings) = parse_records::<Article>(Some(articles), "article")?;

        let as_of = Utc::now();
        let items = articles
            .into_iter()
            .take(max_results)
            .map(|a| {
                let snippet = a.sourcecountry.filter(|c| !c.is_empty()).map(|c| format!("Source country: {}", c));
                let item = EvidenceItem::new(ProviderId::Gdelt, &a.url, &a.title)
                    .with_publisher(a.domain.as_deref().unwrap_or_default())
                    .with_source_type(SourceType::News)
                    .with_published_at(a.seendate.as_deref().and_then(parse_date))
                    .with_snippet(snippet);
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}
