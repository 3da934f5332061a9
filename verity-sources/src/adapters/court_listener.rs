//! CourtListener case law adapter
//!
//! Searches court opinions. Anonymous access works at a low rate limit;
//! `COURTLISTENER_API_KEY` is sent as a token when present.

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

pub const DEFAULT_BASE_URL: &str = "https://www.courtlistener.com";

const SITE_URL: &str = "https://www.courtlistener.com";

/// CourtListener opinion search provider
pub struct CourtListenerProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CourtListenerProvider {
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
#[serde(rename_all = "camelCase")]
struct Opinion {
    case_name: String,
    #[serde(rename = "absolute_url")]
    absolute_url: String,
    #[serde(default)]
    court: Option<String>,
    #[serde(default)]
    date_filed: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    opinions: Vec<OpinionText>,
}

#[derive(Debug, Deserialize)]
struct OpinionText {
    #[serde(default)]
    snippet: Option<String>,
}

#[async_trait]
impl EvidenceProvider for CourtListenerProvider {
    fn id(&self) -> ProviderId {
        ProviderId::CourtListener
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let mut request = self
            .client
            .get(format!("{}/api/rest/v4/search/", self.base_url))
            .query(&[("q", query.text.as_str()), ("type", "o")]);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Token {}", key));
        }

        let body: Value = send_json(request, deadline).await?;
        let (opinions, warnings) = parse_records::<Opinion>(body.get("results"), "opinion")?;

        let as_of = Utc::now();
        let items = opinions
            .into_iter()
            .take(max_results)
            .map(|op| {
                let url = if op.absolute_url.starts_with("http") {
                    op.absolute_url.clone()
                } else {
                    format!("{}{}", SITE_URL, op.absolute_url)
                };
                let text = op
                    .snippet
                    .or_else(|| op.opinions.into_iter().find_map(|o| o.snippet))
                    .unwrap_or_default();

                let item = EvidenceItem::new(ProviderId::CourtListener, &url, &op.case_name)
                    .with_publisher(op.court.as_deref().unwrap_or("CourtListener"))
                    .with_source_type(SourceType::Government)
                    .with_published_at(op.date_filed.as_deref().and_then(parse_date))
                    .with_snippet(snippet(&html_to_text(&text)));
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}
