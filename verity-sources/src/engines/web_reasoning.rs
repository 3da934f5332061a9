//! Web-search reasoning engine (Perplexity-compatible chat completions)
//!
//! The answer is prose with `[n]` markers pointing into a `citations` URL
//! list; newer responses also carry `search_results` with titles and dates.
//! Cited URLs become the verdict's supporting evidence.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use verity_core::citations::{cited_sources, extract_urls, strip_markers};
use verity_core::{credibility, EngineId, EngineVerdict, EvidenceItem, ProviderId, Query};
use verity_net::send_json;

use super::DEFAULT_ENGINE_CONFIDENCE;
use crate::adapters::{assessed, base, parse_date};
use crate::{parse_verdict, Prompt, ProviderError, ReasoningEngine};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";

/// Most citations kept as supporting evidence
pub const MAX_CITED: usize = 8;

/// Web-grounded reasoning engine
pub struct WebReasoningEngine {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    prompt: Prompt,
}

impl WebReasoningEngine {
    pub fn new(client: Client, api_key: Option<String>, prompt: Prompt) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Supporting evidence for the cited URLs, titled from `search_results` when possible
fn cited_evidence(urls: &[&str], search_results: &[SearchResult]) -> Vec<EvidenceItem> {
    let as_of = Utc::now();
    urls.iter()
        .take(MAX_CITED)
        .map(|url| {
            let known = search_results.iter().find(|r| r.url == *url);
            let title = known
                .and_then(|r| r.title.clone())
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| credibility::host_of(url));
            let item = EvidenceItem::new(ProviderId::WebReasoning, url, &title)
                .with_published_at(known.and_then(|r| r.date.as_deref()).and_then(parse_date));
            assessed(item, as_of)
        })
        .collect()
}

#[async_trait]
impl ReasoningEngine for WebReasoningEngine {
    fn id(&self) -> EngineId {
        EngineId::WebReasoning
    }

    async fn assess(&self, query: &Query, deadline: Instant) -> Result<EngineVerdict, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured(ProviderId::WebReasoning.to_string()))?;

        let body = json!({
            "model": self.model,
            "max_tokens": self.prompt.output.max_tokens,
            "messages": [
                {"role": "system", "content": self.prompt.system_prompt()},
                {"role": "user", "content": self.prompt.user_message(&query.text)},
            ]
        });

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);

        let response: Value = send_json(request, deadline).await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Parse("missing completion content".to_string()))?;

        let citations: Vec<String> = response
            .get("citations")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let search_results: Vec<SearchResult> = response
            .get("search_results")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|r| serde_json::from_value(r.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let parsed = parse_verdict(content)
            .ok_or_else(|| ProviderError::NoVerdict("web reasoning answer had no verdict".to_string()))?;

        let scraped;
        let cited: Vec<&str> = if citations.is_empty() {
            scraped = extract_urls(content);
            scraped.iter().map(String::as_str).collect()
        } else {
            cited_sources(&parsed.summary, &citations)
        };
        debug!(citations = citations.len(), cited = cited.len(), "Web reasoning answered");

        let evidence = cited_evidence(&cited, &search_results);
        let confidence = parsed.confidence.unwrap_or(DEFAULT_ENGINE_CONFIDENCE);

        Ok(EngineVerdict::new(
            EngineId::WebReasoning,
            parsed.label,
            confidence,
            &strip_markers(&parsed.summary),
        )
        .with_raw_label(&parsed.raw_label)
        .with_evidence(evidence))
    }
}
