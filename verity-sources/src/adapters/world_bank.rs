//! World Bank Documents & Reports adapter
//!
//! `documents` is an object keyed by document id rather than a list, and
//! carries a `facets` entry that is not a document.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_date, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://search.worldbank.org";

/// World Bank documents search provider
pub struct WorldBankProvider {
    client: Client,
    base_url: String,
}

impl WorldBankProvider {
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
struct Document {
    display_title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    pdfurl: Option<String>,
    #[serde(default)]
    docdt: Option<String>,
    #[serde(default)]
    docty: Option<String>,
    #[serde(default)]
    count: Option<String>,
}

#[async_trait]
impl EvidenceProvider for WorldBankProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WorldBank
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let rows = max_results.to_string();
        let request = self
            .client
            .get(format!("{}/api/v2/wds", self.base_url))
            .query(&[
                ("format", "json"),
                ("qterm", query.text.as_str()),
                ("rows", rows.as_str()),
                ("fl", "display_title,url,pdfurl,docdt,docty,count"),
            ]);

        let body: Value = send_json(request, deadline).await?;
        let documents = body
            .get("documents")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::Parse("missing documents map".to_string()))?;

        let as_of = Utc::now();
        let mut items = Vec::new();
        let mut warnings = Vec::new();
        for (key, record) in documents {
            if key == "facets" {
                continue;
            }
            let doc = match serde_json::from_value::<Document>(record.clone()) {
                Ok(doc) => doc,
                Err(e) => {
                    warnings.push(format!("document {}: {}", key, e));
                    continue;
                }
            };
            let Some(url) = doc.url.or(doc.pdfurl).filter(|u| !u.is_empty()) else {
                warnings.push(format!("document {}: no url", key));
                continue;
            };

            let text = match (doc.docty, doc.count) {
                (Some(kind), Some(country)) => format!("{} ({})", kind, country),
                (Some(kind), None) => kind,
                (None, Some(country)) => country,
                (None, None) => String::new(),
            };
            let item = EvidenceItem::new(ProviderId::WorldBank, &url, doc.display_title.trim())
                .with_publisher("World Bank")
                .with_source_type(SourceType::Economic)
                .with_published_at(doc.docdt.as_deref().and_then(parse_date))
                .with_snippet(snippet(&text));
            items.push(assessed(item, as_of));
            if items.len() == max_results {
                break;
            }
        }

        Ok(ProviderFetch::new(items, warnings))
    }
}
