//! PubMed adapter (NCBI E-utilities)
//!
//! Two calls: `esearch` returns matching PMIDs, `esummary` returns a map
//! keyed by PMID alongside a `uids` list giving the order. Both share the
//! same deadline. `NCBI_API_KEY` is optional and only raises rate limits.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_date};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov";

const ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// PubMed search provider
pub struct PubMedProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PubMedProvider {
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

    fn eutils(&self, tool: &str, params: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(format!("{}/entrez/eutils/{}.fcgi", self.base_url, tool))
            .query(&[("db", "pubmed"), ("retmode", "json")])
            .query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        request
    }
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    fulljournalname: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    pubdate: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[async_trait]
impl EvidenceProvider for PubMedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::PubMed
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let retmax = max_results.to_string();
        let search: Value = send_json(
            self.eutils("esearch", &[("term", query.text.as_str()), ("retmax", retmax.as_str())]),
            deadline,
        )
        .await?;

        let ids: Vec<String> = search
            .pointer("/esearchresult/idlist")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing esearch id list".to_string()))?
            .iter()
            .filter_map(|id| id.as_str().map(str::to_string))
            .take(max_results)
            .collect();

        if ids.is_empty() {
            debug!("PubMed search matched no articles");
            return Ok(ProviderFetch::default());
        }

        let joined = ids.join(",");
        let summary: Value =
            send_json(self.eutils("esummary", &[("id", joined.as_str())]), deadline).await?;
        let result = summary
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::Parse("missing esummary result".to_string()))?;

        let as_of = Utc::now();
        let mut items = Vec::new();
        let mut warnings = Vec::new();
        for uid in &ids {
            let Some(record) = result.get(uid) else {
                warnings.push(format!("summary {}: missing", uid));
                continue;
            };
            let summary = match serde_json::from_value::<Summary>(record.clone()) {
                Ok(s) if !s.title.trim().is_empty() => s,
                Ok(_) => {
                    warnings.push(format!("summary {}: empty title", uid));
                    continue;
                }
                Err(e) => {
                    warnings.push(format!("summary {}: {}", uid, e));
                    continue;
                }
            };

            let journal = summary.fulljournalname.or(summary.source).unwrap_or_default();
            let authors: Vec<&str> = summary.authors.iter().take(3).map(|a| a.name.as_str()).collect();
            let snippet = (!authors.is_empty()).then(|| format!("{}. {}", authors.join(", "), journal));

            let item = EvidenceItem::new(
                ProviderId::PubMed,
                &format!("{}/{}/", ARTICLE_URL, uid),
                summary.title.trim(),
            )
            .with_publisher(&journal)
            .with_source_type(SourceType::Medical)
            .with_published_at(summary.pubdate.as_deref().and_then(parse_date))
            .with_snippet(snippet);
            items.push(assessed(item, as_of));
        }

        Ok(ProviderFetch::new(items, warnings))
    }
}
