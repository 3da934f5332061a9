//! Google Fact Check Tools adapter
//!
//! Searches published fact-checks (ClaimReview markup) from registered
//! fact-checking organizations. Each claim carries a nested list of
//! reviews; every review becomes one evidence item and keeps its textual
//! rating for the fact-check reasoning engine. Requires
//! `GOOGLE_FACTCHECK_API_KEY`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_date, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://factchecktools.googleapis.com";

/// A single published review of a claim
#[derive(Debug, Clone)]
pub struct ClaimReview {
    pub item: EvidenceItem,
    /// Reviewer's own rating wording, e.g. "Pants on Fire"
    pub rating: String,
    pub claim: String,
    pub claimant: Option<String>,
}

/// Google Fact Check Tools provider
pub struct FactCheckProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    language: String,
}

impl FactCheckProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "en".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base(base_url);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Reviews matching the claim, with per-record warnings
    pub async fn search_reviews(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<(Vec<ClaimReview>, Vec<String>), ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured(ProviderId::FactCheck.to_string()))?;

        let page_size = max_results.to_string();
        let request = self
            .client
            .get(format!("{}/v1alpha1/claims:search", self.base_url))
            .query(&[
                ("query", query.text.as_str()),
                ("pageSize", page_size.as_str()),
                ("languageCode", self.language.as_str()),
                ("key", api_key),
            ]);

        let body: Value = send_json(request, deadline).await?;

        // An empty object means no fact-check matched
        let Some(claims) = body.get("claims") else {
            return Ok((Vec::new(), Vec::new()));
        };
        let (claims, mut warnings) = parse_records::<Claim>(Some(claims), "claim")?;

        let as_of = Utc::now();
        let mut reviews = Vec::new();
        for claim in claims {
            let claim_reviews = match parse_records::<Review>(Some(&claim.claim_review), "claim review") {
                Ok((parsed, review_warnings)) => {
                    warnings.extend(review_warnings);
                    parsed
                }
                Err(e) => {
                    warnings.push(e.to_string());
                    continue;
                }
            };

            for review in claim_reviews {
                let title = review
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| claim.text.clone());
                let publisher = review
                    .publisher
                    .as_ref()
                    .and_then(|p| p.name.clone().or_else(|| p.site.clone()))
                    .unwrap_or_default();

                let item = EvidenceItem::new(ProviderId::FactCheck, &review.url, &title)
                    .with_publisher(&publisher)
                    .with_source_type(SourceType::FactCheck)
                    .with_published_at(review.review_date.as_deref().and_then(parse_date))
                    .with_snippet(snippet(&format!(
                        "Rating: {}. Claim: {}",
                        review.textual_rating, claim.text
                    )));

                reviews.push(ClaimReview {
                    item: assessed(item, as_of),
                    rating: review.textual_rating,
                    claim: claim.text.clone(),
                    claimant: claim.claimant.clone(),
                });
            }
        }

        reviews.truncate(max_results);
        Ok((reviews, warnings))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claim {
    #[serde(default)]
    text: String,
    #[serde(default)]
    claimant: Option<String>,
    #[serde(default = "empty_list")]
    claim_review: Value,
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Review {
    url: String,
    textual_rating: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    review_date: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    site: Option<String>,
}

#[async_trait]
impl EvidenceProvider for FactCheckProvider {
    fn id(&self) -> ProviderId {
        ProviderId::FactCheck
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
        let (reviews, warnings) = self.search_reviews(query, max_results, deadline).await?;
        let items = reviews.into_iter().map(|r| r.item).collect();
        Ok(ProviderFetch::new(items, warnings))
    }
}
