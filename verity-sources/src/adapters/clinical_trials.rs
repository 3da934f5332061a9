//! ClinicalTrials.gov v2 adapter
//!
//! Study fields are spread over named modules of `protocolSection`.

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

pub const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov";

const STUDY_URL: &str = "https://clinicaltrials.gov/study";

/// ClinicalTrials.gov study search provider
pub struct ClinicalTrialsProvider {
    client: Client,
    base_url: String,
}

impl ClinicalTrialsProvider {
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
#[serde(rename_all = "camelCase")]
struct Study {
    protocol_section: ProtocolSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSection {
    identification_module: IdentificationModule,
    #[serde(default)]
    status_module: Option<StatusModule>,
    #[serde(default)]
    description_module: Option<DescriptionModule>,
    #[serde(default)]
    sponsor_collaborators_module: Option<SponsorModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationModule {
    nct_id: String,
    #[serde(default)]
    brief_title: Option<String>,
    #[serde(default)]
    official_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusModule {
    #[serde(default)]
    overall_status: Option<String>,
    #[serde(default)]
    start_date_struct: Option<DateStruct>,
}

#[derive(Debug, Deserialize)]
struct DateStruct {
    date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptionModule {
    #[serde(default)]
    brief_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorModule {
    #[serde(default)]
    lead_sponsor: Option<Sponsor>,
}

#[derive(Debug, Deserialize)]
struct Sponsor {
    name: String,
}

#[async_trait]
impl EvidenceProvider for ClinicalTrialsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ClinicalTrials
    }

    async fn fetch(
        &self,
        query: &Query,
        max_results: usize,
        deadline: Instant,
    ) -> Result<ProviderFetch, ProviderError> {
        let page_size = max_results.to_string();
        let request = self
            .client
            .get(format!("{}/api/v2/studies", self.base_url))
            .query(&[
                ("query.term", query.text.as_str()),
                ("pageSize", page_size.as_str()),
                ("format", "json"),
            ]);

        let body: Value = send_json(request, deadline).await?;
        let (studies, warnings) = parse_records::<Study>(body.get("studies"), "study")?;

        let as_of = Utc::now();
        let items = studies
            .into_iter()
            .take(max_results)
            .map(|study| {
                let section = study.protocol_section;
                let id = section.identification_module;
                let title = id
                    .brief_title
                    .or(id.official_title)
                    .unwrap_or_else(|| id.nct_id.clone());
                let status = section.status_module;
                let started = status
                    .as_ref()
                    .and_then(|s| s.start_date_struct.as_ref())
                    .and_then(|d| parse_date(&d.date));
                let overall = status.and_then(|s| s.overall_status);
                let summary = section
                    .description_module
                    .and_then(|d| d.brief_summary)
                    .unwrap_or_default();
                let text = match overall {
                    Some(overall) => format!("[{}] {}", overall, summary),
                    None => summary,
                };
                let sponsor = section
                    .sponsor_collaborators_module
                    .and_then(|s| s.lead_sponsor)
                    .map(|s| s.name)
                    .unwrap_or_default();

                let item = EvidenceItem::new(
                    ProviderId::ClinicalTrials,
                    &format!("{}/{}", STUDY_URL, id.nct_id),
                    &title,
                )
                .with_publisher(&sponsor)
                .with_source_type(SourceType::ClinicalTrial)
                .with_published_at(started)
                .with_snippet(snippet(&text));
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}
