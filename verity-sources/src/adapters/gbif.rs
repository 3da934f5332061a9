//! GBIF species search adapter

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use verity_core::{EvidenceItem, ProviderId, Query, SourceType};
use verity_net::send_json;

use super::{assessed, base, parse_records, snippet};
use crate::{EvidenceProvider, ProviderError, ProviderFetch};

pub const DEFAULT_BASE_URL: &str = "https://api.gbif.org";

const SPECIES_URL: &str = "https://www.gbif.org/species";

/// GBIF taxonomy provider
pub struct GbifProvider {
    client: Client,
    base_url: String,
}

impl GbifProvider {
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
struct Taxon {
    key: u64,
    scientific_name: String,
    #[serde(default)]
    rank: Option<String>,
    #[serde(default)]
    kingdom: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    taxonomic_status: Option<String>,
}

impl Taxon {
    fn describe(&self) -> String {
        [
            self.rank.as_deref(),
            self.kingdom.as_deref(),
            self.family.as_deref(),
            self.taxonomic_status.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[async_trait]
impl EvidenceProvider for GbifProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gbif
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
            .get(format!("{}/v1/species/search", self.base_url))
            .query(&[("q", query.text.as_str()), ("limit", limit.as_str())]);

        let body: Value = send_json(request, deadline).await?;
        let (taxa, warnings) = parse_records::<Taxon>(body.get("results"), "taxon")?;

        let as_of = Utc::now();
        let items = taxa
            .into_iter()
            .take(max_results)
            .map(|taxon| {
                let item = EvidenceItem::new(
                    ProviderId::Gbif,
                    &format!("{}/{}", SPECIES_URL, taxon.key),
                    &taxon.scientific_name,
                )
                .with_publisher("GBIF")
                .with_source_type(SourceType::Biodiversity)
                .with_snippet(snippet(&taxon.describe()));
                assessed(item, as_of)
            })
            .collect();

        Ok(ProviderFetch::new(items, warnings))
    }
}
