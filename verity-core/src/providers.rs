//! Evidence provider catalog
//!
//! Static registry of every external source Verity knows how to query,
//! with its endpoint, deadline tier and default source type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SourceType;

/// Identity of an evidence provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// General-purpose web search reasoning engine
    WebReasoning,
    /// Professional fact-check registry
    FactCheck,
    #[serde(rename = "openalex")]
    OpenAlex,
    #[serde(rename = "pubmed")]
    PubMed,
    Arxiv,
    ClinicalTrials,
    Gdelt,
    WorldBank,
    Gbif,
    Eonet,
    Wikipedia,
    CourtListener,
    Brave,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WebReasoning => "web_reasoning",
            ProviderId::FactCheck => "fact_check",
            ProviderId::OpenAlex => "openalex",
            ProviderId::PubMed => "pubmed",
            ProviderId::Arxiv => "arxiv",
            ProviderId::ClinicalTrials => "clinical_trials",
            ProviderId::Gdelt => "gdelt",
            ProviderId::WorldBank => "world_bank",
            ProviderId::Gbif => "gbif",
            ProviderId::Eonet => "eonet",
            ProviderId::Wikipedia => "wikipedia",
            ProviderId::CourtListener => "court_listener",
            ProviderId::Brave => "brave",
        }
    }

    /// Catalog entry for this provider
    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        // Every variant has exactly one catalog row; see the catalog test.
        PROVIDER_CATALOG
            .iter()
            .find(|d| d.id == *self)
            .unwrap_or(&PROVIDER_CATALOG[0])
    }

    pub fn tier(&self) -> ProviderTier {
        self.descriptor().tier
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        PROVIDER_CATALOG
            .iter()
            .map(|d| d.id)
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Deadline tier; each tier receives its own fraction of the query budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    /// Reasoning engines and their fallback chain
    Reasoning,
    /// Fast registry-style lookups
    Registry,
    /// Domain-specific indexes
    Specialist,
}

/// An external evidence source
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    /// Human-readable name
    pub name: &'static str,
    /// Default API endpoint
    pub endpoint: &'static str,
    pub tier: ProviderTier,
    /// Source type assigned to items that the credibility tables don't recognize
    pub source_type: SourceType,
    /// Whether an API key is mandatory
    pub requires_key: bool,
}

/// Every provider, in catalog order
pub static PROVIDER_CATALOG: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: ProviderId::WebReasoning,
        name: "Perplexity Sonar",
        endpoint: "https://api.perplexity.ai",
        tier: ProviderTier::Reasoning,
        source_type: SourceType::General,
        requires_key: true,
    },
    ProviderDescriptor {
        id: ProviderId::FactCheck,
        name: "Google Fact Check Tools",
        endpoint: "https://factchecktools.googleapis.com",
        tier: ProviderTier::Registry,
        source_type: SourceType::FactCheck,
        requires_key: true,
    },
    ProviderDescriptor {
        id: ProviderId::OpenAlex,
        name: "OpenAlex",
        endpoint: "https://api.openalex.org",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Academic,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::PubMed,
        name: "PubMed",
        endpoint: "https://eutils.ncbi.nlm.nih.gov",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Medical,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Arxiv,
        name: "arXiv",
        endpoint: "https://export.arxiv.org",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Preprint,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::ClinicalTrials,
        name: "ClinicalTrials.gov",
        endpoint: "https://clinicaltrials.gov",
        tier: ProviderTier::Specialist,
        source_type: SourceType::ClinicalTrial,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Gdelt,
        name: "GDELT",
        endpoint: "https://api.gdeltproject.org",
        tier: ProviderTier::Registry,
        source_type: SourceType::News,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::WorldBank,
        name: "World Bank Documents",
        endpoint: "https://search.worldbank.org",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Economic,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Gbif,
        name: "GBIF",
        endpoint: "https://api.gbif.org",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Biodiversity,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Eonet,
        name: "NASA EONET",
        endpoint: "https://eonet.gsfc.nasa.gov",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Environmental,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Wikipedia,
        name: "Wikipedia",
        endpoint: "https://en.wikipedia.org",
        tier: ProviderTier::Registry,
        source_type: SourceType::General,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::CourtListener,
        name: "CourtListener",
        endpoint: "https://www.courtlistener.com",
        tier: ProviderTier::Specialist,
        source_type: SourceType::Government,
        requires_key: false,
    },
    ProviderDescriptor {
        id: ProviderId::Brave,
        name: "Brave Search",
        endpoint: "https://api.search.brave.com",
        tier: ProviderTier::Registry,
        source_type: SourceType::News,
        requires_key: true,
    },
];

/// Providers queried for every claim regardless of domain
pub const ALWAYS_ON_PROVIDERS: &[ProviderId] = &[ProviderId::WebReasoning, ProviderId::FactCheck];

/// Iterate all known providers
pub fn all_providers() -> impl Iterator<Item = ProviderId> {
    PROVIDER_CATALOG.iter().map(|d| d.id)
}
