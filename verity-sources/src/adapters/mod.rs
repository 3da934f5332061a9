//! Provider adapters, one per external evidence source
//!
//! Every adapter follows the same shape:
//! - a `with_base_url` override so contract tests can target a mock server
//! - one or more deadline-bounded HTTP calls through `verity_net`
//! - lenient per-record parsing: a bad record becomes a warning, not an error
//! - a provisional credibility score from the assessor, never a rank

pub mod arxiv;
pub mod brave;
pub mod clinical_trials;
pub mod court_listener;
pub mod eonet;
pub mod fact_check;
pub mod gbif;
pub mod gdelt;
pub mod openalex;
pub mod pubmed;
pub mod wikipedia;
pub mod world_bank;

pub use arxiv::ArxivProvider;
pub use brave::BraveProvider;
pub use clinical_trials::ClinicalTrialsProvider;
pub use court_listener::CourtListenerProvider;
pub use eonet::EonetProvider;
pub use fact_check::{ClaimReview, FactCheckProvider};
pub use gbif::GbifProvider;
pub use gdelt::GdeltProvider;
pub use openalex::OpenAlexProvider;
pub use pubmed::PubMedProvider;
pub use wikipedia::WikipediaProvider;
pub use world_bank::WorldBankProvider;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use verity_core::{credibility, EvidenceItem, SourceType};
use verity_net::{normalize_whitespace, truncate_chars};

use crate::ProviderError;

/// Longest snippet kept on an evidence item
pub const MAX_SNIPPET_CHARS: usize = 400;

/// Deserialize each record on its own so one bad record cannot sink the rest.
///
/// `records` is the array located in the response; `None` or a non-array
/// means the response shape itself is wrong, which is an error.
pub fn parse_records<T: DeserializeOwned>(
    records: Option<&Value>,
    what: &str,
) -> Result<(Vec<T>, Vec<String>), ProviderError> {
    let array = records
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse(format!("missing {} list", what)))?;

    let mut parsed = Vec::with_capacity(array.len());
    let mut warnings = Vec::new();
    for (idx, record) in array.iter().enumerate() {
        match serde_json::from_value::<T>(record.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => warnings.push(format!("{} record {}: {}", what, idx, e)),
        }
    }
    Ok((parsed, warnings))
}

/// Parse the date formats seen across provider APIs
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H%M%SZ", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y %b %d", "%B %d, %Y", "%d %B %Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }

    // Partial dates: "2021-03", "2021 Mar", "2021"
    let padded = match raw.len() {
        4 => format!("{}-01-01", raw),
        7 if raw.as_bytes()[4] == b'-' => format!("{}-01", raw),
        _ => String::new(),
    };
    if let Ok(date) = NaiveDate::parse_from_str(&padded, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(&format!("{} 01", raw), "%Y %b %d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Clean and shorten a snippet, dropping empty ones
pub fn snippet(text: &str) -> Option<String> {
    let cleaned = normalize_whitespace(text);
    (!cleaned.is_empty()).then(|| truncate_chars(&cleaned, MAX_SNIPPET_CHARS))
}

/// Apply the credibility assessor to a freshly built item.
///
/// Adapters whose own type is generic (`general`, `news`) adopt the type
/// the assessor recognizes from the host. A missing publisher falls back
/// to the host name.
pub fn assessed(mut item: EvidenceItem, as_of: DateTime<Utc>) -> EvidenceItem {
    if item.publisher.is_empty() {
        item.publisher = credibility::host_of(&item.url);
    }
    let assessment = credibility::assess(&item.url, Some(&item.title), item.published_at, as_of);
    let generic = matches!(item.source_type, SourceType::General | SourceType::News);
    let source_type = if generic && assessment.source_type != SourceType::General {
        assessment.source_type
    } else {
        item.source_type
    };
    item.with_credibility(assessment.score).with_source_type(source_type)
}

/// Trim a configured base URL so paths can be appended
pub(crate) fn base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
