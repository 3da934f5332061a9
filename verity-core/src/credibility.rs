//! Source credibility assessment
//!
//! Scores a URL from its host, its title wording and its age:
//! - recognized host tables supply a base score between 75 and 98
//! - sensational wording subtracts up to 30
//! - known-unreliable hosts are capped at 25 whatever else applies
//! - recent content gains up to 5, old content loses up to 10
//!
//! Assessment is referentially transparent: the caller supplies the
//! reference time, so the same inputs always give the same score.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::SourceType;

/// Score for hosts no table recognizes
pub const BASE_SCORE: i32 = 50;

/// Ceiling applied to known-unreliable hosts
pub const UNRELIABLE_CAP: i32 = 25;

/// Largest total penalty for sensational wording
pub const MAX_LEXICAL_PENALTY: i32 = 30;

const LEXICAL_PENALTY_EACH: i32 = 10;

/// One contribution to a credibility score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityFactor {
    pub label: String,
    pub impact: i32,
}

/// Outcome of [`assess`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityAssessment {
    /// Final score (0 - 100)
    pub score: u8,
    pub source_type: SourceType,
    pub factors: Vec<CredibilityFactor>,
}

/// A table of recognized hosts sharing one base score and type
struct HostTable {
    label: &'static str,
    score: i32,
    source_type: SourceType,
    /// Host names, or suffixes when they start with '.'
    hosts: &'static [&'static str],
}

/// Checked in order; the first matching table wins
static HOST_TABLES: &[HostTable] = &[
    HostTable {
        label: "International body",
        score: 92,
        source_type: SourceType::Government,
        hosts: &[
            "who.int", "un.org", "worldbank.org", "imf.org", "oecd.org", "ipcc.ch", "unep.org",
            "wto.org", "unesco.org", "unicef.org", "gbif.org", "iucnredlist.org",
        ],
    },
    HostTable {
        label: "Medical authority",
        score: 90,
        source_type: SourceType::Medical,
        hosts: &[
            "clinicaltrials.gov", "pubmed.ncbi.nlm.nih.gov", "nejm.org", "thelancet.com",
            "bmj.com", "jamanetwork.com", "cochranelibrary.com", "mayoclinic.org",
        ],
    },
    HostTable {
        label: "Government domain",
        score: 90,
        source_type: SourceType::Government,
        hosts: &[
            ".gov", ".mil", ".gov.uk", ".gov.au", ".gc.ca", ".gouv.fr", ".europa.eu",
            "europa.eu", "courtlistener.com",
        ],
    },
    HostTable {
        label: "Fact-check registry",
        score: 88,
        source_type: SourceType::FactCheck,
        hosts: &[
            "snopes.com", "politifact.com", "factcheck.org", "fullfact.org", "leadstories.com",
            "checkyourfact.com", "factcheck.afp.com", "healthfeedback.org",
            "climatefeedback.org", "africacheck.org",
        ],
    },
    HostTable {
        label: "Academic publisher",
        score: 85,
        source_type: SourceType::Academic,
        hosts: &[
            ".edu", ".ac.uk", ".ac.jp", "nature.com", "science.org", "sciencedirect.com",
            "springer.com", "wiley.com", "plos.org", "pnas.org", "jstor.org", "openalex.org",
            "doi.org", "semanticscholar.org",
        ],
    },
    HostTable {
        label: "Established news outlet",
        score: 80,
        source_type: SourceType::News,
        hosts: &[
            "reuters.com", "apnews.com", "bbc.com", "bbc.co.uk", "npr.org", "nytimes.com",
            "washingtonpost.com", "theguardian.com", "economist.com", "wsj.com", "ft.com",
            "bloomberg.com", "pbs.org",
        ],
    },
    HostTable {
        label: "Preprint server",
        score: 75,
        source_type: SourceType::Preprint,
        hosts: &["arxiv.org", "biorxiv.org", "medrxiv.org", "ssrn.com", "osf.io"],
    },
];

/// Hosts whose score never exceeds [`UNRELIABLE_CAP`]
static UNRELIABLE_HOSTS: &[&str] = &[
    "infowars.com", "naturalnews.com", "beforeitsnews.com", "worldnewsdailyreport.com",
    "yournewswire.com", "newspunch.com", "theonion.com", "babylonbee.com",
];

/// Sensational wording typical of low-quality sources
static SUSPICIOUS_TERMS: &[&str] = &[
    "exposed", "leaked", "banned", "shocking", "they don't want you to know", "miracle",
    "secret cure", "hoax", "cover-up", "wake up",
];

/// Score a source.
///
/// `as_of` is the reference time for recency; passing the same value
/// makes the result reproducible.
pub fn assess(
    url: &str,
    title: Option<&str>,
    published_at: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
) -> CredibilityAssessment {
    let host = host_of(url);
    let mut factors = Vec::new();
    let mut score = BASE_SCORE;
    let mut source_type = SourceType::General;

    match HOST_TABLES.iter().find(|t| t.hosts.iter().any(|h| host_matches(&host, h))) {
        Some(table) => {
            factors.push(CredibilityFactor {
                label: table.label.to_string(),
                impact: table.score - BASE_SCORE,
            });
            score = table.score;
            source_type = table.source_type;
        }
        None => factors.push(CredibilityFactor {
            label: "Unrecognized domain".to_string(),
            impact: 0,
        }),
    }

    let haystack = format!("{} {}", url, title.unwrap_or_default()).to_lowercase();
    let hits = SUSPICIOUS_TERMS
        .iter()
        .filter(|term| haystack.contains(*term))
        .count() as i32;
    if hits > 0 {
        let penalty = (hits * LEXICAL_PENALTY_EACH).min(MAX_LEXICAL_PENALTY);
        factors.push(CredibilityFactor {
            label: "Sensational wording".to_string(),
            impact: -penalty,
        });
        score -= penalty;
    }

    if let Some(published) = published_at {
        let impact = recency_impact(as_of - published);
        if impact != 0 {
            let label = if impact > 0 { "Recent content" } else { "Dated content" };
            factors.push(CredibilityFactor {
                label: label.to_string(),
                impact,
            });
            score += impact;
        }
    }

    if UNRELIABLE_HOSTS.iter().any(|h| host_matches(&host, h)) && score > UNRELIABLE_CAP {
        factors.push(CredibilityFactor {
            label: "Known unreliable source".to_string(),
            impact: UNRELIABLE_CAP - score,
        });
        score = UNRELIABLE_CAP;
    }

    CredibilityAssessment {
        score: score.clamp(0, 100) as u8,
        source_type,
        factors,
    }
}

/// Recency adjustment for content of the given age
pub fn recency_impact(age: Duration) -> i32 {
    if age < Duration::zero() {
        // Future-dated content earns no bonus
        0
    } else if age <= Duration::days(7) {
        5
    } else if age <= Duration::days(30) {
        3
    } else if age > Duration::days(5 * 365) {
        -10
    } else if age > Duration::days(2 * 365) {
        -5
    } else {
        0
    }
}

/// Lowercased host of a URL, tolerating bare domains
pub fn host_of(url: &str) -> String {
    let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{}", url)));
    parsed
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()))
        .unwrap_or_default()
}

fn host_matches(host: &str, pattern: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    if pattern.starts_with('.') {
        host.ends_with(pattern)
    } else {
        host == pattern || host.ends_with(&format!(".{}", pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_unknown_host_gets_base_score() {
        let a = assess("https://someblog.example/post", None, None, as_of());
        assert_eq!(a.score, 50);
        assert_eq!(a.source_type, SourceType::General);
        assert_eq!(a.factors[0].label, "Unrecognized domain");
    }

    #[test]
    fn test_government_suffix() {
        let a = assess("https://www.cdc.gov/vaccines/index.html", None, None, as_of());
        assert_eq!(a.score, 90);
        assert_eq!(a.source_type, SourceType::Government);
    }

    #[test]
    fn test_subdomain_matches_table() {
        let a = assess("https://en.unesco.org/news", None, None, as_of());
        assert_eq!(a.score, 92);
        // "notreuters.com" must not match "reuters.com"
        let b = assess("https://notreuters.com/story", None, None, as_of());
        assert_eq!(b.score, 50);
    }

    #[test]
    fn test_fact_check_and_preprint() {
        assert_eq!(assess("https://www.snopes.com/fact-check/x/", None, None, as_of()).score, 88);
        let arxiv = assess("https://arxiv.org/abs/2101.00001", None, None, as_of());
        assert_eq!(arxiv.score, 75);
        assert_eq!(arxiv.source_type, SourceType::Preprint);
    }

    #[test]
    fn test_lexical_penalty_is_capped() {
        let a = assess(
            "https://someblog.example/post",
            Some("SHOCKING leaked memo EXPOSED: banned miracle cure"),
            None,
            as_of(),
        );
        assert_eq!(a.score, 20);
        assert!(a.factors.iter().any(|f| f.impact == -30));
    }

    #[test]
    fn test_unreliable_host_is_capped() {
        let a = assess("https://www.infowars.com/story", None, Some(as_of()), as_of());
        assert_eq!(a.score, 25);
        assert!(a.factors.iter().any(|f| f.label == "Known unreliable source"));
    }

    #[test]
    fn test_recency_bonus_and_decay() {
        let fresh = assess(
            "https://www.reuters.com/world/x",
            None,
            Some(as_of() - Duration::days(2)),
            as_of(),
        );
        assert_eq!(fresh.score, 85);

        let stale = assess(
            "https://www.reuters.com/world/x",
            None,
            Some(as_of() - Duration::days(6 * 365)),
            as_of(),
        );
        assert_eq!(stale.score, 70);
    }

    #[test]
    fn test_score_clamped_to_range() {
        let a = assess(
            "https://someblog.example/exposed-leaked-banned-hoax",
            Some("shocking miracle"),
            Some(as_of() - Duration::days(10 * 365)),
            as_of(),
        );
        assert_eq!(a.score, 10);
        let b = assess("not a url at all", None, None, as_of());
        assert!(b.score <= 100);
    }

    #[test]
    fn test_assessment_is_pure() {
        let published = Some(as_of() - Duration::days(40));
        let a = assess("https://www.bbc.co.uk/news/x", Some("Title"), published, as_of());
        let b = assess("https://www.bbc.co.uk/news/x", Some("Title"), published, as_of());
        assert_eq!(a, b);
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://WWW.Example.com/path"), "example.com");
        assert_eq!(host_of("who.int/news"), "who.int");
        assert_eq!(host_of(""), "");
    }
}
