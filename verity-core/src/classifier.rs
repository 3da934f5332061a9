//! Domain classification of free-text claims
//!
//! A fixed, ordered table of domain patterns is scored against the text:
//!
//! ```text
//! score = (keyword hits + 2 * regex hits) * weight
//! confidence = min(score / 10, 1.0)
//! ```
//!
//! The highest score wins; ties go to the pattern listed first. Text that
//! matches nothing falls back to the `general` domain. Classification is
//! pure: no I/O, no clock, no randomness.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::{DomainContext, ProviderId, SourceType};

/// Domain used when no pattern scores above zero
pub const GENERAL_DOMAIN: &str = "general";

/// Confidence reported for the general fallback
pub const GENERAL_CONFIDENCE: f64 = 0.5;

/// Providers suggested for the general domain
pub const GENERAL_PROVIDERS: &[ProviderId] =
    &[ProviderId::Wikipedia, ProviderId::Brave, ProviderId::Gdelt];

const GENERAL_PREFERRED: &[SourceType] = &[SourceType::FactCheck, SourceType::News];

/// One row of the classification table
#[derive(Debug)]
pub struct DomainPattern {
    pub domain: &'static str,
    /// Whole-word keywords, lowercase
    pub keywords: &'static [&'static str],
    /// Case-insensitive regular expressions
    pub regexes: &'static [&'static str],
    pub weight: f64,
    pub providers: &'static [ProviderId],
    /// Source types the ranker favours on credibility ties
    pub preferred_types: &'static [SourceType],
}

/// The built-in classification table, in tie-breaking order
pub static DOMAIN_PATTERNS: &[DomainPattern] = &[
    DomainPattern {
        domain: "biomedical",
        keywords: &[
            "vaccine", "vaccines", "virus", "viruses", "cancer", "drug", "drugs", "disease",
            "diseases", "covid", "treatment", "clinical", "medicine", "medical", "health",
            "symptom", "symptoms", "infection", "vitamin", "autism", "diabetes", "doctor",
            "doctors", "patients", "hospital", "pandemic", "antibiotic", "antibiotics", "cure",
        ],
        regexes: &[
            r"\b(fda|cdc|nih)\b",
            r"\bclinical trials?\b",
            r"\b\w{3,}(itis|emia|carcinoma|lymphoma|melanoma)\b",
            r"\bcovid-?19\b",
        ],
        weight: 1.2,
        providers: &[ProviderId::PubMed, ProviderId::ClinicalTrials, ProviderId::OpenAlex],
        preferred_types: &[SourceType::Medical, SourceType::ClinicalTrial, SourceType::Academic],
    },
    DomainPattern {
        domain: "legal",
        keywords: &[
            "law", "laws", "court", "courts", "supreme", "ruling", "lawsuit", "constitution",
            "constitutional", "unconstitutional", "statute", "judge", "legal", "illegal",
            "amendment", "sued", "attorney", "prosecutor",
        ],
        regexes: &[
            r"\b[a-z]+ v\.? [a-z]+\b",
            r"\bsection \d+",
            r"\b(first|second|fourth|fifth|fourteenth) amendment\b",
        ],
        weight: 1.1,
        providers: &[ProviderId::CourtListener, ProviderId::Wikipedia],
        preferred_types: &[SourceType::Government, SourceType::Academic, SourceType::News],
    },
    DomainPattern {
        domain: "economic",
        keywords: &[
            "gdp", "inflation", "unemployment", "economy", "economic", "tax", "taxes", "debt",
            "deficit", "trade", "tariff", "tariffs", "wage", "wages", "recession", "poverty",
            "jobs", "income", "stock", "market",
        ],
        regexes: &[
            r"\binterest rates?\b",
            r"\b\d+(\.\d+)?\s?(%|percent)",
            r"\$\s?\d",
            r"\b(billion|trillion)\b",
        ],
        weight: 1.0,
        providers: &[ProviderId::WorldBank, ProviderId::Gdelt],
        preferred_types: &[SourceType::Economic, SourceType::Government, SourceType::News],
    },
    DomainPattern {
        domain: "environmental",
        keywords: &[
            "climate", "emission", "emissions", "carbon", "temperature", "temperatures",
            "warming", "wildfire", "wildfires", "hurricane", "hurricanes", "earthquake",
            "earthquakes", "flood", "flooding", "pollution", "drought", "glacier", "glaciers",
            "volcano", "renewable",
        ],
        regexes: &[
            r"\bco2\b",
            r"\bglobal warming\b",
            r"\bsea levels?\b",
            r"\bgreenhouse gas(es)?\b",
        ],
        weight: 1.1,
        providers: &[ProviderId::Eonet, ProviderId::OpenAlex],
        preferred_types: &[
            SourceType::Environmental,
            SourceType::Academic,
            SourceType::Government,
        ],
    },
    DomainPattern {
        domain: "biodiversity",
        keywords: &[
            "species", "extinct", "extinction", "wildlife", "habitat", "endangered", "animal",
            "animals", "plants", "biodiversity", "bees", "insects", "birds", "fish", "whales",
            "coral", "ecosystem",
        ],
        regexes: &[r"\b(endangered|threatened|invasive) species\b", r"\bred list\b"],
        weight: 1.0,
        providers: &[ProviderId::Gbif, ProviderId::OpenAlex],
        preferred_types: &[SourceType::Biodiversity, SourceType::Academic],
    },
    DomainPattern {
        domain: "academic",
        keywords: &[
            "study", "studies", "research", "researchers", "scientists", "scientific", "paper",
            "journal", "university", "peer-reviewed", "physics", "quantum", "theory",
            "experiment", "evidence",
        ],
        regexes: &[r"\bet al\b", r"\bdoi:?\s*10\.\d+", r"\barxiv\b"],
        weight: 0.9,
        providers: &[ProviderId::OpenAlex, ProviderId::Arxiv],
        preferred_types: &[SourceType::Academic, SourceType::Preprint],
    },
    DomainPattern {
        domain: "political",
        keywords: &[
            "election", "elections", "president", "senator", "senate", "government", "vote",
            "votes", "voting", "voters", "congress", "minister", "parliament", "campaign",
            "policy", "war", "military", "immigration", "governor", "mayor",
        ],
        regexes: &[r"\b(democrat|republican)s?\b", r"\b(prime minister|white house)\b"],
        weight: 1.0,
        providers: &[ProviderId::Gdelt, ProviderId::Wikipedia, ProviderId::Brave],
        preferred_types: &[SourceType::News, SourceType::FactCheck, SourceType::Government],
    },
];

/// A pattern with its regexes compiled
struct CompiledPattern {
    pattern: &'static DomainPattern,
    regexes: Vec<Regex>,
}

fn compile(patterns: &'static [DomainPattern]) -> Vec<CompiledPattern> {
    patterns
        .iter()
        .map(|pattern| CompiledPattern {
            pattern,
            regexes: pattern
                .regexes
                .iter()
                .filter_map(|r| Regex::new(&format!("(?i){}", r)).ok())
                .collect(),
        })
        .collect()
}

static DEFAULT_CLASSIFIER: LazyLock<DomainClassifier> =
    LazyLock::new(|| DomainClassifier::new(DOMAIN_PATTERNS));

/// Classifier over a fixed pattern table
pub struct DomainClassifier {
    patterns: Vec<CompiledPattern>,
}

impl DomainClassifier {
    pub fn new(patterns: &'static [DomainPattern]) -> Self {
        Self {
            patterns: compile(patterns),
        }
    }

    /// Classify text against this classifier's table
    pub fn classify(&self, text: &str) -> DomainContext {
        let words = word_view(text);
        let mut best: Option<(f64, &CompiledPattern, Vec<String>)> = None;

        for compiled in &self.patterns {
            let mut matched = Vec::new();

            let keyword_hits = compiled
                .pattern
                .keywords
                .iter()
                .filter(|kw| words.contains(&format!(" {} ", kw)))
                .inspect(|kw| matched.push(kw.to_string()))
                .count();

            let regex_hits = compiled
                .regexes
                .iter()
                .filter_map(|re| re.find(text))
                .inspect(|m| matched.push(m.as_str().to_lowercase()))
                .count();

            let score = (keyword_hits + 2 * regex_hits) as f64 * compiled.pattern.weight;
            trace!(domain = compiled.pattern.domain, score, "domain score");

            // Strict comparison keeps the first-listed pattern on ties
            if score > 0.0 && best.as_ref().map_or(true, |(top, _, _)| score > *top) {
                best = Some((score, compiled, matched));
            }
        }

        match best {
            Some((score, compiled, matched)) => DomainContext {
                domain: compiled.pattern.domain.to_string(),
                confidence: (score / 10.0).min(1.0),
                matched_keywords: matched,
                suggested_providers: compiled.pattern.providers.to_vec(),
                fallback: false,
            },
            None => general_context(),
        }
    }
}

/// Classify text against the built-in table
pub fn classify(text: &str) -> DomainContext {
    DEFAULT_CLASSIFIER.classify(text)
}

/// The context used when nothing matches
pub fn general_context() -> DomainContext {
    DomainContext {
        domain: GENERAL_DOMAIN.to_string(),
        confidence: GENERAL_CONFIDENCE,
        matched_keywords: Vec::new(),
        suggested_providers: GENERAL_PROVIDERS.to_vec(),
        fallback: true,
    }
}

/// Source types a domain prefers, used by the ranker to break credibility ties
pub fn preferred_source_types(domain: &str) -> &'static [SourceType] {
    DOMAIN_PATTERNS
        .iter()
        .find(|p| p.domain == domain)
        .map(|p| p.preferred_types)
        .unwrap_or(GENERAL_PREFERRED)
}

/// Lowercased words separated and padded by single spaces.
///
/// Hyphens survive so that keywords like `peer-reviewed` can match.
fn word_view(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(" {} ", joined)
}
