//! Best-effort citation enrichment
//!
//! Reasoning engines answer in prose sprinkled with numeric markers such as
//! `[1]`, `[2, 3]` or `[4-6]`, and sometimes with bare URLs. These helpers
//! recover which sources were actually cited. They are heuristics and sit
//! outside ranking and consolidation.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CITATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,3}(?:\s*[,\-–]\s*\d{1,3})*)\]").unwrap()
});

/// A marker with the whitespace before it, so "false [1]." becomes "false."
static SPACED_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\[\d{1,3}(?:\s*[,\-–]\s*\d{1,3})*\]").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'\)\]]+"#).unwrap()
});

/// Largest range expansion accepted for markers like `[1-200]`
const MAX_RANGE: usize = 20;

/// Citation numbers in order of first appearance, without repeats
pub fn citation_numbers(text: &str) -> Vec<usize> {
    let mut numbers = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();

    for cap in CITATION_REGEX.captures_iter(text) {
        for part in cap[1].split(',') {
            for n in expand_part(part) {
                if n > 0 && seen.insert(n) {
                    numbers.push(n);
                }
            }
        }
    }

    numbers
}

fn expand_part(part: &str) -> Vec<usize> {
    let bounds: Vec<usize> = part
        .split(['-', '–'])
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    match bounds.as_slice() {
        [single] => vec![*single],
        [start, end] if start <= end && end - start < MAX_RANGE => (*start..=*end).collect(),
        _ => Vec::new(),
    }
}

/// URLs appearing in free text, trailing punctuation trimmed, first-seen order
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for m in URL_REGEX.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        if seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    }

    urls
}

/// Resolve the markers in `text` against a 1-based citation list.
///
/// Markers pointing past the end of the list are ignored. When the text
/// has no markers at all, every citation is returned in list order.
pub fn cited_sources<'a>(text: &str, citations: &'a [String]) -> Vec<&'a str> {
    let numbers = citation_numbers(text);
    if numbers.is_empty() {
        return citations.iter().map(String::as_str).collect();
    }

    numbers
        .into_iter()
        .filter_map(|n| citations.get(n - 1))
        .map(String::as_str)
        .collect()
}

/// Remove citation markers from prose
pub fn strip_markers(text: &str) -> String {
    let stripped = SPACED_MARKER_REGEX.replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
