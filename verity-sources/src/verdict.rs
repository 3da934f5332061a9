//! Verdict extraction from engine text
//!
//! Engines are asked for a JSON object `{verdict, confidence, summary}`.
//! Models do not always comply, so parsing falls back to `VERDICT:` and
//! `CONFIDENCE:` lines. Free-form rating wording ("Mostly False",
//! "Pants on Fire", "Misleading") is normalized onto the four labels.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use verity_core::VerdictLabel;

static VERDICT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*#>-]*(?:verdict|rating|label)\s*\**\s*[:=]\s*\**\s*([^\n*]+)").unwrap()
});

static CONFIDENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*#>-]*confidence\s*\**\s*[:=]\s*\**\s*([0-9]+(?:\.[0-9]+)?)\s*(%?)").unwrap()
});

static SUMMARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ims)^[\s*#>-]*(?:summary|explanation|reasoning)\s*\**\s*[:=]\s*\**\s*(.+)").unwrap()
});

/// A verdict recovered from engine output
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub label: VerdictLabel,
    /// The engine's own wording
    pub raw_label: String,
    pub confidence: Option<f64>,
    pub summary: String,
}

/// Map rating wording onto a label.
///
/// Mixed wording is checked before false wording, and false before true,
/// so "half true" is Mixed and "not true" is False.
pub fn normalize_label(raw: &str) -> VerdictLabel {
    if let Some(label) = VerdictLabel::parse(raw) {
        return label;
    }

    let lower = raw.trim().to_lowercase();
    const MIXED: &[&str] = &[
        "mixed", "mixture", "half", "partly", "partially", "partial", "misleading",
        "missing context", "lacks context", "exaggerat", "cherry", "distort", "out of context",
        "disputed",
    ];
    const FALSE: &[&str] = &[
        "false", "fake", "pants on fire", "incorrect", "not true", "untrue", "inaccurate",
        "wrong", "baseless", "fabricated", "debunked", "no evidence", "unsupported", "hoax",
        "myth", "scam",
    ];
    const TRUE: &[&str] = &["true", "correct", "accurate", "verified", "confirmed", "supported"];

    if MIXED.iter().any(|w| lower.contains(w)) {
        VerdictLabel::Mixed
    } else if FALSE.iter().any(|w| lower.contains(w)) {
        VerdictLabel::False
    } else if TRUE.iter().any(|w| lower.contains(w)) {
        VerdictLabel::True
    } else {
        VerdictLabel::Unclear
    }
}

/// Parse a confidence written as `0.8`, `80` or `80%`
pub fn parse_confidence(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (number, percent) = match trimmed.strip_suffix('%') {
        Some(n) => (n.trim(), true),
        None => (trimmed, false),
    };
    scale_confidence(number.parse().ok()?, percent)
}

fn scale_confidence(value: f64, percent: bool) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = if percent || value > 1.0 { value / 100.0 } else { value };
    Some(scaled.clamp(0.0, 1.0))
}

/// Recover a verdict from engine text, or `None` if no label can be found
pub fn parse_verdict(text: &str) -> Option<ParsedVerdict> {
    parse_json_verdict(text).or_else(|| parse_line_verdict(text))
}

fn parse_json_verdict(text: &str) -> Option<ParsedVerdict> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;

    let raw_label = ["verdict", "label", "rating"]
        .iter()
        .find_map(|key| value[*key].as_str())?
        .trim()
        .to_string();

    let confidence = match &value["confidence"] {
        Value::Number(n) => n.as_f64().and_then(|v| scale_confidence(v, false)),
        Value::String(s) => parse_confidence(s),
        _ => None,
    };

    let summary = ["summary", "explanation", "reasoning"]
        .iter()
        .find_map(|key| value[*key].as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    Some(ParsedVerdict {
        label: normalize_label(&raw_label),
        raw_label,
        confidence,
        summary,
    })
}

fn parse_line_verdict(text: &str) -> Option<ParsedVerdict> {
    let raw_label = VERDICT_LINE
        .captures(text)
        .map(|c| c[1].trim().trim_end_matches('.').to_string())
        .filter(|l| !l.is_empty())?;

    let confidence = CONFIDENCE_LINE
        .captures(text)
        .and_then(|c| parse_confidence(&format!("{}{}", &c[1], &c[2])));

    let summary = match SUMMARY_LINE.captures(text) {
        Some(c) => c[1].trim().to_string(),
        None => text
            .lines()
            .filter(|l| !VERDICT_LINE.is_match(l) && !CONFIDENCE_LINE.is_match(l))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
    };

    Some(ParsedVerdict {
        label: normalize_label(&raw_label),
        raw_label,
        confidence,
        summary,
    })
}
