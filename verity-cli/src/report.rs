//! Markdown rendering of a fact-check result

use std::fmt::Write;

use verity_core::{ConsolidatedResult, EvidenceItem, TerminalState};

/// Evidence items listed in the report
const MAX_LISTED: usize = 15;

pub fn render_markdown(result: &ConsolidatedResult) -> String {
    let mut out = String::new();
    let verdict = &result.verdict;

    let _ = writeln!(out, "# Fact check: {}\n", result.query);
    let _ = writeln!(
        out,
        "**Verdict:** {} ({:.0}% confidence{})\n",
        verdict.label,
        verdict.confidence * 100.0,
        if verdict.engine_agreement { ", engines agree" } else { "" }
    );
    let _ = writeln!(out, "{}\n", verdict.summary);

    if !result.engine_verdicts.is_empty() {
        let _ = writeln!(out, "## Engines\n");
        for engine in &result.engine_verdicts {
            let _ = writeln!(
                out,
                "- **{}**: {} ({:.0}%){}",
                engine.engine_id,
                engine.raw_label,
                engine.confidence * 100.0,
                if engine.grounded { "" } else { " - model knowledge only" }
            );
        }
        out.push('\n');
    }

    if !result.evidence.is_empty() {
        let _ = writeln!(out, "## Evidence\n");
        for item in result.evidence.iter().take(MAX_LISTED) {
            let _ = writeln!(out, "{}", evidence_line(item));
            if let Some(snippet) = &item.snippet {
                let _ = writeln!(out, "   > {}", snippet);
            }
        }
        if result.evidence.len() > MAX_LISTED {
            let _ = writeln!(out, "\n_{} more not shown._", result.evidence.len() - MAX_LISTED);
        }
        out.push('\n');
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out, "## Unavailable\n");
        for (id, kind) in &result.errors {
            let _ = writeln!(out, "- `{}`: {}", id, kind);
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "---\nDomain: {} ({:.0}%) | {} ms{}{}",
        result.domain_context.domain,
        result.domain_context.confidence * 100.0,
        result.timing_ms,
        if result.cached { " | cached" } else { "" },
        if result.state == TerminalState::Failed { " | failed" } else { "" },
    );
    out.push('\n');
    out
}

fn evidence_line(item: &EvidenceItem) -> String {
    let mut line = format!("{}. [{}]({})", item.rank, item.title, item.url);
    if !item.publisher.is_empty() {
        let _ = write!(line, " - {}", item.publisher);
    }
    let _ = write!(line, " ({}, {}/100", item.source_type, item.credibility_score);
    if let Some(date) = item.published_at {
        let _ = write!(line, ", {}", date.format("%Y-%m-%d"));
    }
    line.push(')');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use verity_core::{
        general_context, EngineId, EngineVerdict, ErrorKind, ProviderId, Verdict, VerdictLabel,
    };

    #[test]
    fn test_render_degraded_result() {
        let mut item = EvidenceItem::new(ProviderId::Wikipedia, "https://en.wikipedia.org/wiki/X", "X")
            .with_publisher("Wikipedia")
            .with_credibility(65)
            .with_snippet(Some("An article.".to_string()));
        item.rank = 1;

        let mut errors = BTreeMap::new();
        errors.insert("brave".to_string(), ErrorKind::ProviderHttpError { status: 429 });

        let result = ConsolidatedResult {
            query: "Is X true?".to_string(),
            fingerprint: "f".to_string(),
            verdict: Verdict {
                label: VerdictLabel::False,
                confidence: 0.72,
                summary: "Not supported.".to_string(),
                engine_agreement: false,
            },
            evidence: vec![item],
            engine_verdicts: vec![EngineVerdict::new(EngineId::DirectKnowledge, VerdictLabel::False, 0.5, "s")
                .ungrounded()],
            domain_context: general_context(),
            timing_ms: 1200,
            errors,
            state: TerminalState::Done,
            cached: true,
        };

        let report = render_markdown(&result);
        assert!(report.starts_with("# Fact check: Is X true?"));
        assert!(report.contains("**Verdict:** False (72% confidence)"));
        assert!(report.contains("- **direct_knowledge**: False (50%) - model knowledge only"));
        assert!(report.contains("1. [X](https://en.wikipedia.org/wiki/X) - Wikipedia (general, 65/100)"));
        assert!(report.contains("   > An article."));
        assert!(report.contains("- `brave`: HTTP 429"));
        assert!(report.contains("| cached"));
    }
}
