//! Verdict consolidation across reasoning engines
//!
//! - no verdicts: `Unclear` at a fixed low confidence
//! - one verdict: passed through with a single-source discount
//! - agreeing verdicts: the shared label, averaged confidence plus a bonus
//! - disagreeing verdicts: `Mixed`, with every engine's label in the summary

use crate::{EngineVerdict, Verdict, VerdictLabel};

/// Confidence when no engine produced a verdict
pub const NO_VERDICT_CONFIDENCE: f64 = 0.3;

/// Discount applied to a verdict that no second engine corroborates
pub const SINGLE_SOURCE_PENALTY: f64 = 0.1;

/// Lowest confidence a lone verdict is discounted to
pub const SINGLE_SOURCE_FLOOR: f64 = 0.4;

/// Added to the mean confidence when every engine agrees
pub const AGREEMENT_BONUS: f64 = 0.05;

/// Highest confidence consolidation ever reports
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Fixed confidence reported for disagreement
pub const DISAGREEMENT_CONFIDENCE: f64 = 0.6;

/// Merge engine verdicts into one final verdict
pub fn consolidate(verdicts: &[EngineVerdict]) -> Verdict {
    match verdicts {
        [] => Verdict {
            label: VerdictLabel::Unclear,
            confidence: NO_VERDICT_CONFIDENCE,
            summary: "No reasoning engine succeeded; the claim could not be assessed.".to_string(),
            engine_agreement: false,
        },
        [single] => {
            let discounted = single.confidence - SINGLE_SOURCE_PENALTY;
            Verdict {
                label: single.label,
                // The floor never lifts a verdict above its own confidence
                confidence: discounted.max(SINGLE_SOURCE_FLOOR.min(single.confidence)),
                summary: single.summary.clone(),
                engine_agreement: false,
            }
        }
        [first, rest @ ..] => {
            if rest.iter().all(|v| v.label == first.label) {
                let mean =
                    verdicts.iter().map(|v| v.confidence).sum::<f64>() / verdicts.len() as f64;
                Verdict {
                    label: first.label,
                    confidence: (mean + AGREEMENT_BONUS).min(MAX_CONFIDENCE),
                    summary: agreement_summary(verdicts),
                    engine_agreement: true,
                }
            } else {
                Verdict {
                    label: VerdictLabel::Mixed,
                    confidence: DISAGREEMENT_CONFIDENCE,
                    summary: disagreement_summary(verdicts),
                    engine_agreement: false,
                }
            }
        }
    }
}

fn agreement_summary(verdicts: &[EngineVerdict]) -> String {
    let engines: Vec<&str> = verdicts.iter().map(|v| v.engine_id.as_str()).collect();
    let lead = verdicts
        .iter()
        .find(|v| v.grounded && !v.summary.is_empty())
        .or_else(|| verdicts.first())
        .map(|v| v.summary.as_str())
        .unwrap_or_default();
    format!("{} engines agree ({}). {}", verdicts.len(), engines.join(", "), lead)
        .trim_end()
        .to_string()
}

fn disagreement_summary(verdicts: &[EngineVerdict]) -> String {
    let positions: Vec<String> = verdicts
        .iter()
        .map(|v| format!("{} says {} ({:.0}%)", v.engine_id, v.label, v.confidence * 100.0))
        .collect();
    format!("Engines disagree: {}.", positions.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineId;

    fn verdict(engine: EngineId, label: VerdictLabel, confidence: f64) -> EngineVerdict {
        EngineVerdict::new(engine, label, confidence, "summary")
    }

    #[test]
    fn test_no_verdicts() {
        let v = consolidate(&[]);
        assert_eq!(v.label, VerdictLabel::Unclear);
        assert_eq!(v.confidence, NO_VERDICT_CONFIDENCE);
        assert!(v.summary.contains("No reasoning engine succeeded"));
        assert!(!v.engine_agreement);
    }

    #[test]
    fn test_single_verdict_discounted() {
        let v = consolidate(&[verdict(EngineId::WebReasoning, VerdictLabel::True, 0.9)]);
        assert_eq!(v.label, VerdictLabel::True);
        assert!(v.confidence <= 0.8 + 1e-9);
        assert!(v.confidence >= 0.4);
    }

    #[test]
    fn test_single_verdict_floor() {
        let v = consolidate(&[verdict(EngineId::WebReasoning, VerdictLabel::False, 0.45)]);
        assert_eq!(v.confidence, SINGLE_SOURCE_FLOOR);
    }

    #[test]
    fn test_floor_does_not_raise_weak_verdicts() {
        let v = consolidate(&[verdict(EngineId::DirectKnowledge, VerdictLabel::False, 0.3)]);
        assert_eq!(v.confidence, 0.3);
    }

    #[test]
    fn test_agreement() {
        let v = consolidate(&[
            verdict(EngineId::WebReasoning, VerdictLabel::True, 0.8),
            verdict(EngineId::CrossCheck, VerdictLabel::True, 0.9),
        ]);
        assert_eq!(v.label, VerdictLabel::True);
        assert!(v.engine_agreement);
        assert!(v.confidence >= 0.85);
        assert!(v.confidence <= MAX_CONFIDENCE);
    }

    #[test]
    fn test_agreement_is_capped() {
        let v = consolidate(&[
            verdict(EngineId::WebReasoning, VerdictLabel::False, 0.99),
            verdict(EngineId::CrossCheck, VerdictLabel::False, 0.98),
        ]);
        assert_eq!(v.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_disagreement_is_mixed_and_auditable() {
        let v = consolidate(&[
            verdict(EngineId::WebReasoning, VerdictLabel::True, 0.8),
            verdict(EngineId::CrossCheck, VerdictLabel::False, 0.7),
        ]);
        assert_eq!(v.label, VerdictLabel::Mixed);
        assert!(!v.engine_agreement);
        assert_eq!(v.confidence, 0.6);
        assert!(v.summary.contains("web_reasoning says True"));
        assert!(v.summary.contains("cross_check says False"));
    }

    #[test]
    fn test_mixed_vs_false_is_disagreement() {
        // Labels are compared after normalization; raw wording plays no part
        let a = verdict(EngineId::WebReasoning, VerdictLabel::Mixed, 0.7).with_raw_label("Mixed");
        let b = verdict(EngineId::FactCheckRegistry, VerdictLabel::False, 0.7)
            .with_raw_label("Misleading");
        assert_eq!(consolidate(&[a, b]).label, VerdictLabel::Mixed);
    }
}
