//! Extraction of a structured evaluation from raw model output.
//!
//! Models wrap JSON in markdown fences or surround it with prose, so the
//! extraction is an ordered list of pure strategies tried in sequence:
//! direct parse, fenced ```json block, then the substring between the first
//! `{` and the last `}`. Each strategy is independently testable.

use super::models::EvaluationReport;
use lazy_static::lazy_static;
use regex::Regex;

type ParseStrategy = fn(&str) -> Option<EvaluationReport>;

/// The strategies in the order they are attempted, with the label reported
/// in diagnostics when one of them wins.
pub const PARSE_STRATEGIES: &[(&str, ParseStrategy)] = &[
    ("direct", parse_direct),
    ("fenced-json-block", parse_fenced_block),
    ("brace-slice", parse_brace_slice),
];

/// Tries each strategy in order and returns the first hit, together with
/// the label of the strategy that produced it.
pub fn parse_evaluation(text: &str) -> Option<(&'static str, EvaluationReport)> {
    PARSE_STRATEGIES
        .iter()
        .find_map(|(label, strategy)| strategy(text).map(|report| (*label, report)))
}

fn parse_direct(text: &str) -> Option<EvaluationReport> {
    serde_json::from_str(text.trim()).ok()
}

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("invalid fenced-json regex");
}

fn parse_fenced_block(text: &str) -> Option<EvaluationReport> {
    let captured = FENCED_JSON.captures(text)?.get(1)?;
    serde_json::from_str(captured.as_str()).ok()
}

fn parse_brace_slice(text: &str) -> Option<EvaluationReport> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
