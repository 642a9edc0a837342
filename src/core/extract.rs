//! Response extraction and validation
//!
//! Coerces the oracle's semi-structured reply into a `CandidateAssessment`:
//! unwrap an optional code fence, parse JSON, repair a missing
//! `reasoning_steps` list from the surrounding text, then enforce the
//! clinical schema bounds. Only `reasoning_steps` gets bespoke recovery -
//! the oracle reliably emits the numeric fields inside valid JSON but
//! sometimes drops or malforms that one list.

use crate::models::CandidateAssessment;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use validator::Validate;

/// Errors raised when the oracle reply cannot be coerced into an assessment
///
/// The engine handles both variants identically; the split matters only for
/// logs.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no parseable JSON object in oracle reply: {0}")]
    NoJson(#[from] serde_json::Error),

    #[error("assessment violates schema bounds: {0}")]
    SchemaViolation(String),
}

/// Substituted when no numbered list can be recovered from the raw text
pub const REASONING_SENTINEL: &str = "Unable to extract structured reasoning from response";

/// Fenced JSON block, optionally language-tagged (```json, ```JSON, ...)
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:[a-z]+)?\s*(\{.*?\})\s*```").unwrap());

/// Numbered-list markers tried in priority order: "1. ", "Step 1: ", "1) "
///
/// "Step" is matched case-sensitively; each step's text runs from its marker
/// to the next marker of the same kind or end of input.
static STEP_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?m)^\s*\d+\.\s+").unwrap(),
        Regex::new(r"(?m)^\s*Step\s+\d+:\s+").unwrap(),
        Regex::new(r"(?m)^\s*\d+\)\s+").unwrap(),
    ]
});

/// Extract a numbered list from free text
///
/// The first marker pattern that yields any match wins. Returns the sentinel
/// list instead of failing when nothing matches, so `reasoning_steps` is
/// always populated for the schema check.
pub fn extract_numbered_steps(text: &str) -> Vec<String> {
    for marker in STEP_MARKERS.iter() {
        let hits: Vec<_> = marker.find_iter(text).collect();
        if hits.is_empty() {
            continue;
        }

        let mut steps = Vec::with_capacity(hits.len());
        for (i, hit) in hits.iter().enumerate() {
            let end = hits.get(i + 1).map_or(text.len(), |next| next.start());
            let step = text[hit.end()..end].trim();
            if !step.is_empty() {
                steps.push(step.to_string());
            }
        }

        if !steps.is_empty() {
            return steps;
        }
    }

    vec![REASONING_SENTINEL.to_string()]
}

/// Coerce raw oracle output into a validated `CandidateAssessment`
pub fn validate(raw_text: &str) -> Result<CandidateAssessment, ExtractionError> {
    // Prefer the body of a fenced code block when one is present
    let json_source = FENCED_JSON
        .captures(raw_text)
        .and_then(|captures| captures.get(1))
        .map_or(raw_text, |m| m.as_str());

    let mut parsed: serde_json::Value = serde_json::from_str(json_source.trim())?;

    let steps_missing = parsed
        .get("reasoning_steps")
        .and_then(|v| v.as_array())
        .map_or(true, |steps| steps.is_empty());

    if steps_missing {
        tracing::warn!("reasoning_steps missing from oracle JSON, recovering from raw text");
        let steps = extract_numbered_steps(raw_text);
        tracing::debug!("Recovered {} reasoning steps via regex", steps.len());
        if let Some(object) = parsed.as_object_mut() {
            object.insert("reasoning_steps".to_string(), serde_json::json!(steps));
        }
    }

    let assessment: CandidateAssessment = serde_json::from_value(parsed)
        .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;

    assessment
        .validate()
        .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;

    Ok(assessment)
}
