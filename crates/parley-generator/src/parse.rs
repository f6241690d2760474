// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of the model's JSON answer.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Most suggestions a single response may carry.
pub const MAX_SUGGESTIONS: usize = 3;

/// Confidence assigned when the model output could not be decoded.
pub const PARSE_FALLBACK_CONFIDENCE: f64 = 0.5;

const PARSE_FALLBACK_SUGGESTIONS: [&str; 2] = [
    "Thanks for your message!",
    "Let me get back to you on that.",
];

const PARSE_FALLBACK_REASONING: &str = "model output was not valid JSON; using fallback suggestions";

/// Candidate suggestions as produced by the model, before safety filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    /// At most [`MAX_SUGGESTIONS`]. May be empty.
    pub suggestions: Vec<String>,
    /// Clamped into `[0, 1]`.
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub used_fallback: bool,
}

impl ParsedOutput {
    fn fallback() -> Self {
        Self {
            suggestions: PARSE_FALLBACK_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence: PARSE_FALLBACK_CONFIDENCE,
            reasoning: Some(PARSE_FALLBACK_REASONING.to_string()),
            used_fallback: true,
        }
    }
}

#[derive(Deserialize)]
struct RawOutput {
    #[serde(default)]
    suggestions: Vec<Value>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// The outermost `{ ... }` span, so prose or code fences around the object are ignored.
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decodes model output. Never fails: undecodable text yields the two-option fallback.
///
/// Non-string suggestion entries are skipped. A missing confidence reads as 0.5.
pub fn parse_model_output(text: &str) -> ParsedOutput {
    let raw = match json_object_span(text).map(serde_json::from_str::<RawOutput>) {
        Some(Ok(raw)) => raw,
        Some(Err(e)) => {
            warn!(error = %e, "model output is not the expected JSON, using fallback");
            return ParsedOutput::fallback();
        }
        None => {
            warn!(len = text.len(), "model output has no JSON object, using fallback");
            return ParsedOutput::fallback();
        }
    };

    let suggestions = raw
        .suggestions
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect();

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(PARSE_FALLBACK_CONFIDENCE)
        .clamp(0.0, 1.0);

    ParsedOutput {
        suggestions,
        confidence,
        reasoning: raw.reasoning.filter(|r| !r.trim().is_empty()),
        used_fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_output() {
        let parsed = parse_model_output(
            r#"{"suggestions":["Sure!","Can't today."],"confidence":0.8,"reasoning":"invite"}"#,
        );
        assert_eq!(parsed.suggestions, vec!["Sure!", "Can't today."]);
        assert_eq!(parsed.confidence, 0.8);
        assert_eq!(parsed.reasoning.as_deref(), Some("invite"));
        assert!(!parsed.used_fallback);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(
            parse_model_output(r#"{"suggestions":["a b"],"confidence":1.7}"#).confidence,
            1.0
        );
        assert_eq!(
            parse_model_output(r#"{"suggestions":["a b"],"confidence":-2}"#).confidence,
            0.0
        );
    }

    #[test]
    fn fenced_json_is_accepted() {
        let parsed = parse_model_output(
            "Here you go:\n```json\n{\"suggestions\":[\"Yes\"],\"confidence\":0.6}\n```",
        );
        assert_eq!(parsed.suggestions, vec!["Yes"]);
        assert!(!parsed.used_fallback);
    }

    #[test]
    fn malformed_output_falls_back_to_two_options() {
        for text in ["not json at all", "{\"suggestions\": [", "{\"suggestions\": 7}"] {
            let parsed = parse_model_output(text);
            assert!(parsed.used_fallback, "{text}");
            assert_eq!(parsed.suggestions.len(), 2);
            assert_eq!(parsed.confidence, 0.5);
            assert!(parsed.reasoning.unwrap().contains("fallback"));
        }
    }

    #[test]
    fn extra_suggestions_and_non_strings_are_dropped() {
        let parsed =
            parse_model_output(r#"{"suggestions":["a1", 3, "b2", "", "c3", "d4"],"confidence":0.9}"#);
        assert_eq!(parsed.suggestions, vec!["a1", "b2", "c3"]);
    }

    #[test]
    fn empty_suggestion_list_is_kept_empty() {
        let parsed = parse_model_output(r#"{"suggestions":[],"confidence":0.9}"#);
        assert!(parsed.suggestions.is_empty());
        assert!(!parsed.used_fallback);
    }
}
