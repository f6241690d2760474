// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use parley_core::types::ConversationContext;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::remediate::{cleanup, expand_short, make_professional, truncate_to_first_sentence};
use crate::rules::{IssueCategory, SafetyIssue, Severity, check_suggestion};

/// Relationship words that mark a contact as professional.
const PROFESSIONAL_KEYWORDS: &[&str] = &[
    "colleague",
    "coworker",
    "co-worker",
    "boss",
    "manager",
    "supervisor",
    "client",
    "customer",
    "employee",
    "employer",
    "business",
    "vendor",
    "recruiter",
    "work",
];

const PROFESSIONAL_FALLBACKS: &[&str] = &[
    "Thanks for your message, I'll get back to you shortly.",
    "Noted, I'll follow up soon.",
    "Thank you, let me look into this and reply shortly.",
];

const CASUAL_FALLBACKS: &[&str] = &[
    "Sounds good!",
    "Thanks for letting me know!",
    "Got it, talk soon!",
];

/// Confidence multiplier when any issue was found.
pub const CONFIDENCE_DISCOUNT: f64 = 0.7;
/// Lower bound on discounted confidence, and the confidence of a fallback.
pub const CONFIDENCE_FLOOR: f64 = 0.3;

/// Outcome of filtering one candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredResult {
    /// Remediated suggestions in input order, deduplicated. Never empty.
    pub suggestions: Vec<String>,
    /// Input confidence clamped to `[0, 1]`, discounted by
    /// [`CONFIDENCE_DISCOUNT`] when anything was flagged.
    pub confidence: f64,
    /// Every issue found, including those on dropped suggestions.
    pub issues: Vec<SafetyIssue>,
    /// Set when nothing survived and a canned reply was substituted.
    pub used_fallback: bool,
}

impl FilteredResult {
    /// True when at least one rule matched.
    pub fn had_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// True when the relationship string contains a professional keyword.
pub fn is_professional_relationship(relationship: &str) -> bool {
    relationship
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|word| PROFESSIONAL_KEYWORDS.contains(&word))
}

/// Stateless safety filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyFilter;

impl SafetyFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_and_filter(
        &self,
        suggestions: &[String],
        confidence: f64,
        context: &ConversationContext,
    ) -> FilteredResult {
        self.validate_and_filter_with_rng(suggestions, confidence, context, &mut rand::thread_rng())
    }

    /// As [`Self::validate_and_filter`], drawing any fallback from `rng`.
    pub fn validate_and_filter_with_rng<R: Rng + ?Sized>(
        &self,
        suggestions: &[String],
        confidence: f64,
        context: &ConversationContext,
        rng: &mut R,
    ) -> FilteredResult {
        let professional = context
            .contact
            .as_ref()
            .and_then(|c| c.effective_relationship())
            .is_some_and(is_professional_relationship);

        let mut kept: Vec<String> = Vec::with_capacity(suggestions.len());
        let mut issues = Vec::new();

        for (index, text) in suggestions.iter().enumerate() {
            let found = check_suggestion(text, index, professional);
            let outcome = remediate(text, &found);
            for issue in &found {
                debug!(
                    index,
                    category = issue.category.as_ref(),
                    severity = issue.severity.as_ref(),
                    rule = issue.rule,
                    "suggestion flagged"
                );
                metrics::counter!(
                    "parley_safety_issues_total",
                    "severity" => issue.severity.as_ref().to_string()
                )
                .increment(1);
            }
            issues.extend(found);

            if let Some(text) = outcome {
                if !kept.contains(&text) {
                    kept.push(text);
                }
            }
        }

        let confidence = confidence.clamp(0.0, 1.0);
        if kept.is_empty() {
            let pool = if professional {
                PROFESSIONAL_FALLBACKS
            } else {
                CASUAL_FALLBACKS
            };
            let fallback = pool.choose(rng).copied().unwrap_or(CASUAL_FALLBACKS[0]);
            debug!(professional, "no suggestion survived, using fallback");
            return FilteredResult {
                suggestions: vec![fallback.to_string()],
                confidence: CONFIDENCE_FLOOR,
                issues,
                used_fallback: true,
            };
        }

        let confidence = if issues.is_empty() {
            confidence
        } else {
            (confidence * CONFIDENCE_DISCOUNT).max(CONFIDENCE_FLOOR)
        };

        FilteredResult {
            suggestions: kept,
            confidence,
            issues,
            used_fallback: false,
        }
    }
}

/// Applies the remediation policy to one suggestion. `None` means discard.
///
/// High severity findings discard. Spam has no lexical fix either, so it is
/// discarded as well.
fn remediate(text: &str, issues: &[SafetyIssue]) -> Option<String> {
    if issues.is_empty() {
        return Some(text.to_string());
    }
    let unfixable = issues
        .iter()
        .any(|i| i.severity == Severity::High || i.category == IssueCategory::Spam);
    if unfixable || text.trim().is_empty() {
        return None;
    }

    let has = |category| issues.iter().any(|i| i.category == category);
    let mut out = text.to_string();
    if has(IssueCategory::Unprofessional) {
        out = make_professional(&out);
    }
    if has(IssueCategory::TooLong) {
        out = truncate_to_first_sentence(&out);
    }
    if has(IssueCategory::TooShort) {
        out = expand_short(&out);
    }
    let out = cleanup(&out);

    // Substitutions can leave nothing usable behind.
    (out.chars().count() >= crate::rules::MIN_SUGGESTION_CHARS).then_some(out)
}
