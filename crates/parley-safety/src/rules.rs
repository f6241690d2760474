// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered safety rule tables.

use std::sync::LazyLock;

use regex::Regex;
use strum::{AsRefStr, Display};

/// Suggestions shorter than this (in characters) are flagged.
pub const MIN_SUGGESTION_CHARS: usize = 2;
/// Suggestions longer than this (in characters) are flagged.
pub const MAX_SUGGESTION_CHARS: usize = 500;

/// How a flagged suggestion is handled. Ordered, so `High > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Repaired in place.
    Low,
    /// Repaired when a rewrite exists. Spam has none and is dropped.
    Medium,
    /// The suggestion is dropped.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum IssueCategory {
    Disallowed,
    Spam,
    /// Slang or casual phrasing, flagged only toward professional contacts.
    Unprofessional,
    TooShort,
    TooLong,
    PersonalData,
}

impl IssueCategory {
    pub fn severity(self) -> Severity {
        match self {
            IssueCategory::Disallowed | IssueCategory::PersonalData => Severity::High,
            IssueCategory::Spam | IssueCategory::Unprofessional => Severity::Medium,
            IssueCategory::TooShort | IssueCategory::TooLong => Severity::Low,
        }
    }
}

/// One finding against one suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    /// Index of the suggestion in the model's output.
    pub suggestion_index: usize,
    /// Name of the rule that matched, for logs.
    pub rule: &'static str,
}

/// A pattern rule. `professional_only` rules are skipped unless the contact
/// is a professional relationship.
pub struct SafetyRule {
    pub name: &'static str,
    pub category: IssueCategory,
    pub professional_only: bool,
    pub pattern: Regex,
}

fn rule(
    name: &'static str,
    category: IssueCategory,
    professional_only: bool,
    pattern: &str,
) -> SafetyRule {
    SafetyRule {
        name,
        category,
        professional_only,
        pattern: Regex::new(pattern).unwrap(),
    }
}

/// Content rules, checked before the length bounds.
pub static CONTENT_RULES: LazyLock<Vec<SafetyRule>> = LazyLock::new(|| {
    use IssueCategory::*;
    vec![
        rule(
            "violence",
            Disallowed,
            false,
            r"(?i)\b(kill|murder|stab|shoot|beat)\s+(you|him|her|them|u)\b|\b(bomb|massacre)\b",
        ),
        rule(
            "hate",
            Disallowed,
            false,
            r"(?i)\b(hate all|inferior race|go back to your country|subhuman)\b",
        ),
        rule(
            "self_harm",
            Disallowed,
            false,
            r"(?i)\b(kill (myself|yourself)|suicide|self[- ]harm|end (my|your) life|cut (myself|yourself))\b",
        ),
        rule(
            "illegal_activity",
            Disallowed,
            false,
            r"(?i)\b(buy (drugs|cocaine|meth|heroin)|launder(ing)? money|fake (id|passport)|steal (a|the|your))\b",
        ),
        rule(
            "sensitive_data_request",
            Disallowed,
            false,
            r"(?i)\b(send|give|tell|share)\b.{0,20}\b(password|pin|social security|ssn|credit card|card number|bank (account|details)|cvv)\b",
        ),
        rule(
            "urgency_bait",
            Spam,
            false,
            r"(?i)\b(act now|limited time|urgent(ly)? (reply|respond)|don'?t miss out|last chance|expires today)\b",
        ),
        rule(
            "monetary_lure",
            Spam,
            false,
            r"(?i)\b(free money|make \$?\d+ (a|per) (day|week)|get rich|guaranteed (income|returns)|wire (me|the) money|crypto giveaway)\b",
        ),
        rule(
            "prize_language",
            Spam,
            false,
            r"(?i)\b(you('ve| have)? won|claim your (prize|reward)|congratulations,? winner|click (here|this link))\b",
        ),
        rule(
            "endearment",
            Unprofessional,
            true,
            r"(?i)\b(love you|babe|baby|honey|sweetie|sweetheart|darling|hun|xoxo)\b",
        ),
        rule(
            "intoxication",
            Unprofessional,
            true,
            r"(?i)\b(drunk|wasted|hungover|tipsy|shots|beers?)\b",
        ),
        rule(
            "affectionate_emoji",
            Unprofessional,
            true,
            "[\u{1F618}\u{1F60D}\u{1F48B}\u{1F970}\u{2764}\u{1F495}\u{1F496}\u{1F37A}\u{1F37B}\u{1F377}\u{1F942}]",
        ),
    ]
});

/// Embedded personal data, checked after the length bounds.
pub static PERSONAL_DATA_RULES: LazyLock<Vec<SafetyRule>> = LazyLock::new(|| {
    use IssueCategory::PersonalData;
    vec![
        rule("national_id", PersonalData, false, r"\b\d{3}-\d{2}-\d{4}\b"),
        rule(
            "payment_card",
            PersonalData,
            false,
            r"\b(?:\d{4}[ -]?){3}\d{4}\b",
        ),
        rule(
            "email",
            PersonalData,
            false,
            r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b",
        ),
        rule(
            "phone",
            PersonalData,
            false,
            r"(?:\+\d{1,3}[ .-]?)?\(?\b\d{3}\)?[ .-]?\d{3}[ .-]?\d{4}\b",
        ),
    ]
});

/// Runs every check against one suggestion, in table order.
pub fn check_suggestion(text: &str, index: usize, professional: bool) -> Vec<SafetyIssue> {
    let mut issues = Vec::new();
    let mut push = |category: IssueCategory, rule: &'static str| {
        issues.push(SafetyIssue {
            category,
            severity: category.severity(),
            suggestion_index: index,
            rule,
        });
    };

    for r in CONTENT_RULES.iter() {
        if r.professional_only && !professional {
            continue;
        }
        if r.pattern.is_match(text) {
            push(r.category, r.name);
        }
    }

    let len = text.trim().chars().count();
    if len < MIN_SUGGESTION_CHARS {
        push(IssueCategory::TooShort, "min_length");
    } else if len > MAX_SUGGESTION_CHARS {
        push(IssueCategory::TooLong, "max_length");
    }

    for r in PERSONAL_DATA_RULES.iter() {
        if r.pattern.is_match(text) {
            push(r.category, r.name);
        }
    }

    issues
}
