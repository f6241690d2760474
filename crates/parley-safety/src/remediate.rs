// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-place fixes for suggestions with low or medium severity findings.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::MAX_SUGGESTION_CHARS;

/// Lexical substitutions for unprofessional wording, applied in order.
static PROFESSIONAL_SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\blove you\b", "appreciate you"),
        (r"(?i)\b(babe|baby|honey|sweetie|sweetheart|darling|hun|xoxo)\b", ""),
        (r"(?i)\b(drunk|wasted|tipsy)\b", "out"),
        (r"(?i)\bhungover\b", "tired"),
        (r"(?i)\bshots\b", "drinks"),
        (r"(?i)\bbeers?\b", "coffee"),
        (
            "[\u{1F618}\u{1F60D}\u{1F48B}\u{1F970}\u{2764}\u{1F495}\u{1F496}\u{1F37A}\u{1F37B}\u{1F377}\u{1F942}]\u{FE0F}?",
            "",
        ),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Short replies mapped to a fuller phrasing, keyed on the lowercase text.
const EXPANSIONS: &[(&str, &str)] = &[
    ("k", "Okay, sounds good!"),
    ("y", "Yes, definitely!"),
    ("n", "No, sorry, I can't."),
    ("?", "Could you tell me a bit more?"),
    ("!", "That's great!"),
    ("\u{1F44D}", "Sounds good \u{1F44D}"),
    ("\u{1F642}", "Sounds good \u{1F642}"),
];

const GENERIC_CONTINUATION: &str = " Sounds good to me!";

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+(\s|$)").unwrap());
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([!?.,;:])").unwrap());
static REPEATED_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*,)+").unwrap());
static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)|\[\s*\]").unwrap());
static LEADING_STRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,;:\-*_~|]+").unwrap());
static TRAILING_STRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;:\-*_~|]+$").unwrap());

pub fn make_professional(text: &str) -> String {
    PROFESSIONAL_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Cuts to the first sentence, then hard-caps at a word boundary if that
/// sentence alone is still over the limit.
pub fn truncate_to_first_sentence(text: &str) -> String {
    let text = text.trim();
    let first = match SENTENCE_END.find(text) {
        Some(m) => text[..m.end()].trim_end(),
        None => text,
    };
    if first.chars().count() <= MAX_SUGGESTION_CHARS {
        return first.to_string();
    }
    let cut: String = first.chars().take(MAX_SUGGESTION_CHARS).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}

pub fn expand_short(text: &str) -> String {
    let key = text.trim().to_lowercase();
    EXPANSIONS
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, long)| (*long).to_string())
        .unwrap_or_else(|| format!("{}{GENERIC_CONTINUATION}", text.trim()))
}

/// Final pass over remediated text: normalizes whitespace and strips
/// punctuation left dangling by earlier substitutions.
pub fn cleanup(text: &str) -> String {
    let s = EMPTY_BRACKETS.replace_all(text, "");
    let s = SPACE_RUN.replace_all(&s, " ");
    let s = SPACE_BEFORE_PUNCT.replace_all(&s, "$1");
    let s = REPEATED_COMMA.replace_all(&s, ",");
    let s = LEADING_STRAY.replace(&s, "");
    let s = TRAILING_STRAY.replace(&s, "");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endearments_become_professional() {
        let out = cleanup(&make_professional("love you babe!!"));
        assert_eq!(out, "appreciate you!!");
    }

    #[test]
    fn emoji_and_intoxication_are_substituted() {
        let out = cleanup(&make_professional("Sorry, was so hungover \u{1F37B} yesterday"));
        assert_eq!(out, "Sorry, was so tired yesterday");
    }

    #[test]
    fn first_sentence_kept() {
        assert_eq!(
            truncate_to_first_sentence("Sounds great. I'll be there at six. See you!"),
            "Sounds great."
        );
        assert_eq!(truncate_to_first_sentence("What? Really now"), "What?");
    }

    #[test]
    fn decimals_do_not_end_a_sentence() {
        assert_eq!(
            truncate_to_first_sentence("It costs 3.50 each. Want one?"),
            "It costs 3.50 each."
        );
    }

    #[test]
    fn single_long_sentence_is_hard_capped() {
        let long = "word ".repeat(200);
        let out = truncate_to_first_sentence(&long);
        assert!(out.chars().count() <= MAX_SUGGESTION_CHARS);
        assert!(out.ends_with("word"));
    }

    #[test]
    fn expansion_table_then_generic() {
        assert_eq!(expand_short("K"), "Okay, sounds good!");
        assert_eq!(expand_short("\u{1F44D}"), "Sounds good \u{1F44D}");
        assert_eq!(expand_short("z"), "z Sounds good to me!");
    }

    #[test]
    fn cleanup_strips_stray_symbols() {
        assert_eq!(cleanup("  , hello   there ,, friend () - "), "hello there, friend");
        assert_eq!(cleanup("thanks , see you !"), "thanks, see you!");
    }
}
