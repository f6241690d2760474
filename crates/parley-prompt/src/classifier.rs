// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-based message intent detection.
//!
//! Deterministic and network-free: an ordered list of patterns where the
//! first matching rule decides. There is no scoring across categories.

use std::sync::LazyLock;

use parley_core::types::MessageType;
use regex::Regex;

/// One entry of the intent rule table.
pub struct IntentRule {
    pub category: MessageType,
    pub pattern: Regex,
}

/// Intent rules in precedence order. Anything unmatched is [`MessageType::Social`].
pub static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    let rule = |category, pattern: &str| IntentRule {
        category,
        pattern: Regex::new(pattern).unwrap(),
    };
    vec![
        // Question marks, or a leading interrogative.
        rule(
            MessageType::Question,
            r"(?i)\?|^\s*(who|what|when|where|why|how|which)\b",
        ),
        rule(
            MessageType::Event,
            r"(?i)\b(party|parties|event|invite|invited|invitation|join us|come over|hang ?out|meet ?up|wedding|celebration|celebrate|birthday|bbq|barbecue|get-together|tonight|this weekend)\b",
        ),
        rule(
            MessageType::Appreciation,
            r"(?i)\b(thanks|thank you|thank u|thx|ty|appreciate|appreciated|grateful|great job|well done|congrats|congratulations|kudos)\b",
        ),
        rule(
            MessageType::Concern,
            r"(?i)\b(sorry|sad|worried|worry|upset|stressed|anxious|sick|ill|hurt|lost|hard time|rough day|bad day|miss you|struggling|passed away|funeral|breakup|broke up)\b",
        ),
        rule(
            MessageType::Business,
            r"(?i)\b(meeting|deadline|report|project|client|invoice|contract|proposal|schedule|asap|eod|quarter|budget|presentation|agenda|deliverable)s?\b",
        ),
    ]
});

/// Classifies the intent of `text`. The first rule that matches wins.
pub fn detect_message_type(text: &str) -> MessageType {
    INTENT_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.category)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn question_mark_beats_business_keywords() {
        assert_eq!(
            detect_message_type("Can you send the report by Friday?"),
            MessageType::Question
        );
    }

    #[test]
    fn leading_interrogative_without_question_mark() {
        assert_eq!(detect_message_type("what time works for you"), MessageType::Question);
    }

    #[test]
    fn each_category_detected() {
        assert_eq!(
            detect_message_type("Birthday party at mine this Saturday!"),
            MessageType::Event
        );
        assert_eq!(detect_message_type("Thanks so much for the help"), MessageType::Appreciation);
        assert_eq!(detect_message_type("Having a really rough day"), MessageType::Concern);
        assert_eq!(
            detect_message_type("Please update the budget before the meeting"),
            MessageType::Business
        );
        assert_eq!(detect_message_type("lol same"), MessageType::Social);
    }

    #[test]
    fn precedence_is_table_order() {
        // Event and appreciation both match; event is earlier.
        assert_eq!(
            detect_message_type("Thanks for the invite to the party"),
            MessageType::Event
        );
        // Concern and business both match; concern is earlier.
        assert_eq!(
            detect_message_type("Sorry, the client meeting moved"),
            MessageType::Concern
        );
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "reporter" and "unthanked" must not trip business or appreciation.
        assert_eq!(detect_message_type("the reporter was unthanked"), MessageType::Social);
    }

    #[test]
    fn empty_text_is_social() {
        assert_eq!(detect_message_type(""), MessageType::Social);
    }

    proptest! {
        #[test]
        fn any_text_with_question_mark_is_a_question(prefix in "[a-zA-Z ]{0,30}", suffix in "[a-zA-Z ]{0,30}") {
            let text = format!("{prefix}?{suffix}");
            prop_assert_eq!(detect_message_type(&text), MessageType::Question);
        }
    }
}
