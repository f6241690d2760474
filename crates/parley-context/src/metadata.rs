// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata derived from the message window: reply latency and topic.

use std::collections::HashSet;

use chrono::Duration;
use parley_core::types::{ContextMessage, MessageKind, Topic};

/// Messages scanned for reply latency.
const LATENCY_WINDOW: usize = 20;

/// Text messages scanned for topic inference.
const TOPIC_WINDOW: usize = 5;

/// Keyword hits a cluster needs before it can win.
const TOPIC_MIN_HITS: usize = 2;

/// Topic clusters in precedence order; the first cluster reaching the threshold wins.
const TOPIC_CLUSTERS: &[(Topic, &[&str])] = &[
    (
        Topic::Work,
        &[
            "meeting", "project", "deadline", "office", "boss", "client", "report",
            "presentation", "work", "colleague", "email", "schedule",
        ],
    ),
    (
        Topic::Family,
        &[
            "mom", "dad", "mother", "father", "sister", "brother", "kids", "family", "grandma",
            "grandpa", "son", "daughter", "parents",
        ],
    ),
    (
        Topic::Travel,
        &[
            "flight", "trip", "hotel", "airport", "vacation", "travel", "passport", "booking",
            "beach", "train",
        ],
    ),
    (
        Topic::Health,
        &[
            "doctor", "hospital", "sick", "medicine", "appointment", "health", "gym", "workout",
            "pain", "fever",
        ],
    ),
    (
        Topic::Food,
        &[
            "dinner", "lunch", "breakfast", "restaurant", "pizza", "cook", "recipe", "coffee",
            "eat", "food",
        ],
    ),
    (
        Topic::Social,
        &[
            "party", "drinks", "hangout", "weekend", "movie", "game", "concert", "friends",
            "birthday", "club",
        ],
    ),
];

/// Average gap between an incoming message and the user's next reply, in milliseconds.
///
/// Looks at the last [`LATENCY_WINDOW`] messages (oldest first). Gaps of zero
/// or less, or of a day or more, are not counted as replies. Returns `None`
/// with fewer than two counted gaps.
pub fn average_response_time_ms(messages: &[ContextMessage]) -> Option<u64> {
    let window = &messages[messages.len().saturating_sub(LATENCY_WINDOW)..];
    let day = Duration::hours(24);

    let gaps: Vec<i64> = window
        .windows(2)
        .filter(|pair| !pair[0].from_self && pair[1].from_self)
        .map(|pair| pair[1].timestamp - pair[0].timestamp)
        .filter(|gap| *gap > Duration::zero() && *gap < day)
        .map(|gap| gap.num_milliseconds())
        .collect();

    if gaps.len() < 2 {
        return None;
    }
    Some((gaps.iter().sum::<i64>() / gaps.len() as i64) as u64)
}

/// Whole-word match that also accepts the plural (`meetings`, `beaches`).
///
/// Prefix matching is avoided: `eat` must not fire on `eaten` or `son` on `song`.
fn keyword_matches(word: &str, keyword: &str) -> bool {
    word.strip_prefix(keyword)
        .is_some_and(|rest| matches!(rest, "" | "s" | "es"))
}

/// Coarse topic of the last few text messages, if any cluster has enough keyword hits.
pub fn infer_topic(messages: &[ContextMessage]) -> Option<Topic> {
    let recent: Vec<&str> = messages
        .iter()
        .rev()
        .filter(|m| m.kind == MessageKind::Text)
        .take(TOPIC_WINDOW)
        .map(|m| m.content.as_str())
        .collect();
    if recent.is_empty() {
        return None;
    }

    let text = recent.join(" ").to_lowercase();
    let words: HashSet<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TOPIC_CLUSTERS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .filter(|k| words.iter().any(|w| keyword_matches(w, k)))
                .count()
                >= TOPIC_MIN_HITS
        })
        .map(|(topic, _)| *topic)
}
