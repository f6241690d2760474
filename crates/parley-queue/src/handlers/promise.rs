// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commitment detection over inbound and outbound messages.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parley_core::types::{IngestEvent, Promise};
use parley_core::{Clock, ParleyError, PromiseStore};
use regex::Regex;
use tracing::debug;

use crate::job::{Job, JobPayload};
use crate::worker::JobHandler;

/// Phrases that mark a sentence as a commitment, checked in order.
pub static COMMITMENT_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("will_contraction", r"(?i)\bi['’]ll\s+\w+"),
        ("i_will", r"(?i)\bi\s+will\s+\w+"),
        ("i_promise", r"(?i)\bi\s+promise\b"),
        ("get_back", r"(?i)\blet\s+me\s+get\s+back\s+to\s+you\b"),
        ("will_send", r"(?i)\bwill\s+send\b"),
        ("going_to", r"(?i)\bi'?m\s+going\s+to\s+(send|call|check|bring|finish|pay|book|share)\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Due-date hints, checked in order. The first match is kept.
pub static DUE_HINT_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\btonight\b",
        r"(?i)\btoday\b",
        r"(?i)\btomorrow\b",
        r"(?i)\bthis\s+week\b",
        r"(?i)\bnext\s+week\b",
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"(?i)\bby\s+\w+",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?\n]+").unwrap());

/// A commitment found in one sentence of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPromise {
    pub sentence_index: usize,
    pub text: String,
    pub due_hint: Option<String>,
    pub rule: &'static str,
}

/// Splits `body` into sentences and returns the ones containing a commitment.
///
/// Sentence indexes count every non-blank sentence, matched or not, so they
/// stay stable across runs.
pub fn detect_promises(body: &str) -> Vec<DetectedPromise> {
    SENTENCE_END
        .split(body)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .filter_map(|(sentence_index, sentence)| {
            let (rule, _) = COMMITMENT_RULES.iter().find(|(_, re)| re.is_match(sentence))?;
            let due_hint = DUE_HINT_RULES
                .iter()
                .find_map(|re| re.find(sentence))
                .map(|m| m.as_str().to_lowercase());
            Some(DetectedPromise {
                sentence_index,
                text: sentence.to_string(),
                due_hint,
                rule: *rule,
            })
        })
        .collect()
}

/// Persists commitments found in a message, self-sent ones included.
pub struct PromiseHandler {
    store: Arc<dyn PromiseStore>,
    clock: Arc<dyn Clock>,
}

impl PromiseHandler {
    pub fn new(store: Arc<dyn PromiseStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn process(&self, event: &IngestEvent) -> Result<(), ParleyError> {
        let found = detect_promises(&event.body);
        for detected in &found {
            let promise = Promise {
                id: format!("{}:{}", event.external_message_id, detected.sentence_index),
                message_id: event.external_message_id.clone(),
                conversation_id: event.conversation_id.clone(),
                text: detected.text.clone(),
                due_hint: detected.due_hint.clone(),
                from_self: event.from_self,
                created_at: self.clock.now(),
            };
            self.store.save_promise(&promise).await?;
        }
        debug!(
            message_id = %event.external_message_id,
            promises = found.len(),
            "promise detection finished"
        );
        Ok(())
    }
}

#[async_trait]
impl JobHandler for PromiseHandler {
    async fn handle(&self, job: &Job) -> Result<(), ParleyError> {
        match &job.payload {
            JobPayload::PromiseDetection(event) => self.process(event).await,
            other => Err(ParleyError::Queue {
                message: format!("promise handler got a {} job", other.kind()),
            }),
        }
    }
}
