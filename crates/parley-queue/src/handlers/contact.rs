// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact name and relationship inference from recent conversation text.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parley_core::types::{ContactInference, ContextMessage};
use parley_core::{ContactStore, ConversationStore, ParleyError};
use regex::Regex;
use tracing::debug;

use crate::job::{Job, JobPayload};
use crate::worker::JobHandler;

/// Messages inspected per inference run.
pub const INFERENCE_WINDOW: usize = 20;

/// Keyword hits a relationship needs before it is inferred.
pub const MIN_RELATIONSHIP_HITS: usize = 2;

const BASE_CONFIDENCE: f64 = 0.4;
const CONFIDENCE_PER_EXTRA_HIT: f64 = 0.15;
const MAX_CONFIDENCE: f64 = 0.95;

/// Self-introductions. The captured name must start with a capital letter.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i:\bthis is)\s+([A-Z][a-zA-Z'-]+)",
        r"(?i:\bmy name is)\s+([A-Z][a-zA-Z'-]+)",
        r"(?i:\bi['’]m|\bi am)\s+([A-Z][a-zA-Z'-]+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Capitalised words that follow "I'm" without being names.
const NOT_NAMES: &[&str] = &[
    "sorry", "not", "just", "so", "here", "there", "fine", "good", "ok", "okay", "back", "home",
    "on", "in", "at", "going", "sure", "free", "busy", "late", "done", "ready", "glad", "happy",
    "the", "a", "an", "it", "that", "also", "still", "very", "really",
];

/// Relationship keyword clusters, checked in order.
pub static RELATIONSHIP_RULES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    let table: [(&str, &[&str]); 4] = [
        (
            "colleague",
            &[
                "meeting", "deadline", "project", "office", "boss", "client", "report", "team",
                "manager", "standup",
            ],
        ),
        (
            "family",
            &[
                "mom", "dad", "mum", "sister", "brother", "grandma", "grandpa", "aunt", "uncle",
                "cousin", "family",
            ],
        ),
        (
            "partner",
            &[
                "love you", "babe", "honey", "darling", "sweetheart", "date night", "miss you",
            ],
        ),
        (
            "friend",
            &[
                "bro", "dude", "mate", "buddy", "party", "hang out", "drinks", "lol",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(relationship, keywords)| {
            let patterns = keywords
                .iter()
                .map(|k| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k))).unwrap())
                .collect();
            (relationship, patterns)
        })
        .collect()
});

/// Messages attributed to `contact_id`, in their original order.
pub fn sent_by(messages: Vec<ContextMessage>, contact_id: &str) -> Vec<ContextMessage> {
    messages
        .into_iter()
        .filter(|m| !m.from_self && m.sender_external_id.as_deref() == Some(contact_id))
        .collect()
}

/// Newest introduction wins. `messages` are newest first.
pub fn infer_name(messages: &[ContextMessage]) -> Option<String> {
    messages
        .iter()
        .filter(|m| !m.from_self)
        .find_map(|m| {
            NAME_PATTERNS.iter().find_map(|re| {
                re.captures_iter(&m.content)
                    .filter_map(|c| c.get(1))
                    .map(|n| n.as_str())
                    .find(|n| !NOT_NAMES.contains(&n.to_lowercase().as_str()))
                    .map(str::to_string)
            })
        })
}

/// First relationship in table order with enough distinct keyword hits.
///
/// Returns the relationship and its hit count.
pub fn infer_relationship(messages: &[ContextMessage]) -> Option<(&'static str, usize)> {
    let text = messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    RELATIONSHIP_RULES.iter().find_map(|(relationship, patterns)| {
        let hits = patterns.iter().filter(|re| re.is_match(&text)).count();
        (hits >= MIN_RELATIONSHIP_HITS).then_some((*relationship, hits))
    })
}

/// 0.4 at the minimum hit count, plus 0.15 per extra hit, capped at 0.95.
pub fn relationship_confidence(hits: usize) -> f64 {
    let extra = hits.saturating_sub(MIN_RELATIONSHIP_HITS) as f64;
    (BASE_CONFIDENCE + CONFIDENCE_PER_EXTRA_HIT * extra).min(MAX_CONFIDENCE)
}

/// Runs inference over a conversation and stores the inferred fields.
pub struct ContactInferenceHandler {
    conversations: Arc<dyn ConversationStore>,
    contacts: Arc<dyn ContactStore>,
}

impl ContactInferenceHandler {
    pub fn new(conversations: Arc<dyn ConversationStore>, contacts: Arc<dyn ContactStore>) -> Self {
        Self {
            conversations,
            contacts,
        }
    }

    async fn process(&self, contact_id: &str, conversation_id: &str) -> Result<(), ParleyError> {
        let recent = self
            .conversations
            .fetch_recent_messages(conversation_id, INFERENCE_WINDOW)
            .await?;
        let messages = sent_by(recent, contact_id);

        let name = infer_name(&messages);
        let relationship = infer_relationship(&messages);
        if name.is_none() && relationship.is_none() {
            debug!(contact_id, conversation_id, "nothing to infer");
            return Ok(());
        }

        let inference = ContactInference {
            contact_id: contact_id.to_string(),
            inferred_name: name,
            inferred_relationship: relationship.map(|(r, _)| r.to_string()),
            confidence: relationship
                .map(|(_, hits)| relationship_confidence(hits))
                .unwrap_or(BASE_CONFIDENCE),
        };
        debug!(
            contact_id,
            name = ?inference.inferred_name,
            relationship = ?inference.inferred_relationship,
            confidence = inference.confidence,
            "contact inferred"
        );
        self.contacts.record_inference(&inference).await
    }
}

#[async_trait]
impl JobHandler for ContactInferenceHandler {
    async fn handle(&self, job: &Job) -> Result<(), ParleyError> {
        match &job.payload {
            JobPayload::ContactInference {
                contact_id,
                conversation_id,
            } => self.process(contact_id, conversation_id).await,
            other => Err(ParleyError::Queue {
                message: format!("contact inference handler got a {} job", other.kind()),
            }),
        }
    }
}
