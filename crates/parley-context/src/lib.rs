// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context assembly.
//!
//! Gathers the recent message window, contact record and user preferences
//! for a triggering message, derives conversation metadata, and renders the
//! result as prompt text. Assembly is best-effort: a failing collaborator
//! leaves its part of the context empty or defaulted.

pub mod format;
pub mod metadata;

use std::sync::Arc;

use parley_config::model::ContextConfig;
use parley_core::types::{
    ContactInfo, ContextMessage, ContextMetadata, ConversationContext, ConversationRef,
    UserPreferences,
};
use parley_core::{ContactStore, ConversationStore, PreferenceStore};
use tracing::{debug, warn};

pub use format::format_for_prompt;
pub use metadata::{average_response_time_ms, infer_topic};

/// Builds a [`ConversationContext`] from the persistence collaborators.
pub struct ContextBuilder {
    conversations: Arc<dyn ConversationStore>,
    contacts: Arc<dyn ContactStore>,
    preferences: Arc<dyn PreferenceStore>,
    max_messages: usize,
}

impl ContextBuilder {
    pub fn new(
        config: &ContextConfig,
        conversations: Arc<dyn ConversationStore>,
        contacts: Arc<dyn ContactStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            conversations,
            contacts,
            preferences,
            max_messages: config.max_messages,
        }
    }

    /// Window size used when the caller does not pass one.
    pub fn default_max_messages(&self) -> usize {
        self.max_messages
    }

    /// Assembles the context for the message identified by `request_id`.
    ///
    /// Never fails. Messages come back oldest first.
    pub async fn build_context(
        &self,
        request_id: &str,
        user_id: &str,
        max_messages: Option<usize>,
    ) -> ConversationContext {
        let limit = max_messages.unwrap_or(self.max_messages);

        let conversation = match self.conversations.resolve_conversation(request_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                debug!(request_id, "no conversation for request, using defaulted context");
                return ConversationContext {
                    preferences: self.fetch_preferences(user_id).await,
                    ..Default::default()
                };
            }
            Err(e) => {
                warn!(request_id, error = %e, "conversation lookup failed, using defaulted context");
                return ConversationContext::default();
            }
        };

        let (messages, contact, preferences) = tokio::join!(
            self.fetch_messages(&conversation, limit),
            self.fetch_contact(&conversation),
            self.fetch_preferences(user_id),
        );

        let metadata = self.derive_metadata(&conversation, &messages).await;

        debug!(
            request_id,
            messages = messages.len(),
            has_contact = contact.is_some(),
            topic = ?metadata.topic,
            "context assembled"
        );

        ConversationContext {
            messages,
            contact,
            preferences,
            metadata,
        }
    }

    async fn fetch_messages(
        &self,
        conversation: &ConversationRef,
        limit: usize,
    ) -> Vec<ContextMessage> {
        match self
            .conversations
            .fetch_recent_messages(&conversation.conversation_id, limit)
            .await
        {
            Ok(mut messages) => {
                // Storage hands back newest first.
                messages.reverse();
                messages
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation.conversation_id,
                    error = %e,
                    "message fetch failed, continuing without history"
                );
                Vec::new()
            }
        }
    }

    async fn fetch_contact(&self, conversation: &ConversationRef) -> Option<ContactInfo> {
        let contact_id = conversation.contact_id.as_deref()?;
        match self.contacts.fetch_contact(contact_id).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!(contact_id, error = %e, "contact fetch failed, continuing without contact");
                None
            }
        }
    }

    async fn fetch_preferences(&self, user_id: &str) -> UserPreferences {
        match self.preferences.fetch_preferences(user_id).await {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                warn!(user_id, error = %e, "preference fetch failed, using defaults");
                UserPreferences::default()
            }
        }
    }

    async fn derive_metadata(
        &self,
        conversation: &ConversationRef,
        messages: &[ContextMessage],
    ) -> ContextMetadata {
        let count = async {
            match self
                .conversations
                .count_messages(&conversation.conversation_id)
                .await
            {
                Ok(count) => count,
                Err(e) => {
                    warn!(error = %e, "message count failed, using window size");
                    messages.len() as u64
                }
            }
        };
        let latency = async { average_response_time_ms(messages) };
        let topic = async { infer_topic(messages) };

        let (message_count, average_response_time_ms, topic) = tokio::join!(count, latency, topic);

        ContextMetadata {
            chat_type: conversation.chat_type,
            message_count,
            average_response_time_ms,
            last_interaction_time: messages.last().map(|m| m.timestamp),
            topic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use parley_core::types::{ChatType, MessageKind, Topic};
    use parley_test_utils::MemoryStore;
    use tracing_test::traced_test;

    fn message(id: &str, minute: i64, from_self: bool, content: &str) -> ContextMessage {
        ContextMessage {
            id: id.into(),
            content: content.into(),
            from_self,
            sender_external_id: (!from_self).then(|| "k-1".to_string()),
            timestamp: Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap() + Duration::minutes(minute),
            kind: MessageKind::Text,
        }
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_conversation(ConversationRef {
            conversation_id: "conv-1".into(),
            chat_type: ChatType::Individual,
            contact_id: Some("contact-1".into()),
        });
        store.add_message("conv-1", message("m1", 0, false, "Is the meeting still on?"));
        store.add_message("conv-1", message("m2", 2, true, "Yes, project review at 3"));
        store.add_message("conv-1", message("m3", 5, false, "Great, I'll bring the report"));
        store.add_message("conv-1", message("m4", 9, true, "Perfect"));
        store.set_contact(
            "contact-1",
            ContactInfo {
                display_name: Some("Dana".into()),
                relationship: Some("colleague".into()),
                ..Default::default()
            },
        );
        store
    }

    fn builder(store: &Arc<MemoryStore>) -> ContextBuilder {
        ContextBuilder::new(
            &ContextConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    #[tokio::test]
    async fn assembles_chronological_window_with_metadata() {
        let store = seeded_store();
        let ctx = builder(&store).build_context("m4", "user-1", None).await;

        let ids: Vec<&str> = ctx.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3", "m4"]);
        assert_eq!(ctx.contact.as_ref().and_then(|c| c.display_name.as_deref()), Some("Dana"));
        assert_eq!(ctx.preferences, UserPreferences::default());
        assert_eq!(ctx.metadata.chat_type, ChatType::Individual);
        assert_eq!(ctx.metadata.message_count, 4);
        // Gaps: 2 min and 4 min.
        assert_eq!(ctx.metadata.average_response_time_ms, Some(180_000));
        assert_eq!(ctx.metadata.topic, Some(Topic::Work));
        assert_eq!(ctx.metadata.last_interaction_time, Some(ctx.messages[3].timestamp));
    }

    #[tokio::test]
    async fn window_keeps_most_recent_messages() {
        let store = seeded_store();
        let ctx = builder(&store).build_context("m4", "user-1", Some(2)).await;
        let ids: Vec<&str> = ctx.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m4"]);
        assert_eq!(ctx.metadata.message_count, 4);
    }

    #[tokio::test]
    async fn deleted_messages_are_excluded() {
        let store = seeded_store();
        store.soft_delete_message("m3");
        let ctx = builder(&store).build_context("m4", "user-1", None).await;
        assert!(ctx.messages.iter().all(|m| m.id != "m3"));
    }

    #[tokio::test]
    async fn stored_preferences_override_defaults() {
        let store = seeded_store();
        let prefs = UserPreferences {
            tone: "formal".into(),
            response_style: "detailed".into(),
            language: "de".into(),
            personality_traits: vec!["dry humour".into()],
        };
        store.set_preferences("user-1", prefs.clone());
        let ctx = builder(&store).build_context("m4", "user-1", None).await;
        assert_eq!(ctx.preferences, prefs);
    }

    #[tokio::test]
    async fn unknown_request_gives_defaulted_context() {
        let store = seeded_store();
        let ctx = builder(&store).build_context("nope", "user-1", None).await;
        assert!(ctx.messages.is_empty());
        assert!(ctx.contact.is_none());
        assert_eq!(ctx.metadata, ContextMetadata::default());
    }

    #[traced_test]
    #[tokio::test]
    async fn failing_lookups_degrade_without_error() {
        let store = seeded_store();
        store.fail_contacts(true);
        store.fail_preferences(true);
        let ctx = builder(&store).build_context("m4", "user-1", None).await;
        assert_eq!(ctx.messages.len(), 4);
        assert!(ctx.contact.is_none());
        assert_eq!(ctx.preferences, UserPreferences::default());
        assert!(logs_contain("contact fetch failed"));

        store.fail_messages(true);
        let ctx = builder(&store).build_context("m4", "user-1", None).await;
        assert_eq!(ctx, ConversationContext::default());
        assert!(logs_contain("conversation lookup failed"));
    }
}
