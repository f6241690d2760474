// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of every persistence collaborator trait.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parley_core::types::{
    AnalyticsRecord, ContactInference, ContactInfo, ContextMessage, ConversationRef, DateRange,
    FeedbackUpdate, IngestEvent, MediaRecord, Promise, UserPreferences,
};
use parley_core::{
    AnalyticsStore, ContactStore, ConversationStore, MediaStore, ParleyError, PreferenceStore,
    PromiseStore,
};

#[derive(Default)]
struct State {
    conversations: HashMap<String, ConversationRef>,
    /// external message id -> conversation id
    message_index: HashMap<String, String>,
    messages: HashMap<String, Vec<(ContextMessage, bool)>>,
    contacts: HashMap<String, ContactInfo>,
    preferences: HashMap<String, UserPreferences>,
    analytics: Vec<AnalyticsRecord>,
    promises: HashMap<String, Promise>,
    media: HashMap<String, MediaRecord>,
}

/// Shared fake database. Individual read paths can be switched to fail.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_messages: AtomicBool,
    fail_contacts: AtomicBool,
    fail_preferences: AtomicBool,
    fail_analytics: AtomicBool,
}

fn backend_down(what: &str) -> ParleyError {
    ParleyError::storage(format!("{what} backend unavailable"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("store lock poisoned")
    }

    pub fn add_conversation(&self, conversation: ConversationRef) {
        self.state()
            .conversations
            .insert(conversation.conversation_id.clone(), conversation);
    }

    /// Appends a message; its id doubles as the external id used for request resolution.
    pub fn add_message(&self, conversation_id: &str, message: ContextMessage) {
        let mut state = self.state();
        state
            .message_index
            .insert(message.id.clone(), conversation_id.to_string());
        state
            .messages
            .entry(conversation_id.to_string())
            .or_default()
            .push((message, false));
    }

    pub fn soft_delete_message(&self, message_id: &str) {
        for entries in self.state().messages.values_mut() {
            for (message, deleted) in entries.iter_mut() {
                if message.id == message_id {
                    *deleted = true;
                }
            }
        }
    }

    pub fn set_contact(&self, contact_id: &str, contact: ContactInfo) {
        self.state().contacts.insert(contact_id.to_string(), contact);
    }

    pub fn contact(&self, contact_id: &str) -> Option<ContactInfo> {
        self.state().contacts.get(contact_id).cloned()
    }

    pub fn set_preferences(&self, user_id: &str, preferences: UserPreferences) {
        self.state()
            .preferences
            .insert(user_id.to_string(), preferences);
    }

    pub fn analytics_records(&self) -> Vec<AnalyticsRecord> {
        self.state().analytics.clone()
    }

    pub fn promises(&self) -> Vec<Promise> {
        let mut promises: Vec<Promise> = self.state().promises.values().cloned().collect();
        promises.sort_by(|a, b| a.id.cmp(&b.id));
        promises
    }

    pub fn media(&self) -> Vec<MediaRecord> {
        self.state().media.values().cloned().collect()
    }

    pub fn fail_messages(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_contacts(&self, fail: bool) {
        self.fail_contacts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_preferences(&self, fail: bool) {
        self.fail_preferences.store(fail, Ordering::SeqCst);
    }

    pub fn fail_analytics(&self, fail: bool) {
        self.fail_analytics.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn resolve_conversation(
        &self,
        request_id: &str,
    ) -> Result<Option<ConversationRef>, ParleyError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(backend_down("message"));
        }
        let state = self.state();
        Ok(state
            .message_index
            .get(request_id)
            .and_then(|conversation_id| state.conversations.get(conversation_id))
            .cloned())
    }

    async fn fetch_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextMessage>, ParleyError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(backend_down("message"));
        }
        let mut messages: Vec<ContextMessage> = self
            .state()
            .messages
            .get(conversation_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, deleted)| !deleted)
                    .map(|(m, _)| m.clone())
                    .collect()
            })
            .unwrap_or_default();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64, ParleyError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(backend_down("message"));
        }
        Ok(self
            .state()
            .messages
            .get(conversation_id)
            .map(|entries| entries.iter().filter(|(_, deleted)| !deleted).count() as u64)
            .unwrap_or(0))
    }

    async fn record_message(&self, event: &IngestEvent) -> Result<(), ParleyError> {
        {
            let mut state = self.state();
            let conversation = state
                .conversations
                .entry(event.conversation_id.clone())
                .or_insert_with(|| ConversationRef {
                    conversation_id: event.conversation_id.clone(),
                    chat_type: event.chat_type,
                    contact_id: None,
                });
            if conversation.contact_id.is_none() && !event.from_self {
                conversation.contact_id = event.sender_external_id.clone();
            }
            if state.message_index.contains_key(&event.external_message_id) {
                return Ok(());
            }
        }
        self.add_message(
            &event.conversation_id,
            ContextMessage {
                id: event.external_message_id.clone(),
                content: event.body.clone(),
                from_self: event.from_self,
                sender_external_id: event.sender_external_id.clone(),
                timestamp: event.timestamp,
                kind: event.message_kind(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn fetch_contact(&self, contact_id: &str) -> Result<Option<ContactInfo>, ParleyError> {
        if self.fail_contacts.load(Ordering::SeqCst) {
            return Err(backend_down("contact"));
        }
        Ok(self.state().contacts.get(contact_id).cloned())
    }

    async fn record_inference(&self, inference: &ContactInference) -> Result<(), ParleyError> {
        let mut state = self.state();
        let contact = state
            .contacts
            .entry(inference.contact_id.clone())
            .or_default();
        if inference.inferred_name.is_some() {
            contact.inferred_name = inference.inferred_name.clone();
        }
        if inference.inferred_relationship.is_some() {
            contact.inferred_relationship = inference.inferred_relationship.clone();
        }
        contact.inference_confidence = Some(inference.confidence);
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn fetch_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, ParleyError> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(backend_down("preference"));
        }
        Ok(self.state().preferences.get(user_id).cloned())
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn append_record(&self, record: &AnalyticsRecord) -> Result<(), ParleyError> {
        if self.fail_analytics.load(Ordering::SeqCst) {
            return Err(backend_down("analytics"));
        }
        self.state().analytics.push(record.clone());
        Ok(())
    }

    async fn update_feedback(
        &self,
        request_id: &str,
        user_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<bool, ParleyError> {
        let mut state = self.state();
        let mut found = false;
        for record in state
            .analytics
            .iter_mut()
            .filter(|r| r.request_id == request_id && r.user_id == user_id)
        {
            update.apply_to(record);
            found = true;
        }
        Ok(found)
    }

    async fn query_records(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> Result<Vec<AnalyticsRecord>, ParleyError> {
        if self.fail_analytics.load(Ordering::SeqCst) {
            return Err(backend_down("analytics"));
        }
        Ok(self
            .state()
            .analytics
            .iter()
            .filter(|r| r.user_id == user_id && range.contains(r.created_at))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PromiseStore for MemoryStore {
    async fn save_promise(&self, promise: &Promise) -> Result<(), ParleyError> {
        self.state()
            .promises
            .insert(promise.id.clone(), promise.clone());
        Ok(())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn save_media(&self, record: &MediaRecord) -> Result<(), ParleyError> {
        self.state().media.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
