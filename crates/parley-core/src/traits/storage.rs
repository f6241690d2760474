// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator traits.
//!
//! Lookups return `Ok(None)` or an empty collection on not-found; `Err` is
//! reserved for the backend itself failing.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{
    AnalyticsRecord, ContactInfo, ContactInference, ContextMessage, ConversationRef, DateRange,
    FeedbackUpdate, IngestEvent, MediaRecord, Promise, UserPreferences,
};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Finds the conversation a triggering message (by external id) belongs to.
    async fn resolve_conversation(
        &self,
        request_id: &str,
    ) -> Result<Option<ConversationRef>, ParleyError>;

    /// Most recent non-deleted messages, newest first.
    async fn fetch_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextMessage>, ParleyError>;

    /// Total non-deleted messages in the conversation.
    async fn count_messages(&self, conversation_id: &str) -> Result<u64, ParleyError>;

    /// Stores an inbound message so later context builds can see it.
    async fn record_message(&self, event: &IngestEvent) -> Result<(), ParleyError>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn fetch_contact(&self, contact_id: &str) -> Result<Option<ContactInfo>, ParleyError>;

    /// Writes inferred fields only; user-entered fields are left alone.
    async fn record_inference(&self, inference: &ContactInference) -> Result<(), ParleyError>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn fetch_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, ParleyError>;
}

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn append_record(&self, record: &AnalyticsRecord) -> Result<(), ParleyError>;

    /// Applies feedback to the record for `(request_id, user_id)`. Returns false if none exists.
    async fn update_feedback(
        &self,
        request_id: &str,
        user_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<bool, ParleyError>;

    async fn query_records(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> Result<Vec<AnalyticsRecord>, ParleyError>;
}

#[async_trait]
pub trait PromiseStore: Send + Sync {
    /// Upsert by promise id.
    async fn save_promise(&self, promise: &Promise) -> Result<(), ParleyError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upsert by media id.
    async fn save_media(&self, record: &MediaRecord) -> Result<(), ParleyError>;
}
