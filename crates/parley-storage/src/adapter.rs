// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the persistence collaborator traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parley_config::model::StorageConfig;
use parley_core::types::{
    AnalyticsRecord, ContactInference, ContactInfo, ContextMessage, ConversationRef, DateRange,
    FeedbackUpdate, IngestEvent, MediaRecord, Promise, UserPreferences,
};
use parley_core::{
    AdapterType, AnalyticsStore, ContactStore, ConversationStore, HealthStatus, MediaStore,
    ParleyError, PluginAdapter, PreferenceStore, PromiseStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage. The database is opened by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and applies migrations. Calling it again is a no-op.
    pub async fn initialize(&self) -> Result<(), ParleyError> {
        self.db
            .get_or_try_init(|| Database::open(&self.config.database_path))
            .await?;
        Ok(())
    }

    /// The underlying database, or an error before [`Self::initialize`].
    pub fn database(&self) -> Result<&Database, ParleyError> {
        self.db
            .get()
            .ok_or_else(|| ParleyError::storage("storage not initialized, call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("sqlite storage checkpointed");
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn resolve_conversation(
        &self,
        request_id: &str,
    ) -> Result<Option<ConversationRef>, ParleyError> {
        queries::conversations::resolve_conversation(self.database()?, request_id).await
    }

    async fn fetch_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextMessage>, ParleyError> {
        queries::conversations::recent_messages(self.database()?, conversation_id, limit).await
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64, ParleyError> {
        queries::conversations::count_messages(self.database()?, conversation_id).await
    }

    async fn record_message(&self, event: &IngestEvent) -> Result<(), ParleyError> {
        queries::conversations::insert_message(self.database()?, event).await
    }
}

#[async_trait]
impl ContactStore for SqliteStorage {
    async fn fetch_contact(&self, contact_id: &str) -> Result<Option<ContactInfo>, ParleyError> {
        queries::contacts::get_contact(self.database()?, contact_id).await
    }

    async fn record_inference(&self, inference: &ContactInference) -> Result<(), ParleyError> {
        queries::contacts::record_inference(self.database()?, inference).await
    }
}

#[async_trait]
impl PreferenceStore for SqliteStorage {
    async fn fetch_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, ParleyError> {
        queries::preferences::get_preferences(self.database()?, user_id).await
    }
}

#[async_trait]
impl AnalyticsStore for SqliteStorage {
    async fn append_record(&self, record: &AnalyticsRecord) -> Result<(), ParleyError> {
        queries::analytics::insert_record(self.database()?, record).await
    }

    async fn update_feedback(
        &self,
        request_id: &str,
        user_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<bool, ParleyError> {
        queries::analytics::update_feedback(self.database()?, request_id, user_id, update).await
    }

    async fn query_records(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> Result<Vec<AnalyticsRecord>, ParleyError> {
        queries::analytics::query_records(self.database()?, user_id, range).await
    }
}

#[async_trait]
impl PromiseStore for SqliteStorage {
    async fn save_promise(&self, promise: &Promise) -> Result<(), ParleyError> {
        queries::promises::upsert_promise(self.database()?, promise).await
    }
}

#[async_trait]
impl MediaStore for SqliteStorage {
    async fn save_media(&self, record: &MediaRecord) -> Result<(), ParleyError> {
        queries::media::upsert_media(self.database()?, record).await
    }
}
