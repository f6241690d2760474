// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of concrete adapters into the generator and job handlers.

use std::collections::HashMap;
use std::sync::Arc;

use parley_anthropic::AnthropicProvider;
use parley_cache::{CacheStore, MemoryCacheBackend};
use parley_config::ParleyConfig;
use parley_context::ContextBuilder;
use parley_core::{Clock, ParleyError, SystemClock};
use parley_generator::ResponseGenerator;
use parley_queue::{
    ContactInferenceHandler, JobHandler, JobKind, MediaHandler, PromiseHandler, ResponseHandler,
};
use parley_storage::SqliteStorage;
use tracing::info;

/// Opens the database and applies pending migrations.
pub async fn open_storage(config: &ParleyConfig) -> Result<Arc<SqliteStorage>, ParleyError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage ready");
    Ok(storage)
}

/// Everything a generation needs, built once per process.
pub struct Services {
    pub storage: Arc<SqliteStorage>,
    pub generator: Arc<ResponseGenerator>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    pub async fn connect(config: &ParleyConfig) -> Result<Self, ParleyError> {
        parley_generator::register_metrics();

        let storage = open_storage(config).await?;
        let provider = Arc::new(AnthropicProvider::new(&config.model)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(CacheStore::new(
            &config.cache,
            Arc::new(MemoryCacheBackend::new()),
            clock.clone(),
        ));
        let context = Arc::new(ContextBuilder::new(
            &config.context,
            storage.clone(),
            storage.clone(),
            storage.clone(),
        ));
        let generator = Arc::new(ResponseGenerator::new(
            config,
            provider,
            cache,
            context,
            storage.clone(),
            clock.clone(),
        ));
        info!(
            model = %config.model.model,
            single_flight = config.generator.single_flight,
            "response generator ready"
        );

        Ok(Self {
            storage,
            generator,
            clock,
        })
    }

    /// One handler per job kind. `responses` is shared so callers can subscribe.
    pub fn job_handlers(
        &self,
        responses: Arc<ResponseHandler>,
    ) -> HashMap<JobKind, Arc<dyn JobHandler>> {
        let mut handlers: HashMap<JobKind, Arc<dyn JobHandler>> = HashMap::new();
        handlers.insert(JobKind::Response, responses);
        handlers.insert(
            JobKind::PromiseDetection,
            Arc::new(PromiseHandler::new(self.storage.clone(), self.clock.clone())),
        );
        handlers.insert(
            JobKind::ContactInference,
            Arc::new(ContactInferenceHandler::new(
                self.storage.clone(),
                self.storage.clone(),
            )),
        );
        handlers.insert(
            JobKind::Media,
            Arc::new(MediaHandler::new(self.storage.clone(), self.clock.clone())),
        );
        handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::ConversationStore;

    fn config_in(dir: &tempfile::TempDir) -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.storage.database_path = dir.path().join("parley.db").display().to_string();
        config.model.api_key = Some("sk-test".into());
        config
    }

    #[tokio::test]
    async fn storage_opens_and_migrates_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let storage = open_storage(&config_in(&dir)).await.unwrap();
        assert_eq!(storage.count_messages("c-1").await.unwrap(), 0);
        assert!(dir.path().join("parley.db").exists());
    }

    #[tokio::test]
    async fn every_job_kind_gets_a_handler() {
        let dir = tempfile::tempdir().unwrap();
        let services = Services::connect(&config_in(&dir)).await.unwrap();
        let responses = Arc::new(ResponseHandler::new(services.generator.clone()));

        let handlers = services.job_handlers(responses);
        for kind in [
            JobKind::Response,
            JobKind::PromiseDetection,
            JobKind::ContactInference,
            JobKind::Media,
        ] {
            assert!(handlers.contains_key(&kind), "missing handler for {kind}");
        }
    }
}
