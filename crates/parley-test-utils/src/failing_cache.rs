// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache backend that is always down.

use async_trait::async_trait;
use parley_core::types::{AdapterType, HealthStatus};
use parley_core::{CacheBackend, CacheStats, ParleyError, PluginAdapter};

pub struct FailingCacheBackend;

fn unavailable() -> ParleyError {
    ParleyError::Cache {
        message: "connection refused".into(),
    }
}

#[async_trait]
impl PluginAdapter for FailingCacheBackend {
    fn name(&self) -> &str {
        "failing-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Unhealthy("connection refused".into()))
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, ParleyError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), ParleyError> {
        Err(unavailable())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, ParleyError> {
        Err(unavailable())
    }

    async fn index_add(&self, _index: &str, _member: &str) -> Result<(), ParleyError> {
        Err(unavailable())
    }

    async fn index_members(&self, _index: &str) -> Result<Vec<String>, ParleyError> {
        Err(unavailable())
    }

    async fn index_remove_member(&self, _index: &str, _member: &str) -> Result<(), ParleyError> {
        Err(unavailable())
    }

    async fn index_remove(&self, _index: &str) -> Result<(), ParleyError> {
        Err(unavailable())
    }

    async fn stats(&self) -> Result<CacheStats, ParleyError> {
        Err(unavailable())
    }
}
