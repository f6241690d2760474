// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process cache backend on `DashMap`.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::types::{AdapterType, HealthStatus};
use parley_core::{CacheBackend, CacheStats, ParleyError, PluginAdapter};

/// Concurrent map backend. Shared by cloning the surrounding `Arc`.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    values: DashMap<String, String>,
    indexes: DashMap<String, HashSet<String>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryCacheBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        self.values.clear();
        self.indexes.clear();
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ParleyError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, ParleyError> {
        Ok(keys
            .iter()
            .filter(|key| self.values.remove(key.as_str()).is_some())
            .count() as u64)
    }

    async fn index_add(&self, index: &str, member: &str) -> Result<(), ParleyError> {
        self.indexes
            .entry(index.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn index_members(&self, index: &str) -> Result<Vec<String>, ParleyError> {
        Ok(self
            .indexes
            .get(index)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn index_remove_member(&self, index: &str, member: &str) -> Result<(), ParleyError> {
        if let Some(mut set) = self.indexes.get_mut(index) {
            set.remove(member);
        }
        self.indexes.remove_if(index, |_, set| set.is_empty());
        Ok(())
    }

    async fn index_remove(&self, index: &str) -> Result<(), ParleyError> {
        self.indexes.remove(index);
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, ParleyError> {
        let value_bytes: usize = self
            .values
            .iter()
            .map(|e| e.key().len() + e.value().len())
            .sum();
        let index_bytes: usize = self
            .indexes
            .iter()
            .map(|e| e.key().len() + e.value().iter().map(String::len).sum::<usize>())
            .sum();
        Ok(CacheStats {
            total_keys: self.values.len() as u64,
            memory_usage: (value_bytes + index_bytes) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let backend = MemoryCacheBackend::new();
        backend.set("k", "v".into()).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(
            backend.delete(&["k".into(), "missing".into()]).await.unwrap(),
            1
        );
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn index_members_are_deduplicated() {
        let backend = MemoryCacheBackend::new();
        backend.index_add("idx", "a").await.unwrap();
        backend.index_add("idx", "a").await.unwrap();
        backend.index_add("idx", "b").await.unwrap();
        let mut members = backend.index_members("idx").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b"]);
        backend.index_remove("idx").await.unwrap();
        assert!(backend.index_members("idx").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_the_last_member_drops_the_index() {
        let backend = MemoryCacheBackend::new();
        backend.index_add("idx", "a").await.unwrap();
        backend.index_add("idx", "b").await.unwrap();

        backend.index_remove_member("idx", "a").await.unwrap();
        assert_eq!(backend.index_members("idx").await.unwrap(), vec!["b"]);

        backend.index_remove_member("idx", "b").await.unwrap();
        backend.index_remove_member("missing", "b").await.unwrap();
        assert!(backend.indexes.is_empty());
    }

    #[tokio::test]
    async fn shutdown_drops_everything() {
        let backend = MemoryCacheBackend::new();
        backend.set("k", "v".into()).await.unwrap();
        backend.shutdown().await.unwrap();
        assert_eq!(backend.stats().await.unwrap(), CacheStats::default());
    }
}
