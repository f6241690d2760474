// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value backend behind the suggestion cache.
//!
//! The backend stores opaque strings plus named member sets used as reverse
//! indexes. Expiry policy lives above it, in the cache store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;

/// Size of the backing store, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Live value keys, excluding indexes.
    pub total_keys: u64,
    /// Approximate bytes held by keys, values and indexes.
    pub memory_usage: u64,
}

#[async_trait]
pub trait CacheBackend: PluginAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, ParleyError>;

    /// Last write wins.
    async fn set(&self, key: &str, value: String) -> Result<(), ParleyError>;

    /// Removes the given keys and returns how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, ParleyError>;

    /// Adds `member` to the set named `index`, creating the set if needed.
    async fn index_add(&self, index: &str, member: &str) -> Result<(), ParleyError>;

    async fn index_members(&self, index: &str) -> Result<Vec<String>, ParleyError>;

    /// Drops a single member. An index left empty is removed.
    async fn index_remove_member(&self, index: &str, member: &str) -> Result<(), ParleyError>;

    /// Drops the whole set.
    async fn index_remove(&self, index: &str) -> Result<(), ParleyError>;

    async fn stats(&self) -> Result<CacheStats, ParleyError>;
}
