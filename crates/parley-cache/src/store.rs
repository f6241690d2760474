// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache store: fingerprinting, TTL policy, lazy eviction and per-user clearing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_config::model::CacheConfig;
use parley_core::types::{GeneratedResponse, MessageType};
use parley_core::{CacheBackend, CacheStats, Clock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fingerprint::fingerprint;

/// A cached suggestion set with its own freshness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Suggestions exactly as returned to the first caller.
    pub suggestions: Vec<String>,
    pub confidence: f64,
    pub reasoning: Option<String>,
    /// Intent detected when the entry was generated.
    pub message_type: MessageType,
    /// Clock time of the write. Freshness is measured from here.
    pub created_at: DateTime<Utc>,
    /// Lifetime in seconds. The entry is still live at exactly this age.
    pub ttl_seconds: u64,
}

impl CacheEntry {
    /// Seconds elapsed since the entry was written, saturating at zero.
    fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age_seconds(now) > self.ttl_seconds as i64
    }

    /// Rebuilds a caller-facing response for a new triggering request.
    pub fn into_response(self, request_id: &str) -> GeneratedResponse {
        GeneratedResponse {
            request_id: request_id.to_string(),
            suggestions: self.suggestions,
            confidence: self.confidence,
            reasoning: self.reasoning,
            message_type: self.message_type,
            cached: true,
        }
    }
}

/// TTL for an entry of the given confidence: a non-decreasing step function of `confidence`.
pub fn derive_ttl(confidence: f64, base_ttl_secs: u64) -> u64 {
    if confidence >= 0.9 {
        base_ttl_secs.saturating_mul(4)
    } else if confidence >= 0.7 {
        base_ttl_secs.saturating_mul(2)
    } else if confidence >= 0.5 {
        base_ttl_secs
    } else {
        base_ttl_secs / 2
    }
}

/// Suggestion cache in front of a [`CacheBackend`].
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    base_ttl_secs: u64,
    key_prefix: String,
    fingerprint_hex_len: usize,
}

impl CacheStore {
    pub fn new(config: &CacheConfig, backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            base_ttl_secs: config.base_ttl_secs,
            key_prefix: config.key_prefix.clone(),
            fingerprint_hex_len: config.fingerprint_hex_len,
        }
    }

    /// Fingerprint used for keys and single-flight grouping.
    pub fn fingerprint(&self, content: &str, user_id: &str) -> String {
        fingerprint(content, user_id, self.fingerprint_hex_len)
    }

    fn entry_key(&self, fingerprint: &str) -> String {
        format!("{}:{fingerprint}", self.key_prefix)
    }

    fn user_index_key(&self, user_id: &str) -> String {
        format!("{}:user:{user_id}", self.key_prefix)
    }

    /// Returns the live entry for `(content, user_id)`, evicting it if it has expired.
    pub async fn get(&self, content: &str, user_id: &str) -> Option<CacheEntry> {
        let key = self.entry_key(&self.fingerprint(content, user_id));

        let raw = match self.backend.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::counter!("parley_cache_misses_total").increment(1);
                return None;
            }
            Err(e) => {
                warn!(error = %e, key = %key, "cache read failed, treating as miss");
                metrics::counter!("parley_cache_misses_total").increment(1);
                return None;
            }
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, key = %key, "undecodable cache entry, evicting");
                self.evict(&key, user_id).await;
                metrics::counter!("parley_cache_misses_total").increment(1);
                return None;
            }
        };

        if entry.is_expired(self.clock.now()) {
            debug!(key = %key, ttl = entry.ttl_seconds, "cache entry expired, evicting");
            self.evict(&key, user_id).await;
            metrics::counter!("parley_cache_misses_total").increment(1);
            return None;
        }

        metrics::counter!("parley_cache_hits_total").increment(1);
        Some(entry)
    }

    /// Stores a response under `(content, user_id)`.
    ///
    /// Without `ttl_override` the TTL follows [`derive_ttl`] on the response confidence.
    pub async fn set(
        &self,
        content: &str,
        user_id: &str,
        response: &GeneratedResponse,
        ttl_override: Option<u64>,
    ) {
        let key = self.entry_key(&self.fingerprint(content, user_id));
        let entry = CacheEntry {
            suggestions: response.suggestions.clone(),
            confidence: response.confidence,
            reasoning: response.reasoning.clone(),
            message_type: response.message_type,
            created_at: self.clock.now(),
            ttl_seconds: ttl_override
                .unwrap_or_else(|| derive_ttl(response.confidence, self.base_ttl_secs)),
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.backend.set(&key, raw).await {
            warn!(error = %e, key = %key, "cache write failed");
            return;
        }
        if let Err(e) = self
            .backend
            .index_add(&self.user_index_key(user_id), &key)
            .await
        {
            warn!(error = %e, user_id, "cache user index update failed");
        }
        debug!(key = %key, ttl = entry.ttl_seconds, "cache entry stored");
    }

    /// Removes every entry written for `user_id`. Returns how many were removed.
    pub async fn clear_for_user(&self, user_id: &str) -> u64 {
        let index = self.user_index_key(user_id);
        let keys = match self.backend.index_members(&index).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, user_id, "cache user index read failed");
                return 0;
            }
        };

        let removed = match self.backend.delete(&keys).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, user_id, "cache clear failed");
                return 0;
            }
        };
        if let Err(e) = self.backend.index_remove(&index).await {
            warn!(error = %e, user_id, "cache user index removal failed");
        }
        debug!(user_id, removed, "cleared user cache");
        removed
    }

    /// Entry count and memory footprint. Zeroes when the backend is unavailable.
    pub async fn stats(&self) -> CacheStats {
        self.backend.stats().await.unwrap_or_else(|e| {
            warn!(error = %e, "cache stats unavailable");
            CacheStats::default()
        })
    }

    /// Deletes `key` and drops it from the owner's index.
    async fn evict(&self, key: &str, user_id: &str) {
        if let Err(e) = self.backend.delete(&[key.to_string()]).await {
            warn!(error = %e, key, "cache eviction failed");
        }
        if let Err(e) = self
            .backend
            .index_remove_member(&self.user_index_key(user_id), key)
            .await
        {
            warn!(error = %e, user_id, "cache user index update failed");
        }
    }
}
