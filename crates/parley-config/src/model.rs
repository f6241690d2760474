// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    /// Language model endpoint.
    #[serde(default)]
    pub model: ModelConfig,

    /// Suggestion cache.
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-kind job queue policies.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Process identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Wall-clock budget for one model invocation, streaming included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

/// Suggestion cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL for a confidence-0.5 entry. Other confidences scale it.
    #[serde(default = "default_base_ttl_secs")]
    pub base_ttl_secs: u64,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Hex characters kept from the SHA-256 fingerprint.
    #[serde(default = "default_fingerprint_hex_len")]
    pub fingerprint_hex_len: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl_secs: default_base_ttl_secs(),
            key_prefix: default_key_prefix(),
            fingerprint_hex_len: default_fingerprint_hex_len(),
        }
    }
}

fn default_base_ttl_secs() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "parley:suggest".to_string()
}

fn default_fingerprint_hex_len() -> usize {
    32
}

/// Context assembly settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> usize {
    20
}

/// Response generator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Suggestions requested from the model (1 to 3).
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,

    /// Serialize concurrent generations for the same fingerprint in-process.
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            suggestion_count: default_suggestion_count(),
            single_flight: default_single_flight(),
        }
    }
}

fn default_suggestion_count() -> usize {
    3
}

fn default_single_flight() -> bool {
    true
}

/// SQLite persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .to_string_lossy()
        .into_owned()
}

/// One policy per job kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    #[serde(default)]
    pub response: QueuePolicyConfig,

    #[serde(default)]
    pub promise_detection: QueuePolicyConfig,

    #[serde(default)]
    pub contact_inference: QueuePolicyConfig,

    #[serde(default)]
    pub media: QueuePolicyConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            response: QueuePolicyConfig {
                delay_ms: 1000,
                priority: 10,
                concurrency: 4,
                ..QueuePolicyConfig::default()
            },
            promise_detection: QueuePolicyConfig {
                priority: 5,
                ..QueuePolicyConfig::default()
            },
            contact_inference: QueuePolicyConfig {
                delay_ms: 5000,
                priority: 1,
                ..QueuePolicyConfig::default()
            },
            media: QueuePolicyConfig {
                priority: 1,
                backoff_base_ms: 5000,
                ..QueuePolicyConfig::default()
            },
        }
    }
}

/// Retry, delay and retention policy for one job queue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueuePolicyConfig {
    /// Delay before a freshly enqueued job becomes runnable.
    #[serde(default)]
    pub delay_ms: u64,

    /// Higher runs first among ready jobs.
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay; doubles per attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Worker loops pulling from this queue.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_keep_completed")]
    pub keep_completed: usize,

    #[serde(default = "default_keep_failed")]
    pub keep_failed: usize,
}

impl Default for QueuePolicyConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            priority: 0,
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            concurrency: default_concurrency(),
            keep_completed: default_keep_completed(),
            keep_failed: default_keep_failed(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_concurrency() -> usize {
    1
}

fn default_keep_completed() -> usize {
    100
}

fn default_keep_failed() -> usize {
    500
}
