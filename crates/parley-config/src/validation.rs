// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for constraints serde cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{ParleyConfig, QueuePolicyConfig};

/// Validates a deserialized configuration, collecting every error instead of failing fast.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !(0.0..=1.0).contains(&config.model.temperature) {
        errors.push(invalid(format!(
            "model.temperature must be between 0.0 and 1.0, got {}",
            config.model.temperature
        )));
    }

    if config.model.max_tokens == 0 {
        errors.push(invalid("model.max_tokens must be greater than 0"));
    }

    if config.model.timeout_secs == 0 {
        errors.push(invalid("model.timeout_secs must be greater than 0"));
    }

    if config.cache.base_ttl_secs == 0 {
        errors.push(invalid("cache.base_ttl_secs must be greater than 0"));
    }

    if !(8..=64).contains(&config.cache.fingerprint_hex_len) {
        errors.push(invalid(format!(
            "cache.fingerprint_hex_len must be between 8 and 64, got {}",
            config.cache.fingerprint_hex_len
        )));
    }

    if config.context.max_messages == 0 {
        errors.push(invalid("context.max_messages must be at least 1"));
    }

    if !(1..=3).contains(&config.generator.suggestion_count) {
        errors.push(invalid(format!(
            "generator.suggestion_count must be between 1 and 3, got {}",
            config.generator.suggestion_count
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty"));
    }

    let queues = [
        ("response", &config.queue.response),
        ("promise_detection", &config.queue.promise_detection),
        ("contact_inference", &config.queue.contact_inference),
        ("media", &config.queue.media),
    ];
    for (name, policy) in queues {
        validate_queue_policy(name, policy, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_queue_policy(name: &str, policy: &QueuePolicyConfig, errors: &mut Vec<ConfigError>) {
    if policy.max_attempts == 0 {
        errors.push(invalid(format!(
            "queue.{name}.max_attempts must be at least 1"
        )));
    }
    if policy.concurrency == 0 {
        errors.push(invalid(format!(
            "queue.{name}.concurrency must be at least 1"
        )));
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
