// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Later layers win: compiled defaults, `/etc/parley/parley.toml`,
//! `~/.config/parley/parley.toml`, `./parley.toml`, then `PARLEY_*`.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// Config files in merge order, lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/parley/parley.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("parley").join("parley.toml"));
    }
    paths.push(PathBuf::from("parley.toml"));
    paths
}

/// Builds the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(ParleyConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Loads configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from a TOML string over the defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads configuration from one explicit file, with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Section prefixes, longest first so `queue_response_` wins over a bare `queue_`.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("queue_promise_detection_", "queue.promise_detection."),
    ("queue_contact_inference_", "queue.contact_inference."),
    ("queue_response_", "queue.response."),
    ("queue_media_", "queue.media."),
    ("generator_", "generator."),
    ("service_", "service."),
    ("context_", "context."),
    ("storage_", "storage."),
    ("model_", "model."),
    ("cache_", "cache."),
];

/// Maps `PARLEY_MODEL_API_KEY` to `model.api_key`.
///
/// Uses an explicit prefix table instead of `Env::split("_")`, since key
/// names contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for (prefix, section) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_nested_sections() {
        assert_eq!(map_env_key("model_api_key"), "model.api_key");
        assert_eq!(map_env_key("cache_base_ttl_secs"), "cache.base_ttl_secs");
        assert_eq!(
            map_env_key("queue_contact_inference_delay_ms"),
            "queue.contact_inference.delay_ms"
        );
        assert_eq!(map_env_key("queue_response_max_attempts"), "queue.response.max_attempts");
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn env_override_reaches_nested_queue_policy() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_QUEUE_RESPONSE_MAX_ATTEMPTS", "7");
            jail.set_env("PARLEY_MODEL_TEMPERATURE", "0.4");
            let config: ParleyConfig = Figment::new()
                .merge(Serialized::defaults(ParleyConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.queue.response.max_attempts, 7);
            assert!((config.model.temperature - 0.4).abs() < f32::EPSILON);
            // Untouched kind-specific defaults survive the override.
            assert_eq!(config.queue.response.delay_ms, 1000);
            Ok(())
        });
    }
}
