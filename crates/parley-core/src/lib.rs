// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley response pipeline.
//!
//! Holds the error type, the domain types that flow between pipeline stages,
//! and the collaborator traits (persistence, model endpoint, cache backend,
//! streaming sink) that every other crate is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ParleyError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{
    AnalyticsStore, CacheBackend, CacheStats, Clock, ContactStore, ConversationStore, MediaStore,
    ModelProvider, PluginAdapter, PreferenceStore, PromiseStore, StreamSink, SystemClock,
    TokenStream,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Storage, AdapterType::Cache] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
    }

    #[test]
    fn all_collaborator_traits_are_object_safe() {
        fn _provider(_: &dyn ModelProvider) {}
        fn _cache(_: &dyn CacheBackend) {}
        fn _conversations(_: &dyn ConversationStore) {}
        fn _contacts(_: &dyn ContactStore) {}
        fn _preferences(_: &dyn PreferenceStore) {}
        fn _analytics(_: &dyn AnalyticsStore) {}
        fn _promises(_: &dyn PromiseStore) {}
        fn _media(_: &dyn MediaStore) {}
        fn _sink(_: &dyn StreamSink) {}
        fn _clock(_: &dyn Clock) {}
    }
}
