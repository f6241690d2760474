// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits for the Parley response pipeline.

pub mod adapter;
pub mod cache;
pub mod clock;
pub mod provider;
pub mod sink;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cache::{CacheBackend, CacheStats};
pub use clock::{Clock, SystemClock};
pub use provider::{ModelProvider, TokenStream};
pub use sink::StreamSink;
pub use storage::{
    AnalyticsStore, ContactStore, ConversationStore, MediaStore, PreferenceStore, PromiseStore,
};
