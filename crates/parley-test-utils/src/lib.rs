// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Parley collaborator traits.
//!
//! Everything here is deterministic and in-process so pipeline tests run
//! without a model endpoint, a database or a real clock.

pub mod clock;
pub mod failing_cache;
pub mod memory_store;
pub mod mock_provider;
pub mod recording_sink;

pub use clock::ManualClock;
pub use failing_cache::FailingCacheBackend;
pub use memory_store::MemoryStore;
pub use mock_provider::{DEFAULT_REPLY, MockProvider, MockReply};
pub use recording_sink::{RecordingSink, SinkEvent};
