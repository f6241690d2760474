// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suggestion cache keyed by a fingerprint of (message content, user).
//!
//! Entries carry their own TTL, derived from the confidence of the cached
//! suggestions, and expire lazily on read. Every backend failure degrades
//! to a miss or a no-op.

pub mod fingerprint;
pub mod memory;
pub mod store;

pub use fingerprint::fingerprint;
pub use memory::MemoryCacheBackend;
pub use store::{CacheEntry, CacheStore, derive_ttl};
