// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumer side of a streaming generation.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::GeneratedResponse;

/// Receives partial tokens while a response is generated.
///
/// A generation delivers any number of `on_token` calls followed by exactly
/// one of `on_complete` or `on_error`.
#[async_trait]
pub trait StreamSink: Send + Sync {
    async fn on_token(&self, token: &str);

    async fn on_complete(&self, response: &GeneratedResponse);

    async fn on_error(&self, error: &ParleyError);

    /// True once the consumer has gone away. Token forwarding stops at that point.
    fn is_closed(&self) -> bool {
        false
    }
}
