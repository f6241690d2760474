// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model endpoint trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Completion, CompletionRequest};

/// Incremental text deltas from a streaming completion, ending when the model stops.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ParleyError>> + Send>>;

/// A language model endpoint supporting batch and streaming completion.
#[async_trait]
pub trait ModelProvider: PluginAdapter {
    /// Sends a completion request and returns the full response text.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ParleyError>;

    /// Sends a completion request and returns a stream of text deltas.
    async fn stream(&self, request: CompletionRequest) -> Result<TokenStream, ParleyError>;
}
