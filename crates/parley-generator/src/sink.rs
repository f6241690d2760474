// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel-backed stream sink.

use async_trait::async_trait;
use parley_core::types::GeneratedResponse;
use parley_core::{ParleyError, StreamSink};
use tokio::sync::mpsc;

/// One streaming notification, as delivered over a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(String),
    Complete(GeneratedResponse),
    /// Rendered error; the error type itself is not `Clone`.
    Error(String),
}

/// Forwards sink callbacks into an mpsc channel.
///
/// Closed once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// A sink plus the receiving half of a fresh channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    async fn send(&self, event: StreamEvent) {
        // A dropped receiver is reported through is_closed.
        let _ = self.tx.send(event).await;
    }
}

#[async_trait]
impl StreamSink for ChannelSink {
    async fn on_token(&self, token: &str) {
        self.send(StreamEvent::Token(token.to_string())).await;
    }

    async fn on_complete(&self, response: &GeneratedResponse) {
        self.send(StreamEvent::Complete(response.clone())).await;
    }

    async fn on_error(&self, error: &ParleyError) {
        self.send(StreamEvent::Error(error.to_string())).await;
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
