// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream sink that remembers everything it was told.

use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::types::GeneratedResponse;
use parley_core::{ParleyError, StreamSink};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Token(String),
    Complete(GeneratedResponse),
    Error(String),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    close_after_tokens: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports closed once `n` tokens have been received.
    pub fn closing_after(n: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            close_after_tokens: Some(n),
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Token(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<GeneratedResponse> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Complete(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}

#[async_trait]
impl StreamSink for RecordingSink {
    async fn on_token(&self, token: &str) {
        self.push(SinkEvent::Token(token.to_string()));
    }

    async fn on_complete(&self, response: &GeneratedResponse) {
        self.push(SinkEvent::Complete(response.clone()));
    }

    async fn on_error(&self, error: &ParleyError) {
        self.push(SinkEvent::Error(error.to_string()));
    }

    fn is_closed(&self) -> bool {
        self.close_after_tokens
            .is_some_and(|n| self.tokens().len() >= n)
    }
}
