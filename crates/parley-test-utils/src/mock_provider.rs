// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted model endpoint.
//!
//! Replies are popped from a FIFO queue. When the queue is empty,
//! [`DEFAULT_REPLY`] is returned.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use parley_core::types::{AdapterType, Completion, CompletionRequest, HealthStatus};
use parley_core::{ModelProvider, ParleyError, PluginAdapter, TokenStream};
use tokio::sync::Mutex;

/// Well-formed model output used when nothing else is scripted.
pub const DEFAULT_REPLY: &str = r#"{"suggestions":["Sounds good!","Sure, let's do it.","Thanks for letting me know!"],"confidence":0.85,"reasoning":"friendly acknowledgement"}"#;

/// One scripted model behaviour.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Full text; streamed as word-sized tokens.
    Text(String),
    /// Exact token sequence; joined for batch calls.
    Tokens(Vec<String>),
    /// The call fails before producing output.
    Error { message: String, transient: bool },
    /// Streams the tokens, then fails.
    StreamError { tokens: Vec<String>, message: String },
    /// Waits before behaving like the inner reply.
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn transient_error(message: impl Into<String>) -> Self {
        MockReply::Error {
            message: message.into(),
            transient: true,
        }
    }
}

pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider answering with the given texts, in order.
    pub fn with_responses(texts: Vec<&str>) -> Self {
        Self::with_replies(texts.into_iter().map(MockReply::text).collect())
    }

    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `complete` plus `stream` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self, request: CompletionRequest) -> MockReply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        let mut reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::text(DEFAULT_REPLY));
        while let MockReply::Delayed(delay, inner) = reply {
            tokio::time::sleep(delay).await;
            reply = *inner;
        }
        reply
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn provider_error(message: String, transient: bool) -> ParleyError {
    ParleyError::Provider {
        message,
        transient,
        source: None,
    }
}

fn word_tokens(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ParleyError> {
        let model = request.model.clone();
        let text = match self.next_reply(request).await {
            MockReply::Text(text) => text,
            MockReply::Tokens(tokens) => tokens.concat(),
            MockReply::Error { message, transient } => {
                return Err(provider_error(message, transient));
            }
            MockReply::StreamError { message, .. } => return Err(provider_error(message, true)),
            MockReply::Delayed(..) => unreachable!("delays are unwrapped by next_reply"),
        };
        Ok(Completion {
            text,
            model,
            input_tokens: 10,
            output_tokens: 20,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TokenStream, ParleyError> {
        let items: Vec<Result<String, ParleyError>> = match self.next_reply(request).await {
            MockReply::Text(text) => word_tokens(&text).into_iter().map(Ok).collect(),
            MockReply::Tokens(tokens) => tokens.into_iter().map(Ok).collect(),
            MockReply::Error { message, transient } => {
                return Err(provider_error(message, transient));
            }
            MockReply::StreamError { tokens, message } => tokens
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(provider_error(message, true))))
                .collect(),
            MockReply::Delayed(..) => unreachable!("delays are unwrapped by next_reply"),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}
