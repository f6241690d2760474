// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply suggestion generation for inbound messages.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::types::GeneratedResponse;
use parley_generator::ResponseGenerator;
use tokio::sync::broadcast;
use tracing::debug;

use crate::job::{Job, JobPayload};
use crate::worker::JobHandler;

/// Generated responses buffered for slow subscribers before they lag.
const BROADCAST_CAPACITY: usize = 256;

/// Runs the generator for a message and publishes the result.
///
/// Model failures are returned as errors so the queue retries with backoff.
pub struct ResponseHandler {
    generator: Arc<ResponseGenerator>,
    tx: broadcast::Sender<GeneratedResponse>,
}

impl ResponseHandler {
    pub fn new(generator: Arc<ResponseGenerator>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { generator, tx }
    }

    /// Receives every response generated from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GeneratedResponse> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl JobHandler for ResponseHandler {
    async fn handle(&self, job: &Job) -> Result<(), ParleyError> {
        let JobPayload::Response(event) = &job.payload else {
            return Err(ParleyError::Queue {
                message: format!("response handler got a {} job", job.kind()),
            });
        };

        let response = self
            .generator
            .try_generate(
                &event.external_message_id,
                &event.body,
                &event.user_id,
                event.chat_type,
                None,
            )
            .await?;

        // No subscribers is fine; the response is cached either way.
        let receivers = self.tx.send(response).unwrap_or(0);
        debug!(message_id = %event.external_message_id, receivers, "response published");
        Ok(())
    }
}
