// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job kinds, payloads and retry policy.

use std::time::Duration;

use parley_config::model::{QueueConfig, QueuePolicyConfig};
use parley_core::types::{Attachment, IngestEvent};
use strum::{AsRefStr, Display, EnumIter};
use tokio::time::Instant;

/// Queue-assigned job identifier, unique within one queue.
pub type JobId = u64;

/// Which queue a job belongs to. Each kind has its own queue and workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    /// Suggested replies for an inbound message.
    Response,
    /// Commitments made in either direction.
    PromiseDetection,
    /// Name and relationship guesses for a contact.
    ContactInference,
    /// One attachment to catalogue.
    Media,
}

impl JobKind {
    /// This kind's section of the `[queue]` config.
    pub fn policy(self, config: &QueueConfig) -> &QueuePolicyConfig {
        match self {
            JobKind::Response => &config.response,
            JobKind::PromiseDetection => &config.promise_detection,
            JobKind::ContactInference => &config.contact_inference,
            JobKind::Media => &config.media,
        }
    }
}

/// Work carried by a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Response(IngestEvent),
    PromiseDetection(IngestEvent),
    ContactInference {
        contact_id: String,
        conversation_id: String,
    },
    Media {
        message_id: String,
        /// Position of the attachment within its message.
        index: usize,
        attachment: Attachment,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Response(_) => JobKind::Response,
            JobPayload::PromiseDetection(_) => JobKind::PromiseDetection,
            JobPayload::ContactInference { .. } => JobKind::ContactInference,
            JobPayload::Media { .. } => JobKind::Media,
        }
    }

    /// Pending jobs sharing a key are merged into one.
    pub fn coalesce_key(&self) -> Option<String> {
        match self {
            JobPayload::ContactInference { contact_id, .. } => Some(format!("contact:{contact_id}")),
            _ => None,
        }
    }
}

/// Exponential backoff: the n-th retry waits `base * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Wait before the first retry.
    pub base: Duration,
    /// Total attempts, the first run included. At least 1.
    pub max_attempts: u32,
}

/// Doubling stops here so the multiplier cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 16;

impl BackoffPolicy {
    pub fn from_config(policy: &QueuePolicyConfig) -> Self {
        Self {
            base: Duration::from_millis(policy.backoff_base_ms),
            max_attempts: policy.max_attempts.max(1),
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base.saturating_mul(1u32 << exponent)
    }
}

/// A unit of queued work.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub payload: JobPayload,
    /// Higher runs first among ready jobs.
    pub priority: i32,
    /// Attempts started so far, including the current one while leased.
    pub attempts: u32,
    pub backoff: BackoffPolicy,
    /// Not runnable before this instant.
    pub run_at: Instant,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }

    pub fn attempts_left(&self) -> u32 {
        self.backoff.max_attempts.saturating_sub(self.attempts)
    }
}
