// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley response pipeline.

use thiserror::Error;

/// The primary error type used across all Parley collaborator traits and pipeline stages.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid values, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache backend errors. Always degraded to a miss by the cache store.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Model endpoint errors (HTTP failure, API error, stream interruption).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        /// Whether retrying the same request later may succeed.
        transient: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation exceeded its wall-clock budget.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Malformed data that could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Job queue errors (unknown job kind, payload decoding).
    #[error("queue error: {message}")]
    Queue { message: String },

    /// The consumer of a streaming response went away.
    #[error("operation cancelled by consumer")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Returns true when a later retry of the same work may succeed.
    ///
    /// The job queue uses this to log retries distinctly from permanent
    /// failures; every failure still consumes one attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ParleyError::Provider { transient, .. } => *transient,
            ParleyError::Timeout { .. } | ParleyError::Cache { .. } | ParleyError::Storage { .. } => {
                true
            }
            _ => false,
        }
    }

    /// Shorthand for a storage error wrapping any displayable cause.
    pub fn storage(message: impl Into<String>) -> Self {
        ParleyError::Storage {
            source: message.into().into(),
        }
    }
}
