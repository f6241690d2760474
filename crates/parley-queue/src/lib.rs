// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background work for the Parley pipeline.
//!
//! Each inbound message fans out through the [`Orchestrator`] routing table
//! into per-kind [`JobQueue`]s. Worker loops lease jobs, run the matching
//! [`JobHandler`] and retry failures with exponential backoff.

pub mod handlers;
pub mod job;
pub mod orchestrator;
pub mod queue;
pub mod worker;

pub use handlers::{ContactInferenceHandler, MediaHandler, PromiseHandler, ResponseHandler};
pub use job::{BackoffPolicy, Job, JobId, JobKind, JobPayload};
pub use orchestrator::{Orchestrator, ROUTES, Route, plan};
pub use queue::{FailDisposition, FinishedJob, JobQueue, QueueStats};
pub use worker::{JobHandler, run_worker};
