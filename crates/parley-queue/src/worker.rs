// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker loops that pull jobs from a queue and run a handler on them.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::Job;
use crate::queue::{FailDisposition, JobQueue};

/// Executes one job kind. Handlers must tolerate running the same job twice.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), ParleyError>;
}

fn record_job(job: &Job, outcome: &'static str) {
    metrics::counter!(
        "parley_jobs_total",
        "kind" => job.kind().as_ref().to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Runs jobs from `queue` until `cancel` fires.
///
/// Cancellation is observed between jobs, so a job already running finishes
/// and is acked or failed before the loop exits.
pub async fn run_worker(
    worker_id: usize,
    queue: Arc<JobQueue>,
    handler: Arc<dyn JobHandler>,
    cancel: CancellationToken,
) {
    let kind = queue.kind();
    debug!(%kind, worker_id, "worker started");

    while let Some(job) = queue.next(&cancel).await {
        debug!(%kind, worker_id, job_id = job.id, attempt = job.attempts, "running job");
        match handler.handle(&job).await {
            Ok(()) => {
                queue.ack(job.id).await;
                record_job(&job, "completed");
            }
            Err(e) => {
                let reason = e.to_string();
                match queue.fail(job.id, &reason).await {
                    FailDisposition::Retry { attempt, delay } => {
                        warn!(
                            %kind,
                            job_id = job.id,
                            attempt,
                            transient = e.is_transient(),
                            retry_in_ms = delay.as_millis() as u64,
                            error = %e,
                            "job failed, retrying"
                        );
                        record_job(&job, "retried");
                    }
                    FailDisposition::Exhausted => record_job(&job, "failed"),
                    FailDisposition::Unknown => {}
                }
            }
        }
    }

    info!(%kind, worker_id, "worker stopped");
}
