// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve`: JSONL ingest on stdin, generated responses on stdout.

use std::sync::Arc;

use parley_config::ParleyConfig;
use parley_core::types::{GeneratedResponse, IngestEvent};
use parley_core::{ConversationStore, ParleyError};
use parley_queue::{Orchestrator, ResponseHandler};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dedup::{DEDUP_WINDOW, RecentIds};
use crate::services::Services;
use crate::shutdown;

#[derive(Debug, Default)]
struct IngestCounts {
    accepted: u64,
    duplicates: u64,
    malformed: u64,
}

pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    info!("starting parley serve");

    let services = Services::connect(&config).await?;
    let orchestrator = Orchestrator::new(&config.queue);
    let responses = Arc::new(ResponseHandler::new(services.generator.clone()));
    let handlers = services.job_handlers(responses.clone());

    let shutdown = shutdown::install_signal_handler();
    let workers_cancel = shutdown.child_token();
    let workers = orchestrator.spawn_workers(&handlers, &workers_cancel);

    let printer = {
        let mut rx = responses.subscribe();
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            loop {
                match rx.recv().await {
                    Ok(response) => {
                        if let Err(e) = write_json_line(&mut stdout, &response).await {
                            warn!(request_id = %response.request_id, error = %e, "failed to write response");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "response output fell behind, responses dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let counts = ingest_stdin(&services, &orchestrator, &shutdown).await;
    info!(
        accepted = counts.accepted,
        duplicates = counts.duplicates,
        malformed = counts.malformed,
        "ingest finished"
    );

    workers_cancel.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "worker task ended abnormally");
        }
    }

    // The printer exits once every response sender is gone.
    drop(handlers);
    drop(responses);
    if let Err(e) = printer.await {
        warn!(error = %e, "response printer ended abnormally");
    }

    match services.storage.database() {
        Ok(db) => {
            if let Err(e) = db.checkpoint().await {
                warn!(error = %e, "WAL checkpoint failed on shutdown");
            }
        }
        Err(e) => warn!(error = %e, "storage unavailable on shutdown"),
    }

    info!("parley serve shutdown complete");
    Ok(())
}

/// Reads events until EOF or a shutdown signal. On EOF, waits for queued jobs to drain.
async fn ingest_stdin(
    services: &Services,
    orchestrator: &Orchestrator,
    shutdown: &CancellationToken,
) -> IngestCounts {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut recent = RecentIds::new(DEDUP_WINDOW);
    let mut counts = IngestCounts::default();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested, leaving queued jobs unprocessed");
                return counts;
            }
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                ingest_line(services, orchestrator, &mut recent, &mut counts, &line).await;
            }
            Ok(None) => {
                info!("stdin closed, draining queues");
                break;
            }
            Err(e) => {
                warn!(error = %e, "stdin read failed, draining queues");
                break;
            }
        }
    }

    tokio::select! {
        _ = orchestrator.wait_idle() => debug!("queues drained"),
        _ = shutdown.cancelled() => info!("shutdown requested while draining"),
    }
    counts
}

async fn ingest_line(
    services: &Services,
    orchestrator: &Orchestrator,
    recent: &mut RecentIds,
    counts: &mut IngestCounts,
    line: &str,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let event: IngestEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            counts.malformed += 1;
            warn!(error = %e, "skipping malformed ingest line");
            return;
        }
    };

    if !recent.insert(&event.external_message_id, Instant::now()) {
        counts.duplicates += 1;
        debug!(message_id = %event.external_message_id, "duplicate delivery suppressed");
        return;
    }

    // Jobs still run without the stored message, on thinner context.
    if let Err(e) = services.storage.record_message(&event).await {
        warn!(message_id = %event.external_message_id, error = %e, "failed to record message");
    }

    let jobs = orchestrator.ingest(&event).await;
    counts.accepted += 1;
    debug!(message_id = %event.external_message_id, jobs = jobs.len(), "message accepted");
}

async fn write_json_line<W>(out: &mut W, response: &GeneratedResponse) -> Result<(), ParleyError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)
        .map_err(|e| ParleyError::Internal(format!("failed to encode response: {e}")))?;
    line.push(b'\n');
    out.write_all(&line)
        .await
        .map_err(|e| ParleyError::Internal(format!("stdout write failed: {e}")))?;
    out.flush()
        .await
        .map_err(|e| ParleyError::Internal(format!("stdout flush failed: {e}")))?;
    Ok(())
}
