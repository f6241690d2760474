// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of ingest events into per-kind job queues.
//!
//! Which jobs an event produces is decided by [`ROUTES`], a static table that
//! can be inspected and tested without starting any worker.

use std::collections::HashMap;
use std::sync::Arc;

use parley_config::model::QueueConfig;
use parley_core::types::IngestEvent;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::{JobId, JobKind, JobPayload};
use crate::queue::{JobQueue, QueueStats};
use crate::worker::{JobHandler, run_worker};

/// One row of the routing table: the payloads an event yields for `kind`.
pub struct Route {
    pub kind: JobKind,
    pub fan_out: fn(&IngestEvent) -> Vec<JobPayload>,
}

/// Every event feeds promise detection and media. Replies and contact
/// inference only follow messages from someone else.
pub static ROUTES: &[Route] = &[
    Route {
        kind: JobKind::PromiseDetection,
        fan_out: promise_jobs,
    },
    Route {
        kind: JobKind::Response,
        fan_out: response_jobs,
    },
    Route {
        kind: JobKind::ContactInference,
        fan_out: contact_jobs,
    },
    Route {
        kind: JobKind::Media,
        fan_out: media_jobs,
    },
];

fn promise_jobs(event: &IngestEvent) -> Vec<JobPayload> {
    vec![JobPayload::PromiseDetection(event.clone())]
}

fn response_jobs(event: &IngestEvent) -> Vec<JobPayload> {
    if event.from_self {
        return Vec::new();
    }
    vec![JobPayload::Response(event.clone())]
}

fn contact_jobs(event: &IngestEvent) -> Vec<JobPayload> {
    match (&event.sender_external_id, event.from_self) {
        (Some(contact_id), false) => vec![JobPayload::ContactInference {
            contact_id: contact_id.clone(),
            conversation_id: event.conversation_id.clone(),
        }],
        _ => Vec::new(),
    }
}

fn media_jobs(event: &IngestEvent) -> Vec<JobPayload> {
    event
        .attachments
        .iter()
        .enumerate()
        .map(|(index, attachment)| JobPayload::Media {
            message_id: event.external_message_id.clone(),
            index,
            attachment: attachment.clone(),
        })
        .collect()
}

/// Payloads an event produces, in routing table order.
pub fn plan(event: &IngestEvent) -> Vec<JobPayload> {
    ROUTES.iter().flat_map(|route| (route.fan_out)(event)).collect()
}

/// Owns one queue per job kind and dispatches events into them.
pub struct Orchestrator {
    queues: HashMap<JobKind, Arc<JobQueue>>,
    config: QueueConfig,
}

impl Orchestrator {
    pub fn new(config: &QueueConfig) -> Self {
        let queues = JobKind::iter()
            .map(|kind| (kind, Arc::new(JobQueue::new(kind, kind.policy(config)))))
            .collect();
        Self {
            queues,
            config: config.clone(),
        }
    }

    pub fn queue(&self, kind: JobKind) -> Option<&Arc<JobQueue>> {
        self.queues.get(&kind)
    }

    /// Enqueues the jobs `event` fans out to. Does not deduplicate.
    pub async fn ingest(&self, event: &IngestEvent) -> Vec<(JobKind, JobId)> {
        let mut enqueued = Vec::new();
        for payload in plan(event) {
            let kind = payload.kind();
            let Some(queue) = self.queues.get(&kind) else {
                warn!(%kind, "no queue for job kind");
                continue;
            };
            enqueued.push((kind, queue.enqueue(payload).await));
        }
        debug!(
            message_id = %event.external_message_id,
            from_self = event.from_self,
            jobs = enqueued.len(),
            "event dispatched"
        );
        enqueued
    }

    /// Starts `concurrency` workers for every kind that has a handler.
    pub fn spawn_workers(
        &self,
        handlers: &HashMap<JobKind, Arc<dyn JobHandler>>,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let mut workers = Vec::new();
        for (kind, queue) in &self.queues {
            let Some(handler) = handlers.get(kind) else {
                warn!(%kind, "no handler registered, jobs of this kind will not run");
                continue;
            };
            let concurrency = kind.policy(&self.config).concurrency.max(1);
            for worker_id in 0..concurrency {
                workers.push(tokio::spawn(run_worker(
                    worker_id,
                    queue.clone(),
                    handler.clone(),
                    cancel.clone(),
                )));
            }
            info!(%kind, concurrency, "workers started");
        }
        workers
    }

    /// Resolves once every queue is empty with nothing leased.
    ///
    /// Repeats until one full pass finds every queue idle, as ingestion may
    /// still be enqueueing while it waits.
    pub async fn wait_idle(&self) {
        loop {
            let mut all_idle = true;
            for queue in self.queues.values() {
                if !queue.is_idle().await {
                    all_idle = false;
                    queue.wait_idle().await;
                }
            }
            if all_idle {
                return;
            }
        }
    }

    pub async fn stats(&self) -> HashMap<JobKind, QueueStats> {
        let mut stats = HashMap::new();
        for (kind, queue) in &self.queues {
            stats.insert(*kind, queue.stats().await);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parley_core::types::{Attachment, ChatType};

    fn event(from_self: bool, sender: Option<&str>) -> IngestEvent {
        IngestEvent {
            external_message_id: "m-1".into(),
            conversation_id: "c-1".into(),
            user_id: "u-1".into(),
            sender_external_id: sender.map(str::to_string),
            body: "Can you call me tomorrow?".into(),
            from_self,
            timestamp: Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap(),
            chat_type: ChatType::Individual,
            attachments: Vec::new(),
        }
    }

    fn kinds(event: &IngestEvent) -> Vec<JobKind> {
        plan(event).iter().map(JobPayload::kind).collect()
    }

    #[test]
    fn self_messages_never_trigger_a_reply() {
        assert_eq!(kinds(&event(true, Some("k-1"))), vec![JobKind::PromiseDetection]);

        let mut own = event(true, Some("k-1"));
        own.attachments.push(Attachment {
            url: "https://example.com/x.jpg".into(),
            mime_type: "image/jpeg".into(),
        });
        assert_eq!(kinds(&own), vec![JobKind::PromiseDetection, JobKind::Media]);
    }

    #[test]
    fn inbound_with_contact_fans_out_to_three_queues() {
        assert_eq!(
            kinds(&event(false, Some("k-1"))),
            vec![
                JobKind::PromiseDetection,
                JobKind::Response,
                JobKind::ContactInference
            ]
        );
    }

    #[test]
    fn inbound_without_contact_skips_inference() {
        assert_eq!(
            kinds(&event(false, None)),
            vec![JobKind::PromiseDetection, JobKind::Response]
        );
    }

    #[test]
    fn one_media_job_per_attachment() {
        let mut inbound = event(false, None);
        for mime in ["image/png", "application/pdf"] {
            inbound.attachments.push(Attachment {
                url: format!("https://example.com/{mime}"),
                mime_type: mime.into(),
            });
        }
        let media: Vec<_> = plan(&inbound)
            .into_iter()
            .filter(|p| p.kind() == JobKind::Media)
            .collect();
        assert_eq!(media.len(), 2);
        assert!(matches!(&media[1], JobPayload::Media { index: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn ingest_enqueues_into_matching_queues() {
        let orchestrator = Orchestrator::new(&QueueConfig::default());
        let own = orchestrator.ingest(&event(true, Some("k-1"))).await;
        assert_eq!(own.len(), 1);

        let stats = orchestrator.stats().await;
        assert_eq!(stats[&JobKind::PromiseDetection].pending, 1);
        assert_eq!(stats[&JobKind::Response].pending, 0);

        orchestrator.ingest(&event(false, Some("k-1"))).await;
        orchestrator.ingest(&event(false, Some("k-1"))).await;
        let stats = orchestrator.stats().await;
        assert_eq!(stats[&JobKind::Response].pending, 2);
        // Pending inference for the same contact coalesces.
        assert_eq!(stats[&JobKind::ContactInference].pending, 1);
    }
}
