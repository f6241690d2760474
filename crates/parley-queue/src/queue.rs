// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process job queue for one job kind.
//!
//! Jobs wait in a pending set until their `run_at`, are leased to exactly one
//! worker, and are then acked or failed. Failures are rescheduled with
//! exponential backoff until the attempt budget runs out, after which the job
//! lands in a bounded failure history.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parley_config::model::QueuePolicyConfig;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::job::{BackoffPolicy, Job, JobId, JobKind, JobPayload};

/// What happened to a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailDisposition {
    /// Rescheduled after `delay`. `attempt` is the attempt that just failed.
    Retry { attempt: u32, delay: Duration },
    /// Attempt budget spent; moved to the failure history.
    Exhausted,
    /// No leased job had that id.
    Unknown,
}

/// A job that left the queue, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedJob {
    /// The job as it stood when it left, including `attempts` and `last_error`.
    pub job: Job,
    pub finished_at: Instant,
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Waiting for `run_at` or a free worker.
    pub pending: usize,
    /// Currently held by a worker.
    pub leased: usize,
    /// Entries in the bounded completion history.
    pub completed: usize,
    /// Entries in the bounded failure history.
    pub failed: usize,
}

#[derive(Default)]
struct State {
    next_id: JobId,
    pending: Vec<Job>,
    leased: HashMap<JobId, Job>,
    completed: VecDeque<FinishedJob>,
    failed: VecDeque<FinishedJob>,
}

impl State {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.leased.is_empty()
    }
}

fn push_bounded(history: &mut VecDeque<FinishedJob>, entry: FinishedJob, keep: usize) {
    if keep == 0 {
        return;
    }
    while history.len() >= keep {
        history.pop_front();
    }
    history.push_back(entry);
}

/// Queue for a single [`JobKind`], shared by that kind's workers.
///
/// Each job is leased to one worker at a time. Delay, priority, retry budget
/// and history bounds come from the kind's [`QueuePolicyConfig`].
pub struct JobQueue {
    kind: JobKind,
    delay: Duration,
    priority: i32,
    backoff: BackoffPolicy,
    keep_completed: usize,
    keep_failed: usize,
    state: Mutex<State>,
    /// Signalled when new work may be ready.
    ready: Notify,
    /// Signalled when the queue drains to empty.
    idle: Notify,
}

impl JobQueue {
    pub fn new(kind: JobKind, policy: &QueuePolicyConfig) -> Self {
        Self {
            kind,
            delay: Duration::from_millis(policy.delay_ms),
            priority: policy.priority,
            backoff: BackoffPolicy::from_config(policy),
            keep_completed: policy.keep_completed,
            keep_failed: policy.keep_failed,
            state: Mutex::new(State::default()),
            ready: Notify::new(),
            idle: Notify::new(),
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Adds a job that becomes runnable after the queue's delay.
    ///
    /// A payload with a coalesce key replaces the payload of a pending job
    /// with the same key; that job keeps its original run time and id.
    pub async fn enqueue(&self, payload: JobPayload) -> JobId {
        let mut state = self.state.lock().await;

        if let Some(key) = payload.coalesce_key() {
            if let Some(existing) = state
                .pending
                .iter_mut()
                .find(|j| j.payload.coalesce_key().as_deref() == Some(key.as_str()))
            {
                debug!(kind = %self.kind, job_id = existing.id, key = %key, "coalesced into pending job");
                existing.payload = payload;
                return existing.id;
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        state.pending.push(Job {
            id,
            payload,
            priority: self.priority,
            attempts: 0,
            backoff: self.backoff,
            run_at: Instant::now() + self.delay,
            last_error: None,
        });
        drop(state);

        debug!(kind = %self.kind, job_id = id, delay_ms = self.delay.as_millis() as u64, "job enqueued");
        self.ready.notify_one();
        id
    }

    /// Leases the best ready job, if any: highest priority, then earliest run time.
    pub async fn try_lease(&self) -> Option<Job> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let position = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, j)| j.run_at <= now)
            .max_by(|(_, a), (_, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then(b.run_at.cmp(&a.run_at))
                    .then(b.id.cmp(&a.id))
            })
            .map(|(i, _)| i)?;

        let mut job = state.pending.swap_remove(position);
        job.attempts += 1;
        state.leased.insert(job.id, job.clone());
        Some(job)
    }

    /// Waits for the next ready job. Returns `None` once `cancel` fires.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<Job> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(job) = self.try_lease().await {
                return Some(job);
            }
            let wake = self
                .state
                .lock()
                .await
                .pending
                .iter()
                .map(|j| j.run_at)
                .min();

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = self.ready.notified() => {}
                _ = sleep_until(wake) => {}
            }
        }
    }

    /// Marks a leased job done.
    pub async fn ack(&self, id: JobId) {
        let mut state = self.state.lock().await;
        let Some(job) = state.leased.remove(&id) else {
            warn!(kind = %self.kind, job_id = id, "ack for unknown job");
            return;
        };
        let entry = FinishedJob {
            job,
            finished_at: Instant::now(),
        };
        push_bounded(&mut state.completed, entry, self.keep_completed);
        if state.is_idle() {
            self.idle.notify_waiters();
        }
    }

    /// Records a failed attempt and either reschedules the job or retires it.
    pub async fn fail(&self, id: JobId, reason: &str) -> FailDisposition {
        let mut state = self.state.lock().await;
        let Some(mut job) = state.leased.remove(&id) else {
            warn!(kind = %self.kind, job_id = id, "fail for unknown job");
            return FailDisposition::Unknown;
        };
        job.last_error = Some(reason.to_string());

        if job.attempts_left() > 0 {
            let delay = job.backoff.delay_after(job.attempts);
            let attempt = job.attempts;
            job.run_at = Instant::now() + delay;
            state.pending.push(job);
            drop(state);
            self.ready.notify_one();
            return FailDisposition::Retry { attempt, delay };
        }

        error!(
            kind = %self.kind,
            job_id = id,
            attempts = job.attempts,
            error = reason,
            "job exhausted its attempts"
        );
        let entry = FinishedJob {
            job,
            finished_at: Instant::now(),
        };
        push_bounded(&mut state.failed, entry, self.keep_failed);
        if state.is_idle() {
            self.idle.notify_waiters();
        }
        FailDisposition::Exhausted
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            pending: state.pending.len(),
            leased: state.leased.len(),
            completed: state.completed.len(),
            failed: state.failed.len(),
        }
    }

    /// Most recent completed jobs, oldest first.
    pub async fn completed(&self) -> Vec<FinishedJob> {
        self.state.lock().await.completed.iter().cloned().collect()
    }

    /// Most recent exhausted jobs, oldest first.
    pub async fn failed(&self) -> Vec<FinishedJob> {
        self.state.lock().await.failed.iter().cloned().collect()
    }

    pub async fn is_idle(&self) -> bool {
        self.state.lock().await.is_idle()
    }

    /// Resolves once nothing is pending or leased.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle().await {
                return;
            }
            notified.await;
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
