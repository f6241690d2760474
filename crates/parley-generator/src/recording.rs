// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers.
//!
//! Uses the metrics facade; nothing is exported unless the host installs a
//! recorder.

use metrics::{describe_counter, describe_histogram};
use strum::AsRefStr;

/// How a generation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Cached,
    Generated,
    Failed,
    Cancelled,
}

/// Register every Parley metric description.
///
/// Called once at startup.
pub fn register_metrics() {
    describe_counter!("parley_cache_hits_total", "Suggestion cache hits");
    describe_counter!("parley_cache_misses_total", "Suggestion cache misses");
    describe_counter!(
        "parley_generations_total",
        "Generation runs by outcome (cached, generated, failed, cancelled)"
    );
    describe_counter!(
        "parley_safety_issues_total",
        "Safety issues flagged on model suggestions, by severity"
    );
    describe_counter!("parley_jobs_total", "Queue jobs by kind and outcome");
    describe_histogram!(
        "parley_generation_seconds",
        "Wall-clock time of a generation run in seconds"
    );
}

pub fn record_generation(outcome: Outcome, seconds: f64) {
    metrics::counter!("parley_generations_total", "outcome" => outcome.as_ref().to_string())
        .increment(1);
    metrics::histogram!("parley_generation_seconds").record(seconds);
}
