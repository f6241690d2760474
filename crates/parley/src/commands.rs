// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: suggest, analytics, feedback and config check.

use chrono::{DateTime, Utc};
use parley_config::ParleyConfig;
use parley_core::types::{ChatType, DateRange, Feedback, FeedbackUpdate};
use parley_core::{AnalyticsStore, ParleyError};
use parley_generator::{ChannelSink, StreamEvent, summarize};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::services::{Services, open_storage};

/// Events buffered between the generator and the stderr echo.
const STREAM_BUFFER: usize = 64;

fn print_json(value: &impl Serialize) -> Result<(), ParleyError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ParleyError::Internal(format!("failed to encode output: {e}")))?;
    println!("{json}");
    Ok(())
}

pub async fn suggest(
    config: &ParleyConfig,
    user_id: &str,
    chat_type: ChatType,
    request_id: Option<String>,
    stream: bool,
    text: &str,
) -> Result<(), ParleyError> {
    let services = Services::connect(config).await?;
    let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let generator = &services.generator;

    let response = if stream {
        let (sink, mut rx) = ChannelSink::channel(STREAM_BUFFER);
        let echo = tokio::spawn(async move {
            let mut stderr = tokio::io::stderr();
            while let Some(event) = rx.recv().await {
                if let StreamEvent::Token(token) = event {
                    let _ = stderr.write_all(token.as_bytes()).await;
                    let _ = stderr.flush().await;
                }
            }
            let _ = stderr.write_all(b"\n").await;
        });
        let response = generator
            .generate_response(&request_id, text, user_id, chat_type, Some(&sink))
            .await;
        drop(sink);
        if let Err(e) = echo.await {
            warn!(error = %e, "token echo task failed");
        }
        response
    } else {
        generator
            .generate_response(&request_id, text, user_id, chat_type, None)
            .await
    };

    print_json(&response)
}

pub async fn analytics(
    config: &ParleyConfig,
    user_id: &str,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<(), ParleyError> {
    let storage = open_storage(config).await?;
    let records = storage
        .query_records(user_id, &DateRange { since, until })
        .await?;
    print_json(&summarize(&records))
}

pub async fn feedback(
    config: &ParleyConfig,
    request_id: &str,
    user_id: &str,
    selected_index: Option<u32>,
    feedback: Option<Feedback>,
    custom_response: Option<String>,
) -> Result<(), ParleyError> {
    let update = FeedbackUpdate {
        selected_index,
        feedback,
        custom_response,
    };
    let storage = open_storage(config).await?;
    if !storage.update_feedback(request_id, user_id, &update).await? {
        return Err(ParleyError::storage(format!(
            "no analytics record for request {request_id}"
        )));
    }
    info!(request_id, user_id, "feedback recorded");
    Ok(())
}

/// Configuration already loaded and validated by the time this runs.
pub fn config_check(config: &ParleyConfig) {
    println!(
        "configuration ok (model={}, database={}, single_flight={})",
        config.model.model, config.storage.database_path, config.generator.single_flight
    );
}
