// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment classification and persistence.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::types::{Attachment, MediaKind, MediaRecord};
use parley_core::{Clock, MediaStore, ParleyError};
use tracing::debug;

use crate::job::{Job, JobPayload};
use crate::worker::JobHandler;

pub struct MediaHandler {
    store: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
}

impl MediaHandler {
    pub fn new(store: Arc<dyn MediaStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn process(
        &self,
        message_id: &str,
        index: usize,
        attachment: &Attachment,
    ) -> Result<(), ParleyError> {
        let record = MediaRecord {
            id: format!("{message_id}:{index}"),
            message_id: message_id.to_string(),
            url: attachment.url.clone(),
            mime_type: attachment.mime_type.clone(),
            kind: MediaKind::from_mime(&attachment.mime_type),
            created_at: self.clock.now(),
        };
        debug!(media_id = %record.id, kind = %record.kind, "media classified");
        self.store.save_media(&record).await
    }
}

#[async_trait]
impl JobHandler for MediaHandler {
    async fn handle(&self, job: &Job) -> Result<(), ParleyError> {
        match &job.payload {
            JobPayload::Media {
                message_id,
                index,
                attachment,
            } => self.process(message_id, *index, attachment).await,
            other => Err(ParleyError::Queue {
                message: format!("media handler got a {} job", other.kind()),
            }),
        }
    }
}
