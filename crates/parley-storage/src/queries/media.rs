// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment descriptor queries.

use parley_core::ParleyError;
use parley_core::types::MediaRecord;
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err, parse_enum, parse_ts};

pub async fn upsert_media(db: &Database, record: &MediaRecord) -> Result<(), ParleyError> {
    let m = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO media (id, message_id, url, mime_type, kind, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     url = excluded.url,
                     mime_type = excluded.mime_type,
                     kind = excluded.kind",
                params![
                    m.id,
                    m.message_id,
                    m.url,
                    m.mime_type,
                    m.kind.to_string(),
                    format_ts(m.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn media_for_message(
    db: &Database,
    message_id: &str,
) -> Result<Vec<MediaRecord>, ParleyError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<MediaRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, message_id, url, mime_type, kind, created_at
                 FROM media WHERE message_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![message_id], |row| {
                let kind: String = row.get(4)?;
                let created_at: String = row.get(5)?;
                Ok(MediaRecord {
                    id: row.get(0)?,
                    message_id: row.get(1)?,
                    url: row.get(2)?,
                    mime_type: row.get(3)?,
                    kind: parse_enum(4, &kind)?,
                    created_at: parse_ts(5, &created_at)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
