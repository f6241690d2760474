// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detected promise queries.

use parley_core::ParleyError;
use parley_core::types::Promise;
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

/// Upsert by id, so re-running detection over a message is harmless.
pub async fn upsert_promise(db: &Database, promise: &Promise) -> Result<(), ParleyError> {
    let p = promise.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO promises (id, message_id, conversation_id, text, due_hint, from_self, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     text = excluded.text,
                     due_hint = excluded.due_hint",
                params![
                    p.id,
                    p.message_id,
                    p.conversation_id,
                    p.text,
                    p.due_hint,
                    p.from_self,
                    format_ts(p.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn promises_for_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<Vec<Promise>, ParleyError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Promise>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, message_id, conversation_id, text, due_hint, from_self, created_at
                 FROM promises WHERE conversation_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![conversation_id], |row| {
                let created_at: String = row.get(6)?;
                Ok(Promise {
                    id: row.get(0)?,
                    message_id: row.get(1)?,
                    conversation_id: row.get(2)?,
                    text: row.get(3)?,
                    due_hint: row.get(4)?,
                    from_self: row.get(5)?,
                    created_at: parse_ts(6, &created_at)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;
    use chrono::Utc;

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let promise = Promise {
            id: "m1:0".into(),
            message_id: "m1".into(),
            conversation_id: "c1".into(),
            text: "I'll send it tomorrow".into(),
            due_hint: Some("tomorrow".into()),
            from_self: true,
            created_at: Utc::now(),
        };
        upsert_promise(&db, &promise).await.unwrap();
        upsert_promise(&db, &promise).await.unwrap();

        let stored = promises_for_conversation(&db, "c1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].due_hint.as_deref(), Some("tomorrow"));
        assert!(stored[0].from_self);
    }
}
