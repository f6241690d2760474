// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and message queries.

use chrono::{DateTime, Utc};
use parley_core::ParleyError;
use parley_core::types::{ChatType, ContextMessage, ConversationRef, IngestEvent, MessageKind};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err, parse_enum, parse_ts};

/// Stores an inbound message and upserts its conversation in one transaction.
///
/// The first non-self sender becomes the conversation's contact. Replaying
/// an already stored message is a no-op.
pub async fn insert_message(db: &Database, event: &IngestEvent) -> Result<(), ParleyError> {
    let event = event.clone();
    let kind: MessageKind = event.message_kind();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            let now = format_ts(Utc::now());
            let contact_id = if event.from_self {
                None
            } else {
                event.sender_external_id.clone()
            };
            tx.execute(
                "INSERT INTO conversations (id, user_id, chat_type, contact_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     updated_at = excluded.updated_at,
                     contact_id = COALESCE(conversations.contact_id, excluded.contact_id)",
                params![
                    event.conversation_id,
                    event.user_id,
                    event.chat_type.to_string(),
                    contact_id,
                    now,
                ],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO messages
                     (external_id, conversation_id, sender_external_id, body, kind, from_self, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.external_message_id,
                    event.conversation_id,
                    event.sender_external_id,
                    event.body,
                    kind.to_string(),
                    event.from_self,
                    format_ts(event.timestamp),
                ],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Looks up the conversation of the message with the given external id.
pub async fn resolve_conversation(
    db: &Database,
    external_id: &str,
) -> Result<Option<ConversationRef>, ParleyError> {
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ConversationRef>, rusqlite::Error> {
            conn.query_row(
                "SELECT c.id, c.chat_type, c.contact_id
                 FROM messages m JOIN conversations c ON c.id = m.conversation_id
                 WHERE m.external_id = ?1",
                params![external_id],
                |row| {
                    let chat_type: String = row.get(1)?;
                    Ok(ConversationRef {
                        conversation_id: row.get(0)?,
                        chat_type: parse_enum::<ChatType>(1, &chat_type)?,
                        contact_id: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest non-deleted messages first.
pub async fn recent_messages(
    db: &Database,
    conversation_id: &str,
    limit: usize,
) -> Result<Vec<ContextMessage>, ParleyError> {
    let conversation_id = conversation_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<ContextMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT external_id, body, from_self, created_at, kind, sender_external_id
                 FROM messages
                 WHERE conversation_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![conversation_id, limit], |row| {
                let created_at: String = row.get(3)?;
                let kind: String = row.get(4)?;
                Ok(ContextMessage {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    from_self: row.get(2)?,
                    sender_external_id: row.get(5)?,
                    timestamp: parse_ts(3, &created_at)?,
                    kind: parse_enum(4, &kind)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_messages(db: &Database, conversation_id: &str) -> Result<u64, ParleyError> {
    let conversation_id = conversation_id.to_string();
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1 AND deleted_at IS NULL",
                params![conversation_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Marks a message deleted. Returns false if no such message exists.
pub async fn soft_delete_message(
    db: &Database,
    external_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, ParleyError> {
    let external_id = external_id.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET deleted_at = ?2 WHERE external_id = ?1 AND deleted_at IS NULL",
                params![external_id, format_ts(at)],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
