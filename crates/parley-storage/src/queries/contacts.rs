// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact queries.

use chrono::Utc;
use parley_core::ParleyError;
use parley_core::types::{ContactInfo, ContactInference};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};

pub async fn get_contact(db: &Database, id: &str) -> Result<Option<ContactInfo>, ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ContactInfo>, rusqlite::Error> {
            conn.query_row(
                "SELECT display_name, relationship, notes, inferred_name,
                        inferred_relationship, inference_confidence
                 FROM contacts WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ContactInfo {
                        display_name: row.get(0)?,
                        relationship: row.get(1)?,
                        notes: row.get(2)?,
                        inferred_name: row.get(3)?,
                        inferred_relationship: row.get(4)?,
                        inference_confidence: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Sets the user-entered fields, leaving inferred ones alone.
pub async fn upsert_contact(
    db: &Database,
    id: &str,
    contact: &ContactInfo,
) -> Result<(), ParleyError> {
    let id = id.to_string();
    let contact = contact.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO contacts (id, display_name, relationship, notes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     display_name = excluded.display_name,
                     relationship = excluded.relationship,
                     notes = excluded.notes,
                     updated_at = excluded.updated_at",
                params![
                    id,
                    contact.display_name,
                    contact.relationship,
                    contact.notes,
                    format_ts(Utc::now()),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Writes the inferred fields. A `None` in the inference keeps the stored value.
pub async fn record_inference(
    db: &Database,
    inference: &ContactInference,
) -> Result<(), ParleyError> {
    let inference = inference.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO contacts (id, inferred_name, inferred_relationship, inference_confidence, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     inferred_name = COALESCE(excluded.inferred_name, contacts.inferred_name),
                     inferred_relationship = COALESCE(excluded.inferred_relationship, contacts.inferred_relationship),
                     inference_confidence = excluded.inference_confidence,
                     updated_at = excluded.updated_at",
                params![
                    inference.contact_id,
                    inference.inferred_name,
                    inference.inferred_relationship,
                    inference.confidence,
                    format_ts(Utc::now()),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
