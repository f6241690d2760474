// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics record queries.

use parley_core::ParleyError;
use parley_core::types::{AnalyticsRecord, DateRange, FeedbackUpdate};
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err, parse_enum, parse_ts};

pub async fn insert_record(db: &Database, record: &AnalyticsRecord) -> Result<(), ParleyError> {
    let r = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO analytics
                     (request_id, user_id, message_type, confidence, suggestion_count,
                      context_message_count, has_contact_info, cached, created_at,
                      selected_index, feedback, custom_response)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    r.request_id,
                    r.user_id,
                    r.message_type.to_string(),
                    r.confidence,
                    r.suggestion_count,
                    r.context_message_count,
                    r.has_contact_info,
                    r.cached,
                    format_ts(r.created_at),
                    r.selected_index,
                    r.feedback.map(|f| f.to_string()),
                    r.custom_response,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Sets only the fields present in `update`. Returns false when no record
/// exists for the request.
pub async fn update_feedback(
    db: &Database,
    request_id: &str,
    user_id: &str,
    update: &FeedbackUpdate,
) -> Result<bool, ParleyError> {
    let request_id = request_id.to_string();
    let user_id = user_id.to_string();
    let update = update.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE analytics SET
                     selected_index = COALESCE(?3, selected_index),
                     feedback = COALESCE(?4, feedback),
                     custom_response = COALESCE(?5, custom_response)
                 WHERE request_id = ?1 AND user_id = ?2",
                params![
                    request_id,
                    user_id,
                    update.selected_index,
                    update.feedback.map(|f| f.to_string()),
                    update.custom_response,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Records for one user created inside the half-open `range`, oldest first.
pub async fn query_records(
    db: &Database,
    user_id: &str,
    range: &DateRange,
) -> Result<Vec<AnalyticsRecord>, ParleyError> {
    let user_id = user_id.to_string();
    let since = range.since.map(format_ts);
    let until = range.until.map(format_ts);
    db.connection()
        .call(move |conn| -> Result<Vec<AnalyticsRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT request_id, user_id, message_type, confidence, suggestion_count,
                        context_message_count, has_contact_info, cached, created_at,
                        selected_index, feedback, custom_response
                 FROM analytics
                 WHERE user_id = ?1
                   AND (?2 IS NULL OR created_at >= ?2)
                   AND (?3 IS NULL OR created_at < ?3)
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![user_id, since, until], |row| {
                let message_type: String = row.get(2)?;
                let created_at: String = row.get(8)?;
                let feedback: Option<String> = row.get(10)?;
                Ok(AnalyticsRecord {
                    request_id: row.get(0)?,
                    user_id: row.get(1)?,
                    message_type: parse_enum(2, &message_type)?,
                    confidence: row.get(3)?,
                    suggestion_count: row.get(4)?,
                    context_message_count: row.get(5)?,
                    has_contact_info: row.get(6)?,
                    cached: row.get(7)?,
                    created_at: parse_ts(8, &created_at)?,
                    selected_index: row.get(9)?,
                    feedback: feedback.map(|f| parse_enum(10, &f)).transpose()?,
                    custom_response: row.get(11)?,
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
    use chrono::{DateTime, TimeZone, Utc};
    use parley_core::types::{Feedback, MessageType};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap()
    }

    fn record(request_id: &str, day: u32) -> AnalyticsRecord {
        AnalyticsRecord {
            request_id: request_id.into(),
            user_id: "u1".into(),
            message_type: MessageType::Question,
            confidence: 0.8,
            suggestion_count: 3,
            context_message_count: 12,
            has_contact_info: true,
            cached: false,
            created_at: at(day),
            selected_index: None,
            feedback: None,
            custom_response: None,
        }
    }

    #[tokio::test]
    async fn insert_and_query_in_range() {
        let (db, _dir) = setup_db().await;
        for (id, day) in [("r1", 1), ("r2", 2), ("r3", 3)] {
            insert_record(&db, &record(id, day)).await.unwrap();
        }
        let mut other = record("r9", 2);
        other.user_id = "u2".into();
        insert_record(&db, &other).await.unwrap();

        let all = query_records(&db, "u1", &DateRange::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], record("r1", 1));

        let window = DateRange {
            since: Some(at(2)),
            until: Some(at(3)),
        };
        let ids: Vec<String> = query_records(&db, "u1", &window)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.request_id)
            .collect();
        assert_eq!(ids, vec!["r2".to_string()]);
    }

    #[tokio::test]
    async fn feedback_sets_only_given_fields() {
        let (db, _dir) = setup_db().await;
        insert_record(&db, &record("r1", 1)).await.unwrap();

        let first = FeedbackUpdate {
            selected_index: Some(1),
            feedback: Some(Feedback::Positive),
            custom_response: None,
        };
        assert!(update_feedback(&db, "r1", "u1", &first).await.unwrap());
        let second = FeedbackUpdate {
            custom_response: Some("edited".into()),
            ..Default::default()
        };
        assert!(update_feedback(&db, "r1", "u1", &second).await.unwrap());
        // Idempotent: applying the same update again changes nothing further.
        assert!(update_feedback(&db, "r1", "u1", &second).await.unwrap());

        let stored = &query_records(&db, "u1", &DateRange::default()).await.unwrap()[0];
        assert_eq!(stored.selected_index, Some(1));
        assert_eq!(stored.feedback, Some(Feedback::Positive));
        assert_eq!(stored.custom_response.as_deref(), Some("edited"));
    }

    #[tokio::test]
    async fn feedback_for_unknown_request_reports_false() {
        let (db, _dir) = setup_db().await;
        insert_record(&db, &record("r1", 1)).await.unwrap();
        let update = FeedbackUpdate {
            selected_index: Some(0),
            ..Default::default()
        };
        assert!(!update_feedback(&db, "r1", "someone-else", &update).await.unwrap());
        assert!(!update_feedback(&db, "missing", "u1", &update).await.unwrap());
    }
}
