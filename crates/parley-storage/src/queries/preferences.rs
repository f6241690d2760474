// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user reply preferences.

use chrono::Utc;
use parley_core::ParleyError;
use parley_core::types::UserPreferences;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};

pub async fn get_preferences(
    db: &Database,
    user_id: &str,
) -> Result<Option<UserPreferences>, ParleyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UserPreferences>, rusqlite::Error> {
            conn.query_row(
                "SELECT tone, response_style, language, personality_traits
                 FROM preferences WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let traits: String = row.get(3)?;
                    Ok(UserPreferences {
                        tone: row.get(0)?,
                        response_style: row.get(1)?,
                        language: row.get(2)?,
                        personality_traits: serde_json::from_str(&traits).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                        })?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_preferences(
    db: &Database,
    user_id: &str,
    preferences: &UserPreferences,
) -> Result<(), ParleyError> {
    let user_id = user_id.to_string();
    let preferences = preferences.clone();
    let traits = serde_json::to_string(&preferences.personality_traits).map_err(|e| {
        ParleyError::Storage {
            source: Box::new(e),
        }
    })?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO preferences (user_id, tone, response_style, language, personality_traits, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     tone = excluded.tone,
                     response_style = excluded.response_style,
                     language = excluded.language,
                     personality_traits = excluded.personality_traits,
                     updated_at = excluded.updated_at",
                params![
                    user_id,
                    preferences.tone,
                    preferences.response_style,
                    preferences.language,
                    traits,
                    format_ts(Utc::now()),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    #[tokio::test]
    async fn round_trip_with_traits() {
        let (db, _dir) = setup_db().await;
        assert!(get_preferences(&db, "u1").await.unwrap().is_none());

        let prefs = UserPreferences {
            tone: "formal".into(),
            response_style: "detailed".into(),
            language: "fr".into(),
            personality_traits: vec!["witty".into(), "direct".into()],
        };
        upsert_preferences(&db, "u1", &prefs).await.unwrap();
        assert_eq!(get_preferences(&db, "u1").await.unwrap(), Some(prefs.clone()));

        let updated = UserPreferences {
            tone: "casual".into(),
            ..prefs
        };
        upsert_preferences(&db, "u1", &updated).await.unwrap();
        assert_eq!(get_preferences(&db, "u1").await.unwrap().unwrap().tone, "casual");
    }
}
