// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of analytics records into a summary.

use std::collections::BTreeMap;

use parley_core::types::{AnalyticsRecord, AnalyticsSummary, Feedback};

const CONFIDENCE_WEIGHT: f64 = 0.4;
const SELECTION_WEIGHT: f64 = 0.4;
const POSITIVE_FEEDBACK_WEIGHT: f64 = 0.2;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarises `records`. An empty slice yields all zeros.
pub fn summarize(records: &[AnalyticsRecord]) -> AnalyticsSummary {
    if records.is_empty() {
        return AnalyticsSummary::default();
    }

    let total = records.len() as f64;
    let average_confidence = records.iter().map(|r| r.confidence).sum::<f64>() / total;
    let selection_rate =
        records.iter().filter(|r| r.selected_index.is_some()).count() as f64 / total;
    let positive_rate = records
        .iter()
        .filter(|r| r.feedback == Some(Feedback::Positive))
        .count() as f64
        / total;

    let mut breakdown = BTreeMap::new();
    for record in records {
        *breakdown
            .entry(record.message_type.to_string())
            .or_insert(0u64) += 1;
    }

    let quality = CONFIDENCE_WEIGHT * average_confidence
        + SELECTION_WEIGHT * selection_rate
        + POSITIVE_FEEDBACK_WEIGHT * positive_rate;

    AnalyticsSummary {
        total_suggestions: records.len() as u64,
        average_confidence: round2(average_confidence),
        selection_rate: round2(selection_rate),
        message_type_breakdown: breakdown,
        quality_score: round2(quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parley_core::types::MessageType;

    fn record(confidence: f64, selected: Option<u32>, feedback: Option<Feedback>) -> AnalyticsRecord {
        AnalyticsRecord {
            request_id: "r".into(),
            user_id: "u".into(),
            message_type: MessageType::Question,
            confidence,
            suggestion_count: 3,
            context_message_count: 0,
            has_contact_info: false,
            cached: false,
            created_at: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
            selected_index: selected,
            feedback,
            custom_response: None,
        }
    }

    #[test]
    fn empty_records_give_zeros() {
        assert_eq!(summarize(&[]), AnalyticsSummary::default());
    }

    #[test]
    fn weights_confidence_selection_and_feedback() {
        let mut social = record(0.6, None, None);
        social.message_type = MessageType::Social;
        let records = vec![
            record(0.9, Some(0), Some(Feedback::Positive)),
            record(0.8, Some(2), Some(Feedback::Negative)),
            social,
            record(0.5, None, Some(Feedback::Positive)),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total_suggestions, 4);
        assert_eq!(summary.average_confidence, 0.7);
        assert_eq!(summary.selection_rate, 0.5);
        // 0.4 * 0.7 + 0.4 * 0.5 + 0.2 * 0.5
        assert_eq!(summary.quality_score, 0.58);
        assert_eq!(summary.message_type_breakdown.get("question"), Some(&3));
        assert_eq!(summary.message_type_breakdown.get("social"), Some(&1));
    }

    #[test]
    fn rates_are_rounded_to_two_decimals() {
        let records = vec![
            record(0.9, Some(0), None),
            record(0.9, None, None),
            record(0.9, None, None),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.selection_rate, 0.33);
        assert_eq!(summary.average_confidence, 0.9);
    }
}
