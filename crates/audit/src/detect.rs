//! Change detection and human-readable summaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::schema::{EntityKind, ValueType};

/// One detected field-level difference between two entity snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub field_key: String,
    pub label: String,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
    pub value_type: ValueType,
}

/// Diff two snapshots of an entity against its tracked-field schema.
///
/// An unrecognized `kind` yields an empty list: this runs on a best-effort
/// audit path and must never fail the mutation it is recording.
pub fn detect_changes(kind: &str, before: &JsonValue, after: &JsonValue) -> Vec<ChangeRecord> {
    let Some(kind) = EntityKind::parse(kind) else {
        return Vec::new();
    };

    kind.tracked_fields()
        .iter()
        .filter_map(|field| {
            let old_value = before.get(field.key).unwrap_or(&JsonValue::Null);
            let new_value = after.get(field.key).unwrap_or(&JsonValue::Null);
            if values_equal(old_value, new_value, field.value_type) {
                return None;
            }
            Some(ChangeRecord {
                field_key: field.key.to_string(),
                label: field.label.to_string(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
                value_type: field.value_type,
            })
        })
        .collect()
}

/// Type-aware equality: both null/absent compare equal, dates compare by
/// instant, everything else by strict JSON equality.
fn values_equal(old_value: &JsonValue, new_value: &JsonValue, value_type: ValueType) -> bool {
    if old_value.is_null() && new_value.is_null() {
        return true;
    }
    if value_type == ValueType::Date {
        if let (Some(old_instant), Some(new_instant)) =
            (parse_instant(old_value), parse_instant(new_value))
        {
            return old_instant == new_instant;
        }
    }
    old_value == new_value
}

fn parse_instant(value: &JsonValue) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// One-line summary for an activity-log entry.
pub fn summarize(changes: &[ChangeRecord]) -> String {
    match changes.len() {
        0 => "no changes".to_string(),
        1 => format!("1 change: {}", changes[0].label),
        n => {
            let labels: Vec<&str> = changes.iter().take(3).map(|c| c.label.as_str()).collect();
            let suffix = if n > 3 { "..." } else { "" };
            format!("{n} changes: {}{suffix}", labels.join(", "))
        }
    }
}
