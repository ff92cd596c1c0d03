//! Field access for loosely-typed feed records
//!
//! Feed records drift: the same logical field shows up under several names
//! depending on the endpoint and its version. Each logical field has one
//! ordered candidate list, evaluated by [`pick_first_defined`].

use serde_json::Value;
use std::collections::HashSet;

/// Entry identifier
pub const ID_FIELDS: &[&str] = &["id", "_id", "entryId", "uuid"];
/// Timestamp or day of the record
pub const DATE_FIELDS: &[&str] = &[
    "dateTime",
    "date_time",
    "datetime",
    "date",
    "day",
    "startDate",
    "start",
    "createdAt",
];
/// Explicit hour value
pub const HOURS_FIELDS: &[&str] = &["value", "hours", "totalHours", "hoursWorked", "duration"];
pub const COMPANY_ID_FIELDS: &[&str] = &["companyId", "company_id", "company.id", "company._id"];
pub const COMPANY_NAME_FIELDS: &[&str] = &[
    "companyName",
    "company_name",
    "company.name",
    "company.label",
    "companyLabel",
];
pub const SHIFTS_FIELDS: &[&str] = &["workShifts", "work_shifts", "shifts"];
pub const SHIFT_START_FIELDS: &[&str] = &["startTime", "start_time", "start", "from"];
pub const SHIFT_END_FIELDS: &[&str] = &["endTime", "end_time", "end", "to"];
pub const SHIFT_HOURS_FIELDS: &[&str] = &["hours", "totalHours", "total"];
/// Structured free-text observation on an hours record
pub const DESCRIPTION_FIELDS: &[&str] = &["description", "observation", "comment", "notes"];
pub const OBSERVATIONS_FIELDS: &[&str] = &["observations"];
/// Where a notes record keeps its payload
pub const NOTE_PAYLOAD_FIELDS: &[&str] = &["value", "data", "payload", "content", "notes", "text"];
/// Envelope keys that never count as note text
pub const NOTE_ENVELOPE_FIELDS: &[&str] = &[
    "id", "_id", "entryId", "uuid", "type", "workerId", "worker_id", "userId", "dateTime",
    "date_time", "datetime", "date", "day", "startDate", "start", "createdAt", "updatedAt",
    "companyId", "company_id", "company", "companyName", "company_name",
];
/// Object keys visited first when walking a payload for note text
pub const PREFERRED_NOTE_KEYS: &[&str] = &["text", "note", "description", "value", "comment"];

/// First candidate that is present, not null and, for strings, not blank.
///
/// Dotted candidates (`company.id`) descend into nested objects.
pub fn pick_first_defined<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| lookup_path(record, key))
        .find(|value| is_defined(value))
}

fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

fn is_defined(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Numbers as-is, strings through [`parse_decimal`]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Strings trimmed, numbers formatted, everything else absent
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn pick_f64(record: &Value, candidates: &[&str]) -> Option<f64> {
    pick_first_defined(record, candidates).and_then(value_as_f64)
}

pub fn pick_text(record: &Value, candidates: &[&str]) -> Option<String> {
    pick_first_defined(record, candidates).and_then(value_as_text)
}

/// Parse a decimal typed with either `,` or `.` as separator.
///
/// When both appear, the last one is the decimal separator and the other is
/// a thousands separator (`1.234,5` and `1,234.5` are both 1234.5).
pub fn parse_decimal(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Every string and number leaf under `value`, deduplicated, in visit order.
///
/// Objects are visited through [`PREFERRED_NOTE_KEYS`] first, then all
/// remaining keys in key order. The walk stops descending past `max_depth`.
pub fn collect_text_leaves(value: &Value, max_depth: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk_leaves(value, 0, max_depth, &mut out, &mut seen);
    out
}

fn walk_leaves(
    value: &Value,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    if depth > max_depth {
        return;
    }
    match value {
        Value::String(_) | Value::Number(_) => {
            if let Some(text) = value_as_text(value) {
                if seen.insert(text.clone()) {
                    out.push(text);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_leaves(item, depth + 1, max_depth, out, seen);
            }
        }
        Value::Object(map) => {
            for key in PREFERRED_NOTE_KEYS {
                if let Some(child) = map.get(*key) {
                    walk_leaves(child, depth + 1, max_depth, out, seen);
                }
            }
            let mut rest: Vec<_> = map
                .iter()
                .filter(|(key, _)| !PREFERRED_NOTE_KEYS.contains(&key.as_str()))
                .collect();
            rest.sort_by(|a, b| a.0.cmp(b.0));
            for (_, child) in rest {
                walk_leaves(child, depth + 1, max_depth, out, seen);
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}
