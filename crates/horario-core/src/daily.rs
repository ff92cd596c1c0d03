//! Daily aggregation of raw schedule feed records
//!
//! Folds one worker's hour records and note records for a date window into a
//! sparse per-day structure keyed by resolved company identity.
//!
//! Feed data is external and imperfect: a record with an unusable date is
//! logged and dropped, unparseable numbers count as absent. One bad record
//! never fails the batch.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::days::date_key;
use crate::fields::{
    collect_text_leaves, pick_f64, pick_first_defined, pick_text, value_as_text,
    COMPANY_ID_FIELDS, COMPANY_NAME_FIELDS, DATE_FIELDS, DESCRIPTION_FIELDS, HOURS_FIELDS,
    ID_FIELDS, NOTE_ENVELOPE_FIELDS, NOTE_PAYLOAD_FIELDS, OBSERVATIONS_FIELDS, SHIFTS_FIELDS,
    SHIFT_END_FIELDS, SHIFT_HOURS_FIELDS, SHIFT_START_FIELDS,
};
use crate::segments::shift_hours;
use crate::{
    CompanyHours, CompanyIdentity, DateRange, DayNoteEntry, DayScheduleEntry, NoteOrigin,
    WorkShift, WorkerWeeklyData, WorkerWeeklyDayData,
};

/// Separator between observation fragments of one entry
pub const OBSERVATION_SEPARATOR: &str = " • ";

/// Tuning for the daily aggregation
#[derive(Clone, Debug, PartialEq)]
pub struct DailyOptions {
    /// Fixed offset added to feed timestamps before taking their calendar day
    pub day_offset_hours: i64,
    /// Depth limit when walking note payloads
    pub max_note_depth: usize,
}

impl Default for DailyOptions {
    fn default() -> Self {
        Self {
            day_offset_hours: 2,
            max_note_depth: 8,
        }
    }
}

/// Build one worker's per-day data from raw hour and note records
pub fn build_worker_weekly_data(
    worker_id: &str,
    hour_records: &[Value],
    note_records: &[Value],
    range: &DateRange,
    options: &DailyOptions,
) -> WorkerWeeklyData {
    let mut data = WorkerWeeklyData {
        worker_id: worker_id.to_string(),
        ..Default::default()
    };

    for (index, record) in hour_records.iter().enumerate() {
        let Some(date) = record_day(record, options, worker_id, index) else {
            continue;
        };
        if !range.contains_date(date) {
            debug!(worker_id, %date, "hour record outside range, skipped");
            continue;
        }
        let key = date_key(date);
        let entry = schedule_entry(record, worker_id, &key, index);
        if entry.hours == 0.0 && entry.description.is_none() && entry.work_shifts.is_empty() {
            debug!(worker_id, entry_id = %entry.id, "empty hour record skipped");
            continue;
        }
        let day = data.days.entry(key).or_default();
        add_company_hours(day, &entry.company, entry.hours);
        day.total_hours += entry.hours;
        day.entries.push(entry);
    }

    for (index, record) in note_records.iter().enumerate() {
        let Some(date) = record_day(record, options, worker_id, index) else {
            continue;
        };
        if !range.contains_date(date) {
            continue;
        }
        let key = date_key(date);
        if let Some(note) = note_entry(record, worker_id, &key, index, options.max_note_depth) {
            data.days.entry(key).or_default().note_entries.push(note);
        }
    }

    data.days.retain(|_, day| !day.is_empty());
    debug!(
        worker_id,
        hour_records = hour_records.len(),
        note_records = note_records.len(),
        days = data.days.len(),
        "aggregated worker schedule"
    );
    data
}

fn record_day(record: &Value, options: &DailyOptions, worker_id: &str, index: usize) -> Option<NaiveDate> {
    let day = pick_first_defined(record, DATE_FIELDS)
        .and_then(value_as_text)
        .and_then(|raw| parse_record_day(&raw, options.day_offset_hours));
    if day.is_none() {
        warn!(worker_id, index, "feed record without a usable date dropped");
    }
    day
}

/// Calendar day of a feed timestamp after applying the fixed offset.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS`,
/// epoch milliseconds, and plain `YYYY-MM-DD` (taken as-is, no offset).
pub fn parse_record_day(raw: &str, offset_hours: i64) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Out-of-range offsets or timestamps drop the record instead of panicking
    let offset = Duration::try_hours(offset_hours)?;
    let shifted = |dt: NaiveDateTime| dt.checked_add_signed(offset).map(|dt| dt.date());

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return shifted(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return shifted(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .and_then(|dt| shifted(dt.naive_utc()))
}

fn schedule_entry(record: &Value, worker_id: &str, key: &str, index: usize) -> DayScheduleEntry {
    let source_id = pick_text(record, ID_FIELDS);
    let id = source_id.clone().unwrap_or_else(|| format!("{worker_id}-{key}-{index}"));
    let work_shifts = work_shifts(record, &id);

    let hours = pick_f64(record, HOURS_FIELDS)
        .or_else(|| {
            let shift_sum: Vec<f64> = work_shifts.iter().filter_map(shift_hours).collect();
            (!shift_sum.is_empty()).then(|| shift_sum.iter().sum())
        })
        .unwrap_or(0.0);

    let company_id = pick_text(record, COMPANY_ID_FIELDS);
    let company_name = pick_text(record, COMPANY_NAME_FIELDS);
    let company = CompanyIdentity::resolve(company_id.as_deref(), company_name.as_deref());

    DayScheduleEntry {
        id,
        source_id,
        company_id,
        company_name,
        company,
        hours,
        description: observation_text(record),
        work_shifts,
        raw: record.clone(),
    }
}

fn work_shifts(record: &Value, entry_id: &str) -> Vec<WorkShift> {
    let Some(Value::Array(items)) = pick_first_defined(record, SHIFTS_FIELDS) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .enumerate()
        .map(|(n, item)| WorkShift {
            id: pick_text(item, ID_FIELDS).unwrap_or_else(|| format!("{entry_id}-s{n}")),
            start_time: pick_text(item, SHIFT_START_FIELDS),
            end_time: pick_text(item, SHIFT_END_FIELDS),
            hours: pick_f64(item, SHIFT_HOURS_FIELDS),
        })
        .collect()
}

/// Structured description first, then every observation, deduplicated and
/// joined with [`OBSERVATION_SEPARATOR`]. Neither source is ever dropped.
fn observation_text(record: &Value) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(description) = pick_first_defined(record, DESCRIPTION_FIELDS) {
        parts.extend(collect_text_leaves(description, 2));
    }
    if let Some(observations) = pick_first_defined(record, OBSERVATIONS_FIELDS) {
        parts.extend(collect_text_leaves(observations, 2));
    }
    let mut unique: Vec<String> = Vec::new();
    for part in parts {
        if !unique.contains(&part) {
            unique.push(part);
        }
    }
    (!unique.is_empty()).then(|| unique.join(OBSERVATION_SEPARATOR))
}

fn add_company_hours(day: &mut WorkerWeeklyDayData, company: &CompanyIdentity, hours: f64) {
    for key in [company.id_key(), company.name_key()] {
        day.company_hours
            .entry(key)
            .or_insert_with(|| CompanyHours {
                company_id: company.id.clone(),
                name: company.name.clone(),
                hours: 0.0,
            })
            .hours += hours;
    }
}

fn note_entry(
    record: &Value,
    worker_id: &str,
    key: &str,
    index: usize,
    max_depth: usize,
) -> Option<DayNoteEntry> {
    let lines = match pick_first_defined(record, NOTE_PAYLOAD_FIELDS) {
        Some(payload) => collect_text_leaves(payload, max_depth),
        None => collect_text_leaves(&without_envelope(record), max_depth),
    };
    if lines.is_empty() {
        debug!(worker_id, key, "note record without text skipped");
        return None;
    }

    let company_id = pick_text(record, COMPANY_ID_FIELDS);
    let company_name = pick_text(record, COMPANY_NAME_FIELDS);
    let company = (company_id.is_some() || company_name.is_some())
        .then(|| CompanyIdentity::resolve(company_id.as_deref(), company_name.as_deref()));

    Some(DayNoteEntry {
        id: pick_text(record, ID_FIELDS).unwrap_or_else(|| format!("note-{worker_id}-{key}-{index}")),
        origin: NoteOrigin::NotesFeed,
        company,
        lines,
    })
}

fn without_envelope(record: &Value) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !NOTE_ENVELOPE_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}
