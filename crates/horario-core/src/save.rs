//! Save-back planning
//!
//! Turns the in-memory manual edits into the records the schedule feed
//! expects on "save all". Planning is pure: sending the records is the
//! caller's business.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::parse_decimal;
use crate::segments::segments_total;
use crate::{Assignment, AssignmentTotalsContext, DayDescriptor, WorkShift, WorkerId};

/// Type tag of manually entered hour records
pub const MANUAL_ENTRY_TYPE: u8 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    /// Tracked entry being updated; empty for a new record
    pub id: String,
    pub date_time: String,
    pub worker_id: WorkerId,
    #[serde(rename = "type")]
    pub kind: u8,
    /// Hours with exactly two decimals
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// `Some(vec![])` clears shifts that were tracked before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_shifts: Option<Vec<WorkShift>>,
}

/// One record per (assignment, day) carrying a manual value or valid segments
pub fn plan_save(
    assignments: &[Assignment],
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
) -> Vec<SaveRecord> {
    let mut records = Vec::new();

    for assignment in assignments {
        for day in days {
            let key = day.date_key.as_str();
            let manual = assignment.manual(key);
            let segments: Vec<_> = assignment
                .segments_for(key)
                .iter()
                .filter(|s| s.is_valid())
                .cloned()
                .collect();
            if manual.is_none() && segments.is_empty() {
                continue;
            }

            let tracked: Vec<_> = context
                .day(&assignment.worker_id, key)
                .map(|d| d.entries_for(&assignment.company).collect())
                .unwrap_or_default();
            let id = tracked
                .iter()
                .find_map(|e| e.source_id.clone())
                .unwrap_or_default();
            let had_shifts = tracked.iter().any(|e| !e.work_shifts.is_empty());

            let hours = match manual {
                Some(text) => parse_decimal(text).unwrap_or(0.0),
                None => segments_total(&segments),
            };
            let work_shifts = if !segments.is_empty() {
                Some(segments.iter().map(|s| s.to_work_shift()).collect())
            } else if had_shifts {
                Some(Vec::new())
            } else {
                None
            };

            debug!(worker_id = %assignment.worker_id, day = key, hours, "planned save record");
            records.push(SaveRecord {
                id,
                date_time: format!("{key}T00:00:00.000Z"),
                worker_id: assignment.worker_id.clone(),
                kind: MANUAL_ENTRY_TYPE,
                value: format_hours(hours),
                company_id: (!assignment.company.is_unassigned()).then(|| assignment.company.id.clone()),
                work_shifts,
            });
        }
    }
    records
}

/// Two-decimal text, rounding half away from zero
pub fn format_hours(hours: f64) -> String {
    let rounded = Decimal::from_f64(hours)
        .unwrap_or_default()
        .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}
