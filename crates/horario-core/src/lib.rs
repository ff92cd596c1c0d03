//! # horario-core
//!
//! Core engine for the horario hours tracker.
//!
//! This crate provides:
//! - Domain types: `Assignment`, `CompanyIdentity`, `WorkerWeeklyData`, `DayDescriptor`
//! - Company identity resolution (`company`)
//! - Manual-vs-tracked hour resolution and totals (`hours`)
//! - Daily aggregation of raw schedule feed records (`daily`)
//! - Export-time worker/company buckets (`aggregate`)
//! - Save-back planning (`save`)
//!
//! Everything here is a pure transformation over in-memory snapshots. Fetching
//! lives in `horario-feed`, spreadsheet output in `horario-render`.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use horario_core::{Assignment, AssignmentTotalsContext, CompanyIdentity, DateRange};
//! use horario_core::hours::calculate_row_total;
//!
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
//! ).unwrap();
//! let days = range.days();
//!
//! let mut assignment = Assignment::new("w1", "Ana", CompanyIdentity::resolve(Some("c1"), Some("Acme")));
//! assignment.set_manual("2024-01-01", "2");
//! assignment.set_manual("2024-01-03", "1,5");
//!
//! let context = AssignmentTotalsContext::default();
//! assert_eq!(calculate_row_total(&assignment, &context, &days), 3.5);
//! ```

pub mod aggregate;
pub mod company;
pub mod daily;
pub mod days;
pub mod directory;
pub mod fields;
pub mod hours;
pub mod save;
pub mod segments;

pub use aggregate::{
    aggregate, CompanyBucket, DetailLevel, DetailRow, ExportOptions, ExportRow, PayrollReport,
    RateResolver, WorkerBucket,
};
pub use company::{fold_text, UNASSIGNED_COMPANY_ID, UNASSIGNED_COMPANY_NAME};
pub use days::{DateRange, DayDescriptor};
pub use directory::{CompanyDirectory, DirectoryRates, WorkerRecord};
pub use segments::{HourSegment, SegmentError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a worker in the external directory
pub type WorkerId = String;

/// Identifier of a company (canonical form, see [`CompanyIdentity`])
pub type CompanyId = String;

/// Stable `YYYY-MM-DD` day key
pub type DateKey = String;

// ============================================================================
// Company Identity
// ============================================================================

/// Canonical `{id, name}` form of a company reference.
///
/// Produced by [`CompanyIdentity::resolve`]. Every input pair maps to exactly
/// one identity, and every "no company" variant maps to the single sentinel
/// returned by [`CompanyIdentity::unassigned`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyIdentity {
    pub id: CompanyId,
    pub name: String,
}

impl CompanyIdentity {
    /// The sentinel identity representing "no company specified"
    pub fn unassigned() -> Self {
        Self {
            id: UNASSIGNED_COMPANY_ID.to_string(),
            name: UNASSIGNED_COMPANY_NAME.to_string(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_COMPANY_ID
    }

    /// Lookup key on the id axis: `id:<normalized id>`
    pub fn id_key(&self) -> String {
        company::id_key(&self.id)
    }

    /// Lookup key on the name axis: `name:<normalized name>`
    pub fn name_key(&self) -> String {
        company::name_key(&self.name)
    }
}

// ============================================================================
// Tracked Data (per worker, per day)
// ============================================================================

/// Tracked hours for one company on one day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHours {
    pub company_id: CompanyId,
    pub name: String,
    pub hours: f64,
}

/// One block of work inside a schedule entry, as reported by the feed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkShift {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
}

/// One feed record for a given day and company
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScheduleEntry {
    /// Feed id, or a generated `<worker>-<day>-<index>` key when the record has none
    pub id: String,
    /// Id carried by the feed record itself; only these are sent back on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    /// Resolved identity of `company_id` / `company_name`
    pub company: CompanyIdentity,
    pub hours: f64,
    pub description: Option<String>,
    pub work_shifts: Vec<WorkShift>,
    /// Original payload. Kept for observation text only.
    pub raw: serde_json::Value,
}

/// Where a day note came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteOrigin {
    /// A notes-type record of the schedule feed
    NotesFeed,
    /// Typed by the user in this session
    Manual,
}

/// Free-text note attached to a day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNoteEntry {
    pub id: String,
    pub origin: NoteOrigin,
    pub company: Option<CompanyIdentity>,
    pub lines: Vec<String>,
}

impl DayNoteEntry {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Everything tracked for one worker on one day
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerWeeklyDayData {
    pub total_hours: f64,
    /// Dual-indexed: every company appears under `id:` and `name:` keys
    pub company_hours: BTreeMap<String, CompanyHours>,
    pub entries: Vec<DayScheduleEntry>,
    pub note_entries: Vec<DayNoteEntry>,
}

impl WorkerWeeklyDayData {
    /// Tracked hours for a company, matching the id axis first, then the name axis
    pub fn hours_for(&self, company: &CompanyIdentity) -> Option<f64> {
        self.company_hours
            .get(&company.id_key())
            .or_else(|| self.company_hours.get(&company.name_key()))
            .map(|c| c.hours)
    }

    /// Distinct companies recorded this day (one per `id:` key)
    pub fn companies(&self) -> impl Iterator<Item = &CompanyHours> {
        self.company_hours
            .iter()
            .filter(|(key, _)| key.starts_with(company::ID_KEY_PREFIX))
            .map(|(_, c)| c)
    }

    /// Entries whose resolved company matches on either axis
    pub fn entries_for<'a>(
        &'a self,
        company: &'a CompanyIdentity,
    ) -> impl Iterator<Item = &'a DayScheduleEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| company::same_company(&e.company, company))
    }

    /// True when nothing worth keeping was recorded
    pub fn is_empty(&self) -> bool {
        self.total_hours == 0.0 && self.note_entries.is_empty() && self.company_hours.is_empty()
    }
}

/// Tracked data for one worker over a date window (sparse: empty days are absent)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerWeeklyData {
    pub worker_id: WorkerId,
    pub days: BTreeMap<DateKey, WorkerWeeklyDayData>,
}

/// Read-only join between assignments and tracked data
#[derive(Clone, Debug, Default)]
pub struct AssignmentTotalsContext {
    pub worker_week_data: HashMap<WorkerId, WorkerWeeklyData>,
}

impl AssignmentTotalsContext {
    pub fn new(data: impl IntoIterator<Item = WorkerWeeklyData>) -> Self {
        Self {
            worker_week_data: data
                .into_iter()
                .map(|d| (d.worker_id.clone(), d))
                .collect(),
        }
    }

    pub fn day(&self, worker_id: &str, date_key: &str) -> Option<&WorkerWeeklyDayData> {
        self.worker_week_data
            .get(worker_id)
            .and_then(|w| w.days.get(date_key))
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// A (worker, company) pairing with per-day manual hour cells.
///
/// `id` is a display key derived from `(companyId, workerId)`. It is not a
/// durable primary key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub company: CompanyIdentity,
    /// Manually typed values. Empty or absent means "no override".
    #[serde(default)]
    pub hours: BTreeMap<DateKey, String>,
    #[serde(default)]
    pub segments: BTreeMap<DateKey, Vec<HourSegment>>,
}

impl Assignment {
    pub fn new(
        worker_id: impl Into<WorkerId>,
        worker_name: impl Into<String>,
        company: CompanyIdentity,
    ) -> Self {
        let worker_id = worker_id.into();
        Self {
            id: format!("{}-{}", company.id, worker_id),
            worker_id,
            worker_name: worker_name.into(),
            company,
            hours: BTreeMap::new(),
            segments: BTreeMap::new(),
        }
    }

    /// Manual value for a day, if one was typed (blank counts as none)
    pub fn manual(&self, date_key: &str) -> Option<&str> {
        self.hours
            .get(date_key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn set_manual(&mut self, date_key: impl Into<DateKey>, value: impl Into<String>) {
        self.hours.insert(date_key.into(), value.into());
    }

    pub fn clear_manual(&mut self, date_key: &str) {
        self.hours.remove(date_key);
    }

    pub fn set_segments(&mut self, date_key: impl Into<DateKey>, segments: Vec<HourSegment>) {
        self.segments.insert(date_key.into(), segments);
    }

    pub fn segments_for(&self, date_key: &str) -> &[HourSegment] {
        self.segments.get(date_key).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Trait for turning an aggregated payroll report into an output artifact
pub trait ReportRenderer {
    type Output;
    type Error;

    fn render(&self, report: &PayrollReport) -> Result<Self::Output, Self::Error>;
}

// ============================================================================
// Errors
// ============================================================================

/// Aggregation errors. Parse problems in feed data never show up here; they
/// degrade to absent values instead.
#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("No data in selected range ({start} to {end})")]
    NoData { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

// ============================================================================
// Tests
// ============================================================================
