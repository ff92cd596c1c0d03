//! Export-time aggregation into worker and company buckets
//!
//! One configurable pipeline covers every export flavour: the
//! [`DetailLevel`] decides whether per-worker detail rows are produced and
//! how fine they are. The summary buckets are identical at every level.
//!
//! ## Rates and amounts
//!
//! An hourly rate comes from an injected [`RateResolver`]. When no rate is
//! known the amount stays `None`: "rate unknown" and "rate is zero" are
//! different facts for payroll. Hours without a rate are tracked separately
//! (`rated_hours`) so an average rate is only ever computed over hours that
//! actually had one.
//!
//! ## Filtering
//!
//! Rows and company totals with `|hours| < epsilon` are dropped from the
//! report entirely. If no worker keeps a row the aggregation fails with
//! [`AggregationError::NoData`]: an empty spreadsheet would read as "no work
//! done".

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::company::fold_text;
use crate::daily::OBSERVATION_SEPARATOR;
use crate::hours::{manual_hour, resolve_hour};
use crate::segments::{format_hhmm, parse_clock, shift_hours};
use crate::{
    AggregationError, Assignment, AssignmentTotalsContext, CompanyIdentity, DateKey, DateRange,
    DayDescriptor, WorkShift, WorkerId,
};

/// Largest gap between an entry's hours and its shift sum that still counts as equal
const SHIFT_SUM_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Configuration
// ============================================================================

/// Hourly rate lookup for a (worker, company) pair
pub trait RateResolver: Send + Sync {
    fn hourly_rate(&self, worker_id: &str, company: &CompanyIdentity) -> Option<f64>;
}

/// Resolver that never knows a rate
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRates;

impl RateResolver for NoRates {
    fn hourly_rate(&self, _worker_id: &str, _company: &CompanyIdentity) -> Option<f64> {
        None
    }
}

/// How much per-worker detail an export carries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Summary sheet only
    Totals,
    /// One detail row per (company, day)
    Daily,
    /// One detail row per tracked shift
    #[default]
    Shifts,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Totals => "totals",
            DetailLevel::Daily => "daily",
            DetailLevel::Shifts => "shifts",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "totals" | "total" => Ok(DetailLevel::Totals),
            "daily" | "day" => Ok(DetailLevel::Daily),
            "shifts" | "shift" => Ok(DetailLevel::Shifts),
            other => Err(format!("unknown detail level '{other}' (expected totals, daily or shifts)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Hour totals with a smaller magnitude count as zero
    pub epsilon: f64,
    pub detail: DetailLevel,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            detail: DetailLevel::default(),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// One (worker, company) line of the summary table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub company: CompanyIdentity,
    pub hours: f64,
    pub rate: Option<f64>,
    pub amount: Option<f64>,
}

/// One line of a worker's detail sheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub date_key: DateKey,
    pub day_label: String,
    pub company: String,
    pub entry: Option<String>,
    pub exit: Option<String>,
    /// `None` on notes-only rows
    pub hours: Option<f64>,
    pub amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkerBucket {
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub rows: Vec<ExportRow>,
    pub total_hours: f64,
    /// Hours of rows that had a known rate
    pub rated_hours: f64,
    pub total_amount: f64,
    pub details: Vec<DetailRow>,
}

impl WorkerBucket {
    /// Amount-weighted average over rated hours only
    pub fn average_rate(&self) -> Option<f64> {
        (self.rated_hours != 0.0).then(|| self.total_amount / self.rated_hours)
    }

    pub fn amount(&self) -> Option<f64> {
        (self.rated_hours != 0.0).then_some(self.total_amount)
    }

    /// Whether a detail sheet has anything to show
    pub fn has_detail(&self, epsilon: f64) -> bool {
        self.details
            .iter()
            .any(|d| d.hours.is_some_and(|h| h.abs() >= epsilon) || d.notes.is_some())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompanyBucket {
    /// Normalized name key shared by every spelling of the company
    pub key: String,
    pub name: String,
    pub total_hours: f64,
    pub rated_hours: f64,
    pub total_amount: f64,
}

/// Everything a renderer needs
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayrollReport {
    pub range: DateRange,
    pub detail: DetailLevel,
    pub epsilon: f64,
    /// Sorted by folded name. Includes notes-only workers (no rows).
    pub workers: Vec<WorkerBucket>,
    /// Sorted by folded name
    pub companies: Vec<CompanyBucket>,
}

impl PayrollReport {
    /// Workers that own at least one summary row
    pub fn summary_workers(&self) -> impl Iterator<Item = &WorkerBucket> {
        self.workers.iter().filter(|w| !w.rows.is_empty())
    }

    /// Workers that get their own detail sheet
    pub fn detail_workers(&self) -> impl Iterator<Item = &WorkerBucket> {
        let epsilon = self.epsilon;
        self.workers
            .iter()
            .filter(move |w| self.detail != DetailLevel::Totals && w.has_detail(epsilon))
    }

    pub fn total_hours(&self) -> f64 {
        self.workers.iter().map(|w| w.total_hours).sum()
    }

    pub fn total_amount(&self) -> f64 {
        self.workers.iter().map(|w| w.total_amount).sum()
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Group resolved assignment rows by worker and by company
pub fn aggregate(
    assignments: &[Assignment],
    context: &AssignmentTotalsContext,
    range: &DateRange,
    rates: &dyn RateResolver,
    options: &ExportOptions,
) -> Result<PayrollReport, AggregationError> {
    let days = range.days();
    let names = CanonicalNames::new(assignments);

    let mut groups: Vec<(WorkerId, Vec<&Assignment>)> = Vec::new();
    for assignment in assignments {
        match groups.iter_mut().find(|(id, _)| *id == assignment.worker_id) {
            Some((_, list)) => list.push(assignment),
            None => groups.push((assignment.worker_id.clone(), vec![assignment])),
        }
    }

    let mut workers: Vec<WorkerBucket> = groups
        .par_iter()
        .map(|(worker_id, list)| worker_bucket(worker_id, list, context, &days, rates, options, &names))
        .filter(|bucket| !bucket.rows.is_empty() || bucket.details.iter().any(|d| d.notes.is_some()))
        .collect();
    workers.sort_by(|a, b| by_folded(&a.worker_name, &b.worker_name).then_with(|| a.worker_id.cmp(&b.worker_id)));

    if workers.iter().all(|w| w.rows.is_empty()) {
        return Err(AggregationError::NoData {
            start: range.start,
            end: range.end,
        });
    }

    let companies = company_buckets(&workers, options.epsilon);
    info!(
        workers = workers.len(),
        companies = companies.len(),
        detail = %options.detail,
        "aggregated payroll report"
    );

    Ok(PayrollReport {
        range: *range,
        detail: options.detail,
        epsilon: options.epsilon,
        workers,
        companies,
    })
}

fn by_folded(a: &str, b: &str) -> std::cmp::Ordering {
    fold_text(a).cmp(&fold_text(b)).then_with(|| a.cmp(b))
}

/// First spelling seen for each company, so every row of a company carries
/// the exact same display name
struct CanonicalNames {
    names: HashMap<String, String>,
}

impl CanonicalNames {
    fn new(assignments: &[Assignment]) -> Self {
        let mut names = HashMap::new();
        for a in assignments {
            names
                .entry(a.company.name_key())
                .or_insert_with(|| a.company.name.clone());
        }
        Self { names }
    }

    fn get(&self, company: &CompanyIdentity) -> String {
        self.names
            .get(&company.name_key())
            .cloned()
            .unwrap_or_else(|| company.name.clone())
    }
}

fn worker_bucket(
    worker_id: &str,
    assignments: &[&Assignment],
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
    rates: &dyn RateResolver,
    options: &ExportOptions,
    names: &CanonicalNames,
) -> WorkerBucket {
    let worker_name = assignments
        .first()
        .map(|a| a.worker_name.clone())
        .unwrap_or_default();

    // Same company under several assignments collapses into one row
    let mut merged: Vec<(CompanyIdentity, f64)> = Vec::new();
    for assignment in assignments {
        let hours: f64 = days
            .iter()
            .map(|d| resolve_hour(assignment, &d.date_key, context))
            .sum();
        let key = assignment.company.name_key();
        match merged.iter_mut().find(|(c, _)| c.name_key() == key) {
            Some((_, total)) => *total += hours,
            None => merged.push((assignment.company.clone(), hours)),
        }
    }

    let mut rows: Vec<ExportRow> = merged
        .into_iter()
        .filter(|(company, hours)| {
            let keep = hours.abs() >= options.epsilon;
            if !keep {
                debug!(worker_id, company = %company.name, hours, "row below epsilon dropped");
            }
            keep
        })
        .map(|(company, hours)| {
            let rate = rates.hourly_rate(worker_id, &company);
            ExportRow {
                company: CompanyIdentity {
                    name: names.get(&company),
                    id: company.id,
                },
                hours,
                rate,
                amount: rate.map(|r| hours * r),
            }
        })
        .collect();
    rows.sort_by(|a, b| by_folded(&a.company.name, &b.company.name));

    let total_hours = rows.iter().map(|r| r.hours).sum();
    let rated_hours = rows.iter().filter(|r| r.rate.is_some()).map(|r| r.hours).sum();
    let total_amount = rows.iter().filter_map(|r| r.amount).sum();

    let details = match options.detail {
        DetailLevel::Totals => Vec::new(),
        level => detail_rows(worker_id, assignments, context, days, rates, options.epsilon, level, names),
    };

    WorkerBucket {
        worker_id: worker_id.to_string(),
        worker_name,
        rows,
        total_hours,
        rated_hours,
        total_amount,
        details,
    }
}

fn company_buckets(workers: &[WorkerBucket], epsilon: f64) -> Vec<CompanyBucket> {
    let mut buckets: Vec<CompanyBucket> = Vec::new();
    for row in workers.iter().flat_map(|w| &w.rows) {
        let key = row.company.name_key();
        let index = match buckets.iter().position(|b| b.key == key) {
            Some(index) => index,
            None => {
                buckets.push(CompanyBucket {
                    key,
                    name: row.company.name.clone(),
                    total_hours: 0.0,
                    rated_hours: 0.0,
                    total_amount: 0.0,
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[index];
        bucket.total_hours += row.hours;
        if let Some(amount) = row.amount {
            bucket.rated_hours += row.hours;
            bucket.total_amount += amount;
        }
    }
    buckets.retain(|b| b.total_hours.abs() >= epsilon);
    buckets.sort_by(|a, b| by_folded(&a.name, &b.name));
    buckets
}

// ============================================================================
// Detail rows
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn detail_rows(
    worker_id: &str,
    assignments: &[&Assignment],
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
    rates: &dyn RateResolver,
    epsilon: f64,
    level: DetailLevel,
    names: &CanonicalNames,
) -> Vec<DetailRow> {
    let mut rows = Vec::new();

    for day in days {
        let tracked_day = context.day(worker_id, &day.date_key);
        let first_of_day = rows.len();

        for assignment in assignments {
            let company_name = names.get(&assignment.company);
            let rate = rates.hourly_rate(worker_id, &assignment.company);
            let row = |entry: Option<String>, exit: Option<String>, hours: f64, notes: Option<String>| DetailRow {
                date: day.date,
                date_key: day.date_key.clone(),
                day_label: day.label.clone(),
                company: company_name.clone(),
                entry,
                exit,
                hours: Some(hours),
                amount: rate.map(|r| hours * r),
                notes,
            };

            let tracked_entries: Vec<_> = tracked_day
                .map(|d| d.entries_for(&assignment.company).collect())
                .unwrap_or_default();
            let descriptions = join_notes(tracked_entries.iter().filter_map(|e| e.description.clone()));

            if let Some(hours) = manual_hour(assignment, &day.date_key) {
                let valid: Vec<_> = assignment
                    .segments_for(&day.date_key)
                    .iter()
                    .filter(|s| s.is_valid())
                    .collect();
                let entry = valid.first().map(|s| s.start.clone());
                let exit = valid.last().map(|s| s.end.clone());
                let notes = join_notes(valid.iter().filter_map(|s| s.description.clone()));
                if hours.abs() >= epsilon || notes.is_some() {
                    rows.push(row(entry, exit, hours, notes));
                }
                continue;
            }

            match level {
                DetailLevel::Shifts => {
                    for tracked in &tracked_entries {
                        if tracked.work_shifts.is_empty() {
                            if tracked.hours.abs() >= epsilon || tracked.description.is_some() {
                                rows.push(row(None, None, tracked.hours, tracked.description.clone()));
                            }
                            continue;
                        }
                        let per_shift: Option<Vec<f64>> = tracked.work_shifts.iter().map(shift_hours).collect();
                        match per_shift {
                            // Shift rows only when they add up to the entry's resolved hours
                            Some(hours) if (hours.iter().sum::<f64>() - tracked.hours).abs() < SHIFT_SUM_TOLERANCE => {
                                for (n, (shift, hours)) in tracked.work_shifts.iter().zip(hours).enumerate() {
                                    let notes = if n == 0 { tracked.description.clone() } else { None };
                                    if hours.abs() >= epsilon || notes.is_some() {
                                        rows.push(row(clock(&shift.start_time), clock(&shift.end_time), hours, notes));
                                    }
                                }
                            }
                            _ => {
                                let (entry, exit) = shift_span(&tracked.work_shifts);
                                if tracked.hours.abs() >= epsilon || tracked.description.is_some() {
                                    rows.push(row(entry, exit, tracked.hours, tracked.description.clone()));
                                }
                            }
                        }
                    }
                }
                _ => {
                    let hours = resolve_hour(assignment, &day.date_key, context);
                    if hours.abs() >= epsilon || descriptions.is_some() {
                        let shifts: Vec<WorkShift> =
                            tracked_entries.iter().flat_map(|e| e.work_shifts.iter().cloned()).collect();
                        let (entry, exit) = shift_span(&shifts);
                        rows.push(row(entry, exit, hours, descriptions));
                    }
                }
            }
        }

        let day_notes = tracked_day.and_then(|d| join_notes(d.note_entries.iter().map(|n| n.lines.join(OBSERVATION_SEPARATOR))));
        if let Some(day_notes) = day_notes {
            match rows.get_mut(first_of_day) {
                Some(first) => {
                    first.notes = Some(match first.notes.take() {
                        Some(existing) => format!("{existing}{OBSERVATION_SEPARATOR}{day_notes}"),
                        None => day_notes,
                    });
                }
                None => rows.push(DetailRow {
                    date: day.date,
                    date_key: day.date_key.clone(),
                    day_label: day.label.clone(),
                    company: String::new(),
                    entry: None,
                    exit: None,
                    hours: None,
                    amount: None,
                    notes: Some(day_notes),
                }),
            }
        }
    }

    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.entry.cmp(&b.entry))
            .then_with(|| by_folded(&a.company, &b.company))
    });
    rows
}

/// Earliest entry and latest exit clock of a set of shifts
fn shift_span(shifts: &[WorkShift]) -> (Option<String>, Option<String>) {
    let entry = shifts.iter().filter_map(|s| clock(&s.start_time)).min();
    let exit = shifts.iter().filter_map(|s| clock(&s.end_time)).max();
    (entry, exit)
}

fn clock(raw: &Option<String>) -> Option<String> {
    raw.as_deref().and_then(parse_clock).map(format_hhmm)
}

fn join_notes(parts: impl Iterator<Item = String>) -> Option<String> {
    let mut unique: Vec<String> = Vec::new();
    for part in parts.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        if !unique.contains(&part) {
            unique.push(part);
        }
    }
    (!unique.is_empty()).then(|| unique.join(OBSERVATION_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompanyHours, DayNoteEntry, DayScheduleEntry, HourSegment, NoteOrigin, WorkShift, WorkerWeeklyData, WorkerWeeklyDayData};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct FixedRates(HashMap<(String, String), f64>);

    impl RateResolver for FixedRates {
        fn hourly_rate(&self, worker_id: &str, company: &CompanyIdentity) -> Option<f64> {
            self.0.get(&(worker_id.to_string(), company.id.clone())).copied()
        }
    }

    fn rates(entries: &[(&str, &str, f64)]) -> FixedRates {
        FixedRates(
            entries
                .iter()
                .map(|(w, c, r)| ((w.to_string(), c.to_string()), *r))
                .collect(),
        )
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .unwrap()
    }

    fn company(id: &str, name: &str) -> CompanyIdentity {
        CompanyIdentity::resolve(Some(id), Some(name))
    }

    fn assignment(worker: &str, name: &str, company: CompanyIdentity, hours: &[(&str, &str)]) -> Assignment {
        let mut a = Assignment::new(worker, name, company);
        for (key, value) in hours {
            a.set_manual(*key, *value);
        }
        a
    }

    #[test]
    fn amount_only_when_rate_is_known() {
        let list = vec![
            assignment("w1", "Ana", company("c1", "Acme"), &[("2024-01-01", "10")]),
            assignment("w1", "Ana", company("c2", "Beta"), &[("2024-01-01", "10")]),
        ];
        let report = aggregate(
            &list,
            &AssignmentTotalsContext::default(),
            &range(),
            &rates(&[("w1", "c1", 12.5)]),
            &ExportOptions::default(),
        )
        .unwrap();

        let ana = &report.workers[0];
        assert_eq!(ana.rows[0].amount, Some(125.0));
        assert_eq!(ana.rows[1].rate, None);
        assert_eq!(ana.rows[1].amount, None);
        assert_eq!(ana.total_hours, 20.0);
        assert_eq!(ana.rated_hours, 10.0);
        assert_eq!(ana.average_rate(), Some(12.5));
        assert_eq!(ana.amount(), Some(125.0));
    }

    #[test]
    fn zero_rate_is_not_unknown_rate() {
        let list = vec![assignment("w1", "Ana", company("c1", "Acme"), &[("2024-01-01", "8")])];
        let report = aggregate(
            &list,
            &AssignmentTotalsContext::default(),
            &range(),
            &rates(&[("w1", "c1", 0.0)]),
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(report.workers[0].rows[0].amount, Some(0.0));
        assert_eq!(report.workers[0].average_rate(), Some(0.0));
    }

    #[test]
    fn rows_below_epsilon_are_excluded_everywhere() {
        let list = vec![
            assignment("w1", "Ana", company("c1", "Acme"), &[("2024-01-01", "0,005")]),
            assignment("w1", "Ana", company("c2", "Beta"), &[("2024-01-01", "2")]),
        ];
        let report = aggregate(
            &list,
            &AssignmentTotalsContext::default(),
            &range(),
            &NoRates,
            &ExportOptions { epsilon: 0.01, detail: DetailLevel::Totals },
        )
        .unwrap();
        assert_eq!(report.workers[0].rows.len(), 1);
        assert_eq!(report.workers[0].rows[0].company.name, "Beta");
        assert_eq!(report.companies.len(), 1);
        assert_eq!(report.companies[0].name, "Beta");
    }

    #[test]
    fn empty_result_fails_loudly() {
        let list = vec![assignment("w1", "Ana", company("c1", "Acme"), &[])];
        let err = aggregate(
            &list,
            &AssignmentTotalsContext::default(),
            &range(),
            &NoRates,
            &ExportOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AggregationError::NoData { start: range().start, end: range().end }
        );
        assert!(err.to_string().contains("No data in selected range"));
    }

    #[test]
    fn workers_and_companies_sort_accent_insensitively() {
        let list = vec![
            assignment("w2", "Óscar", company("c1", "acme"), &[("2024-01-01", "1")]),
            assignment("w1", "oliva", company("c2", "Álamo"), &[("2024-01-01", "1")]),
            assignment("w3", "Zoe", company("c9", "ACME"), &[("2024-01-01", "2")]),
        ];
        let report = aggregate(
            &list,
            &AssignmentTotalsContext::default(),
            &range(),
            &NoRates,
            &ExportOptions::default(),
        )
        .unwrap();
        let workers: Vec<_> = report.workers.iter().map(|w| w.worker_name.as_str()).collect();
        assert_eq!(workers, vec!["oliva", "Óscar", "Zoe"]);
        let companies: Vec<_> = report.companies.iter().map(|c| (c.name.as_str(), c.total_hours)).collect();
        assert_eq!(companies, vec![("acme", 3.0), ("Álamo", 1.0)]);
        // Every row of the same company shows the same spelling
        assert_eq!(report.workers[2].rows[0].company.name, "acme");
    }

    #[test]
    fn detail_levels_shape_worker_rows() {
        let acme = company("c1", "Acme");
        let mut day = WorkerWeeklyDayData::default();
        let hours = CompanyHours { company_id: "c1".into(), name: "Acme".into(), hours: 6.0 };
        day.company_hours.insert(acme.id_key(), hours.clone());
        day.company_hours.insert(acme.name_key(), hours);
        day.total_hours = 6.0;
        day.entries.push(DayScheduleEntry {
            id: "e1".into(),
            source_id: Some("e1".into()),
            company_id: Some("c1".into()),
            company_name: Some("Acme".into()),
            company: acme.clone(),
            hours: 6.0,
            description: Some("Montaje".into()),
            work_shifts: vec![
                WorkShift { id: "s2".into(), start_time: Some("14:00".into()), end_time: Some("16:00".into()), hours: None },
                WorkShift { id: "s1".into(), start_time: Some("08:00".into()), end_time: Some("12:00".into()), hours: None },
            ],
            raw: serde_json::Value::Null,
        });
        let mut notes_day = WorkerWeeklyDayData::default();
        notes_day.note_entries.push(DayNoteEntry {
            id: "n1".into(),
            origin: NoteOrigin::NotesFeed,
            company: None,
            lines: vec!["Baja médica".into()],
        });
        let mut data = WorkerWeeklyData { worker_id: "w1".into(), ..Default::default() };
        data.days.insert("2024-01-01".into(), day);
        data.days.insert("2024-01-02".into(), notes_day);
        let ctx = AssignmentTotalsContext::new([data]);
        let list = vec![assignment("w1", "Ana", acme, &[])];

        let shifts = aggregate(&list, &ctx, &range(), &rates(&[("w1", "c1", 10.0)]), &ExportOptions::default()).unwrap();
        let details = &shifts.workers[0].details;
        assert_eq!(details.len(), 3);
        assert_eq!(details[0].entry.as_deref(), Some("08:00"));
        assert_eq!(details[0].hours, Some(4.0));
        assert_eq!(details[0].amount, Some(40.0));
        assert_eq!(details[1].entry.as_deref(), Some("14:00"));
        assert_eq!(details[1].notes.as_deref(), Some("Montaje"));
        assert_eq!(details[2].hours, None);
        assert_eq!(details[2].notes.as_deref(), Some("Baja médica"));

        let daily = aggregate(
            &list,
            &ctx,
            &range(),
            &NoRates,
            &ExportOptions { detail: DetailLevel::Daily, ..Default::default() },
        )
        .unwrap();
        let details = &daily.workers[0].details;
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].hours, Some(6.0));
        assert_eq!((details[0].entry.as_deref(), details[0].exit.as_deref()), (Some("08:00"), Some("16:00")));

        let totals = aggregate(
            &list,
            &ctx,
            &range(),
            &NoRates,
            &ExportOptions { detail: DetailLevel::Totals, ..Default::default() },
        )
        .unwrap();
        assert!(totals.workers[0].details.is_empty());
        assert_eq!(totals.detail_workers().count(), 0);
    }

    #[test]
    fn manual_value_without_shifts_yields_one_row() {
        let mut a = assignment("w1", "Ana", company("c1", "Acme"), &[("2024-01-02", "3,5")]);
        a.set_segments("2024-01-02", vec![HourSegment::new("x", "bad", "10:00")]);
        let report = aggregate(
            &[a],
            &AssignmentTotalsContext::default(),
            &range(),
            &NoRates,
            &ExportOptions::default(),
        )
        .unwrap();
        let details = &report.workers[0].details;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].hours, Some(3.5));
        assert_eq!(details[0].entry, None);
        assert_eq!(details[0].day_label, "martes");
    }

    #[test]
    fn segments_without_value_drive_totals_and_detail() {
        let mut a = Assignment::new("w1", "Ana", company("c1", "Acme"));
        a.set_segments(
            "2024-01-02",
            vec![HourSegment::new("s1", "08:00", "12:00"), HourSegment::new("s2", "13:00", "14:30")],
        );
        let report = aggregate(
            &[a],
            &AssignmentTotalsContext::default(),
            &range(),
            &NoRates,
            &ExportOptions::default(),
        )
        .unwrap();
        let worker = &report.workers[0];
        assert_eq!(worker.total_hours, 5.5);
        assert_eq!(worker.details.len(), 1);
        assert_eq!(worker.details[0].entry.as_deref(), Some("08:00"));
        assert_eq!(worker.details[0].exit.as_deref(), Some("14:30"));
        assert_eq!(worker.details[0].hours, Some(5.5));
    }

    #[test]
    fn detail_level_parses_from_text() {
        assert_eq!("Shifts".parse::<DetailLevel>(), Ok(DetailLevel::Shifts));
        assert_eq!("daily".parse::<DetailLevel>(), Ok(DetailLevel::Daily));
        assert!("weekly".parse::<DetailLevel>().is_err());
        assert_eq!(DetailLevel::Totals.to_string(), "totals");
    }
}
