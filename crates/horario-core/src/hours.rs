//! Hour value resolution and assignment totals
//!
//! Every cell shown to a user or written to a spreadsheet goes through
//! [`resolve_hour`]:
//!
//! 1. a non-blank manual value wins, parsed with `,` or `.` as separator
//!    (zero and negative values included, unparseable text counts as 0)
//! 2. otherwise the sum of the valid edited segments, when there are any
//! 3. otherwise the tracked hours for the assignment's company that day
//!    (id axis first, then name axis)
//! 4. otherwise 0
//!
//! Totals are plain reductions over that function. They are cheap enough
//! (assignments × days) to be recomputed whenever any input changes.

use std::collections::BTreeMap;

use crate::company::fold_text;
use crate::fields::parse_decimal;
use crate::segments::segments_total;
use crate::{Assignment, AssignmentTotalsContext, DateKey, DayDescriptor};

/// Effective hours of one (assignment, day) cell
pub fn resolve_hour(assignment: &Assignment, date_key: &str, context: &AssignmentTotalsContext) -> f64 {
    manual_hour(assignment, date_key)
        .or_else(|| tracked_hour(assignment, date_key, context))
        .unwrap_or(0.0)
}

/// User-entered hours for a cell: the typed value, else the valid segments
pub fn manual_hour(assignment: &Assignment, date_key: &str) -> Option<f64> {
    if let Some(manual) = assignment.manual(date_key) {
        return Some(parse_decimal(manual).unwrap_or(0.0));
    }
    let segments = assignment.segments_for(date_key);
    segments
        .iter()
        .any(|s| s.is_valid())
        .then(|| segments_total(segments))
}

/// Tracked hours only, ignoring any manual override
pub fn tracked_hour(
    assignment: &Assignment,
    date_key: &str,
    context: &AssignmentTotalsContext,
) -> Option<f64> {
    context
        .day(&assignment.worker_id, date_key)
        .and_then(|day| day.hours_for(&assignment.company))
}

/// Sum of [`resolve_hour`] across the day list
pub fn calculate_row_total(
    assignment: &Assignment,
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
) -> f64 {
    days.iter()
        .map(|day| resolve_hour(assignment, &day.date_key, context))
        .sum()
}

/// Per-day column sums over all assignments
pub fn calculate_totals(
    assignments: &[Assignment],
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
) -> BTreeMap<DateKey, f64> {
    days.iter()
        .map(|day| {
            let total = assignments
                .iter()
                .map(|a| resolve_hour(a, &day.date_key, context))
                .sum();
            (day.date_key.clone(), total)
        })
        .collect()
}

/// Axis for grouped subtotals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupBy {
    Company,
    Worker,
}

/// Subtotal of every assignment sharing a company or a worker
#[derive(Clone, Debug, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub label: String,
    pub per_day: BTreeMap<DateKey, f64>,
    pub total: f64,
    pub assignment_count: usize,
}

/// Grouped subtotals, ordered by folded label
pub fn group_totals(
    assignments: &[Assignment],
    context: &AssignmentTotalsContext,
    days: &[DayDescriptor],
    group_by: GroupBy,
) -> Vec<GroupTotal> {
    let mut groups: BTreeMap<String, GroupTotal> = BTreeMap::new();

    for assignment in assignments {
        let (key, label) = match group_by {
            GroupBy::Company => (assignment.company.name_key(), assignment.company.name.clone()),
            GroupBy::Worker => (assignment.worker_id.clone(), assignment.worker_name.clone()),
        };
        let group = groups.entry(key.clone()).or_insert_with(|| GroupTotal {
            key,
            label,
            per_day: days.iter().map(|d| (d.date_key.clone(), 0.0)).collect(),
            total: 0.0,
            assignment_count: 0,
        });
        group.assignment_count += 1;
        for day in days {
            let hours = resolve_hour(assignment, &day.date_key, context);
            *group.per_day.entry(day.date_key.clone()).or_default() += hours;
            group.total += hours;
        }
    }

    let mut result: Vec<GroupTotal> = groups.into_values().collect();
    result.sort_by(|a, b| fold_text(&a.label).cmp(&fold_text(&b.label)).then_with(|| a.key.cmp(&b.key)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompanyHours, CompanyIdentity, DateRange, HourSegment, WorkerWeeklyData, WorkerWeeklyDayData};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn days() -> Vec<DayDescriptor> {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap()
        .days()
    }

    fn acme() -> CompanyIdentity {
        CompanyIdentity::resolve(Some("c1"), Some("Acme"))
    }

    fn tracked(worker: &str, company: &CompanyIdentity, hours: &[(&str, f64)]) -> WorkerWeeklyData {
        let mut data = WorkerWeeklyData {
            worker_id: worker.into(),
            ..Default::default()
        };
        for (key, h) in hours {
            let mut day = WorkerWeeklyDayData::default();
            let entry = CompanyHours {
                company_id: company.id.clone(),
                name: company.name.clone(),
                hours: *h,
            };
            day.company_hours.insert(company.id_key(), entry.clone());
            day.company_hours.insert(company.name_key(), entry);
            day.total_hours = *h;
            data.days.insert((*key).into(), day);
        }
        data
    }

    #[test]
    fn manual_value_beats_tracked_value() {
        let ctx = AssignmentTotalsContext::new([tracked("w1", &acme(), &[("2024-01-01", 5.0)])]);
        let mut a = Assignment::new("w1", "Ana", acme());

        a.set_manual("2024-01-01", "3,5");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 3.5);

        a.set_manual("2024-01-01", "");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 5.0);
    }

    #[test]
    fn edited_segments_stand_in_for_a_missing_value() {
        let ctx = AssignmentTotalsContext::new([tracked("w1", &acme(), &[("2024-01-01", 5.0)])]);
        let mut a = Assignment::new("w1", "Ana", acme());

        a.set_segments(
            "2024-01-01",
            vec![HourSegment::new("s1", "08:00", "10:30"), HourSegment::new("s2", "bad", "12:00")],
        );
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 2.5);
        assert_eq!(calculate_row_total(&a, &ctx, &days()), 2.5);

        a.set_manual("2024-01-01", "1");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 1.0);

        // Only invalid segments leave the tracked value in place
        a.set_manual("2024-01-01", "");
        a.set_segments("2024-01-01", vec![HourSegment::new("s3", "12:00", "09:00")]);
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 5.0);
    }

    #[test]
    fn manual_zero_and_negative_are_kept() {
        let ctx = AssignmentTotalsContext::new([tracked("w1", &acme(), &[("2024-01-01", 5.0)])]);
        let mut a = Assignment::new("w1", "Ana", acme());
        a.set_manual("2024-01-01", "0");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 0.0);
        a.set_manual("2024-01-01", "-1,25");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), -1.25);
        a.set_manual("2024-01-01", "n/a");
        assert_eq!(resolve_hour(&a, "2024-01-01", &ctx), 0.0);
    }

    #[test]
    fn tracked_lookup_falls_back_to_name_axis() {
        let tracked_as = CompanyIdentity::resolve(Some("legacy-7"), Some("ACME"));
        let ctx = AssignmentTotalsContext::new([tracked("w1", &tracked_as, &[("2024-01-02", 4.0)])]);
        let a = Assignment::new("w1", "Ana", acme());
        assert_eq!(resolve_hour(&a, "2024-01-02", &ctx), 4.0);
        assert_eq!(resolve_hour(&a, "2024-01-03", &ctx), 0.0);
    }

    #[test]
    fn row_total_sums_resolved_cells() {
        let ctx = AssignmentTotalsContext::new([tracked("w1", &acme(), &[("2024-01-02", 4.0)])]);
        let mut a = Assignment::new("w1", "Ana", acme());
        a.set_manual("2024-01-01", "2");
        a.set_manual("2024-01-02", "");
        a.set_manual("2024-01-03", "1,5");
        assert_eq!(calculate_row_total(&a, &ctx, &days()), 7.5);
    }

    #[test]
    fn column_totals_cover_every_day() {
        let ctx = AssignmentTotalsContext::new([tracked("w1", &acme(), &[("2024-01-02", 4.0)])]);
        let mut a = Assignment::new("w1", "Ana", acme());
        a.set_manual("2024-01-01", "2");
        let mut b = Assignment::new("w2", "Luis", acme());
        b.set_manual("2024-01-01", "1");

        let totals = calculate_totals(&[a, b], &ctx, &days());
        assert_eq!(totals.len(), 3);
        assert_eq!(totals["2024-01-01"], 3.0);
        assert_eq!(totals["2024-01-02"], 4.0);
        assert_eq!(totals["2024-01-03"], 0.0);
    }

    #[test]
    fn absent_data_degenerates_to_zero() {
        let ctx = AssignmentTotalsContext::default();
        let a = Assignment::new("w1", "Ana", acme());
        assert_eq!(calculate_row_total(&a, &ctx, &days()), 0.0);
        assert!(calculate_totals(&[], &ctx, &days()).values().all(|v| *v == 0.0));
    }

    #[test]
    fn group_by_company_merges_name_variants() {
        let ctx = AssignmentTotalsContext::default();
        let mut a = Assignment::new("w1", "Ana", acme());
        a.set_manual("2024-01-01", "2");
        let mut b = Assignment::new("w2", "Luis", CompanyIdentity::resolve(Some("c-other"), Some("acme")));
        b.set_manual("2024-01-02", "3");
        let mut c = Assignment::new("w2", "Luis", CompanyIdentity::resolve(None, Some("Beta")));
        c.set_manual("2024-01-02", "1");

        let by_company = group_totals(&[a.clone(), b.clone(), c.clone()], &ctx, &days(), GroupBy::Company);
        assert_eq!(by_company.len(), 2);
        assert_eq!(by_company[0].label, "Acme");
        assert_eq!(by_company[0].total, 5.0);
        assert_eq!(by_company[0].assignment_count, 2);
        assert_eq!(by_company[1].label, "Beta");

        let by_worker = group_totals(&[a, b, c], &ctx, &days(), GroupBy::Worker);
        assert_eq!(by_worker.len(), 2);
        assert_eq!(by_worker[1].label, "Luis");
        assert_eq!(by_worker[1].per_day["2024-01-02"], 4.0);
    }
}
