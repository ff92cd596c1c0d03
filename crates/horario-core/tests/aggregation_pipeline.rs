//! Integration tests: raw feed records through to the payroll report

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;

use horario_core::daily::{build_worker_weekly_data, DailyOptions};
use horario_core::directory::{build_all_assignments, CompanyLink};
use horario_core::hours::{calculate_row_total, calculate_totals};
use horario_core::save::plan_save;
use horario_core::{
    aggregate, AggregationError, AssignmentTotalsContext, CompanyDirectory, DateRange,
    DetailLevel, DirectoryRates, ExportOptions, WorkerRecord,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn week() -> DateRange {
    DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap()
}

fn directory() -> CompanyDirectory {
    CompanyDirectory::new([
        ("c1".to_string(), "Acme".to_string()),
        ("c2".to_string(), "Globex".to_string()),
    ])
}

fn workers() -> Vec<WorkerRecord> {
    vec![
        WorkerRecord {
            id: "w1".into(),
            name: "Lucía Gómez".into(),
            contracts: vec![CompanyLink {
                company_id: Some("c1".into()),
                company_name: None,
                hourly_rate: Some(dec!(15)),
            }],
            relations: vec![CompanyLink {
                company_id: Some("c2".into()),
                company_name: None,
                hourly_rate: None,
            }],
            ..Default::default()
        },
        WorkerRecord {
            id: "w2".into(),
            name: "alberto ruiz".into(),
            ..Default::default()
        },
    ]
}

#[test]
fn feed_records_flow_into_report() {
    let range = week();
    let options = DailyOptions::default();

    // 23:30 UTC on Monday lands on Tuesday after the fixed offset
    let lucia_hours = vec![
        json!({ "id": "e1", "dateTime": "2024-01-01T06:00:00Z", "companyId": "c1", "value": "6,5" }),
        json!({ "id": "e2", "dateTime": "2024-01-01T23:30:00Z", "company": { "name": "globex" },
                "workShifts": [{ "startTime": "09:00", "endTime": "11:00" }] }),
        json!({ "id": "e3", "dateTime": "not a date", "value": 9 }),
    ];
    let lucia_notes = vec![json!({ "id": "n1", "date": "2024-01-03", "value": { "text": "Formación" } })];
    let alberto_hours = vec![json!({ "dateTime": "2024-01-05", "companyName": "Sin empresa", "hours": 3 })];

    let context = AssignmentTotalsContext::new([
        build_worker_weekly_data("w1", &lucia_hours, &lucia_notes, &range, &options),
        build_worker_weekly_data("w2", &alberto_hours, &[], &range, &options),
    ]);

    let assignments = build_all_assignments(&workers(), &directory());
    assert_eq!(assignments.len(), 3);

    let days = range.days();
    assert_eq!(calculate_row_total(&assignments[0], &context, &days), 6.5);
    assert_eq!(calculate_row_total(&assignments[1], &context, &days), 2.0);
    assert_eq!(calculate_row_total(&assignments[2], &context, &days), 3.0);

    let columns = calculate_totals(&assignments, &context, &days);
    assert_eq!(columns["2024-01-01"], 6.5);
    assert_eq!(columns["2024-01-02"], 2.0);
    assert_eq!(columns["2024-01-05"], 3.0);

    let rates = DirectoryRates::new(&workers(), &directory());
    let report = aggregate(&assignments, &context, &range, &rates, &ExportOptions::default()).unwrap();

    let names: Vec<_> = report.workers.iter().map(|w| w.worker_name.as_str()).collect();
    assert_eq!(names, vec!["alberto ruiz", "Lucía Gómez"]);

    let lucia = &report.workers[1];
    assert_eq!(lucia.total_hours, 8.5);
    assert_eq!(lucia.rated_hours, 6.5);
    assert_eq!(lucia.amount(), Some(97.5));
    assert_eq!(lucia.average_rate(), Some(15.0));

    let companies: Vec<_> = report.companies.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(companies, vec!["Acme", "Globex", "Sin empresa asignada"]);

    // Shift rows plus a notes-only row on Wednesday
    let detail: Vec<_> = lucia
        .details
        .iter()
        .map(|d| (d.date_key.as_str(), d.hours, d.notes.as_deref()))
        .collect();
    assert_eq!(
        detail,
        vec![
            ("2024-01-01", Some(6.5), None),
            ("2024-01-02", Some(2.0), None),
            ("2024-01-03", None, Some("Formación")),
        ]
    );
}

#[test]
fn manual_edits_override_and_plan_saves() {
    let range = week();
    let hours = vec![json!({ "id": "e1", "dateTime": "2024-01-02T08:00:00Z", "companyId": "c1", "value": 5 })];
    let context = AssignmentTotalsContext::new([build_worker_weekly_data(
        "w1",
        &hours,
        &[],
        &range,
        &DailyOptions::default(),
    )]);

    let mut assignments = build_all_assignments(&workers()[..1], &directory());
    assignments[0].set_manual("2024-01-02", "3,5");

    let report = aggregate(
        &assignments,
        &context,
        &range,
        &DirectoryRates::new(&workers(), &directory()),
        &ExportOptions { detail: DetailLevel::Totals, ..Default::default() },
    )
    .unwrap();
    assert_eq!(report.workers[0].rows[0].hours, 3.5);
    assert_eq!(report.workers[0].rows[0].amount, Some(52.5));

    let saves = plan_save(&assignments, &context, &range.days());
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].id, "e1");
    assert_eq!(saves[0].value, "3.50");
}

#[test]
fn empty_window_is_an_error() {
    let range = DateRange::single(date(2024, 2, 1));
    let assignments = build_all_assignments(&workers(), &directory());
    let err = aggregate(
        &assignments,
        &AssignmentTotalsContext::default(),
        &range,
        &DirectoryRates::default(),
        &ExportOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AggregationError::NoData { start: date(2024, 2, 1), end: date(2024, 2, 1) }
    );
}

#[test]
fn shift_detail_reconciles_with_summary() {
    let range = week();
    let hours = vec![
        // Explicit value wins over the single two-hour shift
        json!({ "id": "a", "date": "2024-01-02", "companyId": "c1", "value": "6,5",
                "workShifts": [{ "startTime": "08:00", "endTime": "10:00" }] }),
        // Shift without usable times
        json!({ "id": "b", "date": "2024-01-03", "companyId": "c1", "hours": 3,
                "workShifts": [{ "startTime": "late" }] }),
        // Consistent shifts keep one row each
        json!({ "id": "c", "date": "2024-01-04", "companyId": "c1",
                "workShifts": [
                    { "startTime": "08:00", "endTime": "12:00" },
                    { "startTime": "13:00", "endTime": "15:00" }
                ] }),
    ];
    let context = AssignmentTotalsContext::new([build_worker_weekly_data(
        "w1",
        &hours,
        &[],
        &range,
        &DailyOptions::default(),
    )]);
    let assignments = build_all_assignments(&workers(), &directory());
    let rates = DirectoryRates::new(&workers(), &directory());
    let report = aggregate(&assignments, &context, &range, &rates, &ExportOptions::default()).unwrap();

    let lucia = report.workers.iter().find(|w| w.worker_id == "w1").unwrap();
    assert_eq!(lucia.total_hours, 15.5);

    let detail_hours: f64 = lucia.details.iter().filter_map(|d| d.hours).sum();
    let detail_amount: f64 = lucia.details.iter().filter_map(|d| d.amount).sum();
    assert_eq!(detail_hours, lucia.total_hours);
    assert_eq!(detail_amount, lucia.total_amount);

    let rows: Vec<_> = lucia
        .details
        .iter()
        .map(|d| (d.date_key.as_str(), d.entry.as_deref(), d.exit.as_deref(), d.hours))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-01-02", Some("08:00"), Some("10:00"), Some(6.5)),
            ("2024-01-03", None, None, Some(3.0)),
            ("2024-01-04", Some("08:00"), Some("12:00"), Some(4.0)),
            ("2024-01-04", Some("13:00"), Some("15:00"), Some(2.0)),
        ]
    );

    // Only ids carried by the feed are kept as source ids
    let day = context.day("w1", "2024-01-02").unwrap();
    assert_eq!(day.entries[0].source_id.as_deref(), Some("a"));
}
