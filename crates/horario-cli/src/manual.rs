//! Manual hour edits (`manual.json`)
//!
//! A list of cell overrides applied to the assignments before aggregation:
//!
//! ```json
//! [
//!   { "workerId": "w1", "companyId": "c1", "date": "2024-03-04", "value": "7,5" },
//!   { "workerId": "w1", "companyName": "Acme", "date": "2024-03-05",
//!     "segments": [{ "id": "s1", "start": "08:00", "end": "12:00" }] }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use horario_core::{Assignment, CompanyDirectory, DateRange, HourSegment};
use serde::Deserialize;
use tracing::{debug, warn};

/// File looked up in the data directory when `--manual` is not given
pub const MANUAL_FILE: &str = "manual.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEdit {
    pub worker_id: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub date: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<HourSegment>>,
}

pub fn load_edits(path: &Path) -> Result<Vec<ManualEdit>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading manual edits {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing manual edits {}", path.display()))
}

/// Apply edits in order; returns how many matched an assignment
pub fn apply_edits(
    assignments: &mut [Assignment],
    edits: &[ManualEdit],
    companies: &CompanyDirectory,
    range: &DateRange,
) -> usize {
    let mut applied = 0;
    for edit in edits {
        if !range.contains(&edit.date) {
            debug!(worker_id = %edit.worker_id, date = %edit.date, "manual edit outside range");
            continue;
        }
        let company = companies.resolve(edit.company_id.as_deref(), edit.company_name.as_deref());
        let target = assignments.iter_mut().find(|a| {
            a.worker_id == edit.worker_id
                && (a.company.id_key() == company.id_key() || a.company.name_key() == company.name_key())
        });
        let Some(assignment) = target else {
            warn!(worker_id = %edit.worker_id, company = %company.name, "manual edit matches no assignment");
            continue;
        };

        match edit.value.as_deref() {
            Some(value) if !value.trim().is_empty() => assignment.set_manual(edit.date.clone(), value),
            Some(_) => assignment.clear_manual(&edit.date),
            None => {}
        }
        if let Some(segments) = &edit.segments {
            for segment in segments {
                if let Err(e) = segment.validate() {
                    warn!(worker_id = %edit.worker_id, date = %edit.date, error = %e, "invalid segment");
                }
            }
            assignment.set_segments(edit.date.clone(), segments.clone());
        }
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use horario_core::CompanyIdentity;

    fn setup() -> (Vec<Assignment>, CompanyDirectory, DateRange) {
        let companies = CompanyDirectory::new([("c1".to_string(), "Acme".to_string())]);
        let assignments = vec![Assignment::new("w1", "Ana", companies.resolve(Some("c1"), None))];
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        (assignments, companies, DateRange::single(day))
    }

    fn edits(json: &str) -> Vec<ManualEdit> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn edit_matches_by_name_or_id() {
        let (mut assignments, companies, range) = setup();
        let list = edits(
            r#"[
                { "workerId": "w1", "companyName": "ACME", "date": "2024-03-04", "value": "7,5" },
                { "workerId": "w1", "companyId": "c1", "date": "2024-03-04",
                  "segments": [{ "id": "s1", "start": "08:00", "end": "12:00" }] }
            ]"#,
        );
        assert_eq!(apply_edits(&mut assignments, &list, &companies, &range), 2);
        assert_eq!(assignments[0].manual("2024-03-04"), Some("7,5"));
        assert_eq!(assignments[0].segments_for("2024-03-04").len(), 1);
    }

    #[test]
    fn unmatched_and_out_of_range_edits_are_skipped() {
        let (mut assignments, companies, range) = setup();
        let list = edits(
            r#"[
                { "workerId": "w2", "companyId": "c1", "date": "2024-03-04", "value": "1" },
                { "workerId": "w1", "companyId": "c1", "date": "2024-03-05", "value": "1" }
            ]"#,
        );
        assert_eq!(apply_edits(&mut assignments, &list, &companies, &range), 0);
        assert!(assignments[0].hours.is_empty());
    }

    #[test]
    fn blank_value_clears_override() {
        let (mut assignments, companies, range) = setup();
        assignments[0].set_manual("2024-03-04", "3");
        let list = edits(r#"[{ "workerId": "w1", "companyId": "c1", "date": "2024-03-04", "value": " " }]"#);
        apply_edits(&mut assignments, &list, &companies, &range);
        assert_eq!(assignments[0].manual("2024-03-04"), None);
        assert_eq!(assignments[0].company, CompanyIdentity::resolve(Some("c1"), Some("Acme")));
    }
}
