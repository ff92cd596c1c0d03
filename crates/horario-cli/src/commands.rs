//! Subcommand implementations
//!
//! Every command loads the same session: directory, assignments, manual
//! edits and concurrently fetched weekly data for the selected range.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use horario_core::directory::build_all_assignments;
use horario_core::hours::{calculate_row_total, calculate_totals, resolve_hour};
use horario_core::save::plan_save;
use horario_core::{
    aggregate, Assignment, AssignmentTotalsContext, CompanyDirectory, DateRange, DetailLevel,
    DirectoryRates, PayrollReport, ReportRenderer, WorkerRecord,
};
use horario_feed::{fetch_weekly_data, DirectoryFeed, JsonFileFeed};
use horario_render::{export_file_name, ExcelRenderer, TextRenderer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::manual::{apply_edits, load_edits, MANUAL_FILE};

/// Data source and date window shared by all subcommands
#[derive(Args, Clone, Debug)]
pub struct Selection {
    /// Data directory (directory.json, entries/<workerId>.json)
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: NaiveDate,

    /// Only these worker ids (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub workers: Vec<String>,

    /// Manual edits file (defaults to <DIR>/manual.json when present)
    #[arg(long, value_name = "FILE")]
    pub manual: Option<PathBuf>,
}

pub struct Session {
    pub range: DateRange,
    pub workers: Vec<WorkerRecord>,
    pub companies: CompanyDirectory,
    pub assignments: Vec<Assignment>,
    pub context: AssignmentTotalsContext,
}

impl Session {
    fn report(&self, config: &AppConfig, detail: Option<DetailLevel>) -> Result<PayrollReport> {
        let rates = DirectoryRates::new(&self.workers, &self.companies);
        let report = aggregate(
            &self.assignments,
            &self.context,
            &self.range,
            &rates,
            &config.export_options(detail),
        )?;
        Ok(report)
    }
}

pub async fn load_session(selection: &Selection, config: &AppConfig) -> Result<Session> {
    let range = DateRange::new(selection.from, selection.to)?;
    let feed = Arc::new(JsonFileFeed::new(&selection.data));

    let mut workers = feed.workers().await.context("loading worker directory")?;
    if !selection.workers.is_empty() {
        for id in &selection.workers {
            if !workers.iter().any(|w| &w.id == id) {
                warn!(worker_id = %id, "unknown worker id");
            }
        }
        workers.retain(|w| selection.workers.contains(&w.id));
    }
    if workers.is_empty() {
        bail!("no workers selected");
    }

    let labels = feed.company_labels().await.context("loading company labels")?;
    let companies = CompanyDirectory::new(labels);
    let mut assignments = build_all_assignments(&workers, &companies);

    let manual_path = selection.manual.clone().or_else(|| {
        let path = selection.data.join(MANUAL_FILE);
        path.is_file().then_some(path)
    });
    if let Some(path) = manual_path {
        let edits = load_edits(&path)?;
        let applied = apply_edits(&mut assignments, &edits, &companies, &range);
        info!(applied, total = edits.len(), "manual edits applied");
    }

    let ids: Vec<String> = workers.iter().map(|w| w.id.clone()).collect();
    let fetched = fetch_weekly_data(feed, &ids, range, config.daily_options()).await;
    let names: HashMap<&str, &str> = workers.iter().map(|w| (w.id.as_str(), w.name.as_str())).collect();
    if let Some(warning) = fetched.warning_with(|id| names.get(id).copied().unwrap_or(id).to_string()) {
        warn!(failed = fetched.failures.len(), "partial fetch");
        eprintln!("warning: {warning}");
    }

    info!(
        workers = workers.len(),
        assignments = assignments.len(),
        days = range.len_days(),
        "session loaded"
    );
    Ok(Session {
        range,
        context: fetched.context(),
        workers,
        companies,
        assignments,
    })
}

/// Write the workbook into `out`; returns its path
pub async fn export(
    selection: &Selection,
    detail: Option<DetailLevel>,
    out: &Path,
    config: &AppConfig,
) -> Result<PathBuf> {
    let session = load_session(selection, config).await?;
    let report = session.report(config, detail)?;

    let renderer = ExcelRenderer::new()
        .title(config.export.title.clone())
        .currency(config.export.currency.clone())
        .summary_sheet(config.export.summary_sheet.clone());
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let path = out.join(export_file_name(&session.range));
    renderer.save(&report, &path)?;
    Ok(path)
}

/// Hours grid (assignments × days) followed by the payroll summary
pub async fn totals(selection: &Selection, config: &AppConfig) -> Result<String> {
    let session = load_session(selection, config).await?;
    let days = session.range.days();
    let mut out = String::new();

    out.push_str(&format!("{:<36}", "ASSIGNMENT"));
    for day in &days {
        out.push_str(&format!(" {:>7}", format!("{} {:02}", day.short_label, day.day_of_month)));
    }
    out.push_str(&format!(" {:>8}\n", "TOTAL"));

    for assignment in &session.assignments {
        let label = format!("{} / {}", assignment.worker_name, assignment.company.name);
        out.push_str(&format!("{:<36}", truncate(&label, 36)));
        for day in &days {
            let hours = resolve_hour(assignment, &day.date_key, &session.context);
            out.push_str(&format!(" {:>7.2}", hours));
        }
        let row_total = calculate_row_total(assignment, &session.context, &days);
        out.push_str(&format!(" {:>8.2}\n", row_total));
    }

    let column_totals = calculate_totals(&session.assignments, &session.context, &days);
    out.push_str(&format!("{:<36}", "TOTAL"));
    for total in column_totals.values() {
        out.push_str(&format!(" {:>7.2}", total));
    }
    out.push_str(&format!(" {:>8.2}\n\n", column_totals.values().sum::<f64>()));

    let report = session.report(config, Some(DetailLevel::Totals))?;
    let summary = TextRenderer::new()
        .title(config.export.title.clone())
        .currency(config.export.currency.clone())
        .render(&report)?;
    out.push_str(&summary);
    Ok(out)
}

/// Save-back records as pretty JSON
pub async fn save_plan(selection: &Selection, config: &AppConfig) -> Result<String> {
    let session = load_session(selection, config).await?;
    let records = plan_save(&session.assignments, &session.context, &session.range.days());
    info!(records = records.len(), "save plan built");
    Ok(serde_json::to_string_pretty(&records)?)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max - 3).collect();
        cut.push_str("...");
        cut
    }
}
