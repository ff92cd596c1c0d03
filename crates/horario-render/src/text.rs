//! Plain-text payroll summary for console output

use std::fmt::Write;

use horario_core::{PayrollReport, ReportRenderer};

use crate::layout::{range_subtitle, SUMMARY_HEADERS, TOTAL_LABEL};
use crate::RenderError;

/// Plain text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    pub title: String,
    pub currency: String,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            title: "CONTROL HORARIO".into(),
            currency: "€".into(),
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    fn money(&self, value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{v:.2} {}", self.currency))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

impl ReportRenderer for TextRenderer {
    type Output = String;
    type Error = RenderError;

    fn render(&self, report: &PayrollReport) -> Result<String, RenderError> {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", range_subtitle(report));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<24} {:<24} {:>8} {:>12} {:>14}",
            SUMMARY_HEADERS[0], SUMMARY_HEADERS[1], SUMMARY_HEADERS[2], SUMMARY_HEADERS[3], SUMMARY_HEADERS[4]
        );

        for worker in report.summary_workers() {
            for (n, row) in worker.rows.iter().enumerate() {
                let name = if n == 0 { truncate(&worker.worker_name, 24) } else { String::new() };
                let _ = writeln!(
                    out,
                    "{:<24} {:<24} {:>8.2} {:>12} {:>14}",
                    name,
                    truncate(&row.company.name, 24),
                    row.hours,
                    self.money(row.rate),
                    self.money(row.amount)
                );
            }
            let _ = writeln!(
                out,
                "{:<24} {:<24} {:>8.2} {:>12} {:>14}",
                "",
                TOTAL_LABEL,
                worker.total_hours,
                self.money(worker.average_rate()),
                self.money(worker.amount())
            );
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "EMPRESAS");
        for company in &report.companies {
            let amount = (company.rated_hours != 0.0).then_some(company.total_amount);
            let _ = writeln!(
                out,
                "  {:<40} {:>8.2} {:>14}",
                truncate(&company.name, 40),
                company.total_hours,
                self.money(amount)
            );
        }
        let rated = report.workers.iter().any(|w| w.rated_hours != 0.0);
        let _ = writeln!(
            out,
            "  {:<40} {:>8.2} {:>14}",
            TOTAL_LABEL,
            report.total_hours(),
            self.money(rated.then(|| report.total_amount()))
        );
        Ok(out)
    }
}
