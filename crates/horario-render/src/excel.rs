//! XLSX payroll workbook renderer
//!
//! Replays a [`WorkbookLayout`] onto a `rust_xlsxwriter` workbook:
//! - Summary sheet: worker blocks with live formulas, company block in G:H
//! - One detail sheet per worker with hours or notes (detail levels
//!   `daily` and `shifts`)
//!
//! Formula cells are written with their cached results so viewers that do
//! not recalculate still show numbers. The print area of every sheet is set
//! from the computed layout extent.
//!
//! ## Example
//!
//! ```rust,ignore
//! use horario_render::ExcelRenderer;
//!
//! let bytes = ExcelRenderer::new().title("CONTROL HORARIO").render_to_bytes(&report)?;
//! std::fs::write(horario_render::export_file_name(&report.range), bytes)?;
//! ```

use std::path::Path;

use horario_core::{PayrollReport, ReportRenderer};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet};
use tracing::info;

use crate::layout::{build_workbook, CellStyle, CellValue, LayoutOptions, SheetLayout, WorkbookLayout};
use crate::RenderError;

/// Excel payroll renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Title on the first row of the summary sheet
    pub title: String,
    /// Currency symbol for amount columns
    pub currency: String,
    /// Name of the summary sheet
    pub summary_sheet: String,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        let layout = LayoutOptions::default();
        Self {
            title: layout.title,
            currency: "€".into(),
            summary_sheet: layout.summary_sheet,
        }
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set summary title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set summary sheet name
    pub fn summary_sheet(mut self, name: impl Into<String>) -> Self {
        self.summary_sheet = name.into();
        self
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            title: self.title.clone(),
            summary_sheet: self.summary_sheet.clone(),
        }
    }

    /// Lay out the report without serializing it
    pub fn layout(&self, report: &PayrollReport) -> WorkbookLayout {
        build_workbook(report, &self.layout_options())
    }

    /// Generate workbook bytes
    pub fn render_to_bytes(&self, report: &PayrollReport) -> Result<Vec<u8>, RenderError> {
        let mut workbook = self.build(report)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Write the workbook to `path`
    pub fn save(&self, report: &PayrollReport, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        let mut workbook = self.build(report)?;
        workbook.save(path)?;
        info!(path = %path.display(), "workbook written");
        Ok(())
    }

    fn build(&self, report: &PayrollReport) -> Result<Workbook, RenderError> {
        if report.summary_workers().next().is_none() {
            return Err(RenderError::InvalidData("report has no worker rows".into()));
        }
        let layout = self.layout(report);
        let formats = ExcelFormats::new(&self.currency);
        let mut workbook = Workbook::new();

        for sheet in &layout.sheets {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, sheet, &formats)?;
        }
        info!(sheets = layout.sheets.len(), workers = report.workers.len(), "workbook rendered");
        Ok(workbook)
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetLayout, formats: &ExcelFormats) -> Result<(), RenderError> {
    worksheet.set_name(&sheet.name)?;
    for &(col, width) in &sheet.column_widths {
        worksheet.set_column_width(col, width).ok();
    }

    for merge in &sheet.merges {
        let (text, style) = match sheet.cell(merge.first_row, merge.first_col) {
            Some(cell) => (cell.value.as_text().unwrap_or_default(), cell.style),
            None => ("", CellStyle::Text),
        };
        worksheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            text,
            formats.get(style),
        )?;
    }

    for (row, col, cell) in sheet.cells() {
        let top_left_text = sheet.merge_at(row, col).is_some() && matches!(cell.value, CellValue::Text(_));
        if top_left_text {
            continue;
        }
        let format = formats.get(cell.style);
        match &cell.value {
            CellValue::Text(text) => {
                worksheet.write_string_with_format(row, col, text, format)?;
            }
            CellValue::Number(value) => {
                worksheet.write_number_with_format(row, col, *value, format)?;
            }
            CellValue::Formula { formula, cached } => {
                let result = cached.map(|v| v.to_string()).unwrap_or_default();
                let formula = Formula::new(formula).set_result(result);
                worksheet.write_formula_with_format(row, col, formula, format)?;
            }
            CellValue::Blank => {
                worksheet.write_blank(row, col, format)?;
            }
        }
    }

    if let Some((last_row, last_col)) = sheet.extent() {
        worksheet.set_print_area(0, 0, last_row, last_col)?;
    }
    if let Some((row, col)) = sheet.freeze {
        worksheet.set_freeze_panes(row, col).ok();
    }
    Ok(())
}

impl ReportRenderer for ExcelRenderer {
    type Output = Vec<u8>;
    type Error = RenderError;

    fn render(&self, report: &PayrollReport) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(report)
    }
}

/// Formats for every [`CellStyle`]
struct ExcelFormats {
    title: Format,
    subtitle: Format,
    header: Format,
    text: Format,
    worker_name: Format,
    hours: Format,
    rate: Format,
    currency: Format,
    total_label: Format,
    total_hours: Format,
    total_rate: Format,
    total_currency: Format,
    separator: Format,
    // Company block uses its own reddish palette
    company_title: Format,
    company_header: Format,
    company_name: Format,
    company_amount: Format,
    company_total_label: Format,
    company_total_amount: Format,
    centered: Format,
    notes: Format,
}

const HEADER_BLUE: u32 = 0x4472C4;
const TOTAL_BLUE: u32 = 0xDDEBF7;
const SEPARATOR_GREY: u32 = 0xD9D9D9;
const COMPANY_RED: u32 = 0xC0504D;
const COMPANY_ROSE: u32 = 0xE6B8B7;
const COMPANY_PINK: u32 = 0xF2DCDB;

impl ExcelFormats {
    fn new(currency: &str) -> Self {
        let money = format!("#,##0.00 \"{currency}\"");
        let cell = || Format::new().set_border(FormatBorder::Thin);
        let hours = || cell().set_num_format("#,##0.00").set_align(FormatAlign::Center);
        let amount = || cell().set_num_format(&money);
        let total = || cell().set_bold().set_background_color(TOTAL_BLUE);

        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Center),
            subtitle: Format::new().set_italic().set_align(FormatAlign::Center),
            header: cell()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(HEADER_BLUE)
                .set_font_color(0xFFFFFF),
            text: cell().set_align(FormatAlign::Left),
            // Merged down through the TOTAL row, so it carries the total fill
            worker_name: total()
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            hours: hours(),
            rate: amount().set_align(FormatAlign::Center),
            currency: amount(),
            total_label: total().set_align(FormatAlign::Left),
            total_hours: total().set_num_format("#,##0.00").set_align(FormatAlign::Center),
            total_rate: total().set_num_format(&money).set_align(FormatAlign::Center),
            total_currency: total().set_num_format(&money),
            separator: Format::new().set_background_color(SEPARATOR_GREY),
            company_title: cell()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(COMPANY_RED)
                .set_font_color(0xFFFFFF),
            company_header: cell()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(COMPANY_ROSE),
            company_name: cell().set_align(FormatAlign::Left).set_background_color(COMPANY_PINK),
            company_amount: amount().set_background_color(COMPANY_PINK),
            company_total_label: cell().set_bold().set_background_color(COMPANY_ROSE),
            company_total_amount: amount().set_bold().set_background_color(COMPANY_ROSE),
            centered: cell().set_align(FormatAlign::Center),
            notes: cell().set_align(FormatAlign::Left).set_text_wrap(),
        }
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Title => &self.title,
            CellStyle::Subtitle => &self.subtitle,
            CellStyle::Header => &self.header,
            CellStyle::Text => &self.text,
            CellStyle::WorkerName => &self.worker_name,
            CellStyle::Hours => &self.hours,
            CellStyle::Rate => &self.rate,
            CellStyle::Currency => &self.currency,
            CellStyle::TotalLabel => &self.total_label,
            CellStyle::TotalHours => &self.total_hours,
            CellStyle::TotalRate => &self.total_rate,
            CellStyle::TotalCurrency => &self.total_currency,
            CellStyle::Separator => &self.separator,
            CellStyle::CompanyTitle => &self.company_title,
            CellStyle::CompanyHeader => &self.company_header,
            CellStyle::CompanyName => &self.company_name,
            CellStyle::CompanyAmount => &self.company_amount,
            CellStyle::CompanyTotalLabel => &self.company_total_label,
            CellStyle::CompanyTotalAmount => &self.company_total_amount,
            CellStyle::Centered => &self.centered,
            CellStyle::Notes => &self.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use horario_core::{
        aggregate, Assignment, AssignmentTotalsContext, CompanyIdentity, DateRange, DetailLevel,
        ExportOptions,
    };
    use horario_core::aggregate::NoRates;

    fn report(detail: DetailLevel) -> PayrollReport {
        let mut a = Assignment::new("w1", "Ana [día]", CompanyIdentity::resolve(Some("c1"), Some("Acme")));
        a.set_manual("2024-01-01", "4");
        aggregate(
            &[a],
            &AssignmentTotalsContext::default(),
            &DateRange::single(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            &NoRates,
            &ExportOptions { detail, ..Default::default() },
        )
        .unwrap()
    }

    #[test]
    fn renders_valid_xlsx() {
        let xlsx = ExcelRenderer::new().render_to_bytes(&report(DetailLevel::Shifts)).unwrap();
        assert!(xlsx.len() > 100);
        assert_eq!(&xlsx[0..2], b"PK");
    }

    #[test]
    fn builder_setters() {
        let renderer = ExcelRenderer::new().title("HORAS").currency("$").summary_sheet("Totales");
        assert_eq!(renderer.title, "HORAS");
        assert_eq!(renderer.currency, "$");
        let layout = renderer.layout(&report(DetailLevel::Daily));
        let names: Vec<_> = layout.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Totales", "Ana día"]);
    }

    #[test]
    fn worker_name_cell_shares_total_fill() {
        let formats = ExcelFormats::new("€");
        let expected = Format::new()
            .set_border(FormatBorder::Thin)
            .set_bold()
            .set_background_color(TOTAL_BLUE)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter);
        assert_eq!(formats.get(CellStyle::WorkerName), &expected);

        // The name merge covers column A of the TOTAL row
        let layout = ExcelRenderer::new().layout(&report(DetailLevel::Totals));
        let summary = &layout.sheets[0];
        let merge = summary
            .merges
            .iter()
            .find(|m| m.first_col == 0 && m.last_row > m.first_row)
            .unwrap();
        assert_eq!(summary.cell(merge.first_row, 0).map(|c| c.style), Some(CellStyle::WorkerName));
        assert_eq!(summary.cell(merge.last_row, 1).map(|c| c.style), Some(CellStyle::TotalLabel));
    }

    #[test]
    fn empty_report_is_rejected() {
        let mut empty = report(DetailLevel::Totals);
        empty.workers.clear();
        let err = ExcelRenderer::new().render_to_bytes(&empty).unwrap_err();
        assert!(matches!(err, RenderError::InvalidData(_)));
    }

    #[test]
    fn report_renderer_trait_matches_bytes() {
        let renderer = ExcelRenderer::new();
        let via_trait = ReportRenderer::render(&renderer, &report(DetailLevel::Totals)).unwrap();
        assert_eq!(&via_trait[0..2], b"PK");
    }
}
