//! # horario-render
//!
//! Output backends for horario payroll reports.
//!
//! This crate provides:
//! - An abstract workbook layout (cells, formulas, merges, styles, extent)
//! - XLSX serialization of that layout
//! - Sheet name sanitizing and deduplication
//! - A plain-text summary renderer
//!
//! ## Example
//!
//! ```rust,ignore
//! use horario_core::ReportRenderer;
//! use horario_render::{export_file_name, ExcelRenderer, TextRenderer};
//!
//! let report = horario_core::aggregate(&assignments, &context, &range, &rates, &options)?;
//!
//! // Payroll workbook
//! let xlsx = ExcelRenderer::new().currency("€").render(&report)?;
//! std::fs::write(export_file_name(&report.range), xlsx)?;
//!
//! // Console summary
//! println!("{}", TextRenderer::new().render(&report)?);
//! ```

pub mod excel;
pub mod layout;
pub mod sheet_names;
pub mod text;

pub use excel::ExcelRenderer;
pub use layout::{build_workbook, CellStyle, CellValue, LayoutOptions, SheetLayout, WorkbookLayout};
pub use sheet_names::{sanitize_sheet_name, SheetNamer};
pub use text::TextRenderer;

use horario_core::DateRange;
use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Spreadsheet library failure, passed through unchanged
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid report data: {0}")]
    InvalidData(String),
}

/// Download name of the workbook for a date range
pub fn export_file_name(range: &DateRange) -> String {
    format!(
        "control-horario-{}-al-{}.xlsx",
        range.start_key(),
        range.end_key()
    )
}
