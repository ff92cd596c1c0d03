//! Abstract workbook layout
//!
//! The layout is a plain grid of cells, merges and style tags, built from a
//! [`PayrollReport`] without touching any spreadsheet library. The XLSX
//! writer in [`crate::excel`] only has to replay it, which keeps every
//! address and formula testable as data.
//!
//! ## Summary sheet
//!
//! ```text
//!   |   A        |  B        |  C    |  D         |  E      | F |  G         |  H
//! 1 | title (merged A:E)                                   |   |            |
//! 2 | date range (merged A:E)                              |   |            |
//! 3 |                                                      |   |            |
//! 4 | EMPLOYEE   | LOCATION  | HOURS | RATE/HOUR  | AMOUNT  |   | company title (G:H)
//! 5 | Ana        | Acme      | 10    | 12.5       | =IF(..) |   | EMPRESAS   | IMPORTES
//! 6 | (merged)   | Beta      | 4     |            | =IF(..) |   | Acme       | =SUMIFS(..)
//! 7 | (merged)   | TOTAL     | =SUM  | =IF(SUMIFS)| =IF(..) |   | Beta       | =SUMIFS(..)
//! 8 | separator (grey)                                     |   | TOTAL      | =SUM(..)
//! ```
//!
//! Rows and columns are zero-based here; formulas use one-based A1 addresses.

use std::collections::BTreeMap;

use horario_core::{DetailLevel, PayrollReport, WorkerBucket};
use tracing::debug;

use crate::sheet_names::SheetNamer;

pub const SUMMARY_HEADERS: [&str; 5] = ["EMPLOYEE", "LOCATION", "HOURS", "RATE/HOUR", "AMOUNT"];
pub const DETAIL_HEADERS: [&str; 8] = [
    "DAY", "DATE", "COMPANY", "ENTRY", "EXIT", "HOURS", "AMOUNT", "NOTES",
];
pub const COMPANY_HEADERS: [&str; 2] = ["EMPRESAS", "IMPORTES"];
pub const COMPANY_BLOCK_TITLE: &str = "IMPORTES POR EMPRESA";
pub const TOTAL_LABEL: &str = "TOTAL";

/// Zero-based row of the summary column header (row 4 in A1 terms)
pub const HEADER_ROW: u32 = 3;
/// First data row of the summary table (row 5)
pub const FIRST_DATA_ROW: u32 = 4;

const COL_WORKER: u16 = 0;
const COL_COMPANY: u16 = 1;
const COL_HOURS: u16 = 2;
const COL_RATE: u16 = 3;
const COL_AMOUNT: u16 = 4;
const COL_SIDE_NAME: u16 = 6;
const COL_SIDE_AMOUNT: u16 = 7;

/// Visual role of a cell; mapped to a concrete format by the writer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellStyle {
    Title,
    Subtitle,
    Header,
    Text,
    WorkerName,
    Hours,
    Rate,
    Currency,
    TotalLabel,
    TotalHours,
    TotalRate,
    TotalCurrency,
    Separator,
    CompanyTitle,
    CompanyHeader,
    CompanyName,
    CompanyAmount,
    CompanyTotalLabel,
    CompanyTotalAmount,
    Centered,
    Notes,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Formula text plus the value it evaluates to, for viewers that do not
    /// recalculate. `None` caches an empty string.
    Formula { formula: String, cached: Option<f64> },
    Blank,
}

impl CellValue {
    pub fn text(text: impl Into<String>) -> Self {
        CellValue::Text(text.into())
    }

    pub fn formula(formula: impl Into<String>, cached: Option<f64>) -> Self {
        CellValue::Formula {
            formula: formula.into(),
            cached,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellValue::Formula { formula, .. } => Some(formula),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// Inclusive rectangular merge; content comes from the top-left cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Merge {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl Merge {
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    pub merges: Vec<Merge>,
    pub column_widths: Vec<(u16, f64)>,
    /// Rows/columns frozen above and left of this cell
    pub freeze: Option<(u32, u16)>,
}

impl SheetLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
            column_widths: Vec::new(),
            freeze: None,
        }
    }

    pub fn set(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn merge(&mut self, first_row: u32, first_col: u16, last_row: u32, last_col: u16) {
        self.merges.push(Merge {
            first_row,
            first_col,
            last_row,
            last_col,
        });
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Cell by A1 address, e.g. `"C5"`
    pub fn at(&self, address: &str) -> Option<&Cell> {
        let (row, col) = parse_a1(address)?;
        self.cell(row, col)
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (row, col, cell))
    }

    /// Merge whose top-left corner is this cell
    pub fn merge_at(&self, row: u32, col: u16) -> Option<&Merge> {
        self.merges
            .iter()
            .find(|m| m.first_row == row && m.first_col == col)
    }

    /// Last populated (row, col), merges included
    pub fn extent(&self) -> Option<(u32, u16)> {
        let cells = self.cells.keys().copied();
        let merges = self.merges.iter().map(|m| (m.last_row, m.last_col));
        cells.chain(merges).fold(None, |acc, (row, col)| match acc {
            None => Some((row, col)),
            Some((r, c)) => Some((r.max(row), c.max(col))),
        })
    }

    /// `A1:<last>` covering [`Self::extent`]
    pub fn used_range(&self) -> Option<String> {
        self.extent()
            .map(|(row, col)| format!("A1:{}", cell_ref(row, col)))
    }
}

/// The whole workbook, sheets in output order
#[derive(Clone, Debug, PartialEq)]
pub struct WorkbookLayout {
    pub sheets: Vec<SheetLayout>,
}

impl WorkbookLayout {
    pub fn sheet(&self, name: &str) -> Option<&SheetLayout> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Text options for the layout
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOptions {
    pub title: String,
    pub summary_sheet: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            title: "CONTROL HORARIO".into(),
            summary_sheet: "Resumen".into(),
        }
    }
}

// ============================================================================
// Addressing
// ============================================================================

/// Zero-based column index to letters (0 → A, 26 → AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    loop {
        result.insert(0, char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Zero-based (row, col) to an A1 reference
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

fn col_range(col: u16, first_row: u32, last_row: u32) -> String {
    format!("{}:{}", cell_ref(first_row, col), cell_ref(last_row, col))
}

fn abs_col_range(col: u16, first_row: u32, last_row: u32) -> String {
    let letter = col_to_letter(col);
    format!("${letter}${}:${letter}${}", first_row + 1, last_row + 1)
}

fn parse_a1(address: &str) -> Option<(u32, u16)> {
    let split = address.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = address.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (c as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, u16::try_from(col - 1).ok()?))
}

/// Quote a literal for a formula string argument; `*`, `?` and `~` are
/// escaped so SUMIFS matches them literally
pub fn criteria_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '*' | '?' | '~' => {
                escaped.push('~');
                escaped.push(c);
            }
            '"' => escaped.push_str("\"\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Builders
// ============================================================================

/// Lay out the summary sheet plus one sheet per worker with details
pub fn build_workbook(report: &PayrollReport, options: &LayoutOptions) -> WorkbookLayout {
    let mut namer = SheetNamer::new();
    namer.reserve(&options.summary_sheet);

    let mut sheets = vec![summary_sheet(report, options)];
    if report.detail != DetailLevel::Totals {
        for worker in report.detail_workers() {
            let name = namer.unique(&worker.worker_name);
            sheets.push(worker_sheet(worker, report, &name));
        }
    }
    debug!(sheets = sheets.len(), "workbook layout built");
    WorkbookLayout { sheets }
}

pub fn range_subtitle(report: &PayrollReport) -> String {
    format!(
        "Del {} al {}",
        report.range.start.format("%d/%m/%Y"),
        report.range.end.format("%d/%m/%Y")
    )
}

pub fn summary_sheet(report: &PayrollReport, options: &LayoutOptions) -> SheetLayout {
    let mut sheet = SheetLayout::new(options.summary_sheet.clone());

    sheet.set(0, 0, CellValue::text(&options.title), CellStyle::Title);
    sheet.merge(0, 0, 0, COL_AMOUNT);
    sheet.set(1, 0, CellValue::text(range_subtitle(report)), CellStyle::Subtitle);
    sheet.merge(1, 0, 1, COL_AMOUNT);
    for (col, header) in (0u16..).zip(SUMMARY_HEADERS) {
        sheet.set(HEADER_ROW, col, CellValue::text(header), CellStyle::Header);
    }

    let workers: Vec<&WorkerBucket> = report.summary_workers().collect();
    let mut row = FIRST_DATA_ROW;
    for (index, worker) in workers.iter().enumerate() {
        let total_row = worker_block(&mut sheet, worker, row);
        row = total_row + 1;
        if index + 1 < workers.len() {
            for col in COL_WORKER..=COL_AMOUNT {
                sheet.set(row, col, CellValue::Blank, CellStyle::Separator);
            }
            row += 1;
        }
    }
    let last_data_row = row.saturating_sub(1).max(FIRST_DATA_ROW);

    company_block(&mut sheet, report, last_data_row);

    sheet.column_widths = vec![
        (COL_WORKER, 28.0),
        (COL_COMPANY, 30.0),
        (COL_HOURS, 10.0),
        (COL_RATE, 12.0),
        (COL_AMOUNT, 14.0),
        (5, 3.0),
        (COL_SIDE_NAME, 30.0),
        (COL_SIDE_AMOUNT, 14.0),
    ];
    sheet.freeze = Some((FIRST_DATA_ROW, 0));
    sheet
}

/// One worker's rows plus its TOTAL row; returns the TOTAL row index
fn worker_block(sheet: &mut SheetLayout, worker: &WorkerBucket, first: u32) -> u32 {
    let mut row = first;
    for (n, export) in worker.rows.iter().enumerate() {
        if n == 0 {
            sheet.set(row, COL_WORKER, CellValue::text(&worker.worker_name), CellStyle::WorkerName);
        }
        sheet.set(row, COL_COMPANY, CellValue::text(&export.company.name), CellStyle::Text);
        sheet.set(row, COL_HOURS, CellValue::Number(export.hours), CellStyle::Hours);
        let rate = export.rate.map_or(CellValue::Blank, CellValue::Number);
        sheet.set(row, COL_RATE, rate, CellStyle::Rate);

        let (hours, rate) = (cell_ref(row, COL_HOURS), cell_ref(row, COL_RATE));
        let amount = format!("=IF(OR({hours}=\"\",{rate}=\"\"),\"\",{hours}*{rate})");
        sheet.set(row, COL_AMOUNT, CellValue::formula(amount, export.amount), CellStyle::Currency);
        row += 1;
    }

    let last = row - 1;
    let total = row;
    sheet.merge(first, COL_WORKER, total, COL_WORKER);
    sheet.set(total, COL_COMPANY, CellValue::text(TOTAL_LABEL), CellStyle::TotalLabel);

    let hours = col_range(COL_HOURS, first, last);
    let rates = col_range(COL_RATE, first, last);
    let amounts = col_range(COL_AMOUNT, first, last);
    let rated_hours = format!("SUMIFS({hours},{rates},\"<>\")");
    let rated_amount = format!("SUMIFS({amounts},{rates},\"<>\")");

    sheet.set(
        total,
        COL_HOURS,
        CellValue::formula(format!("=SUM({hours})"), Some(worker.total_hours)),
        CellStyle::TotalHours,
    );
    sheet.set(
        total,
        COL_RATE,
        CellValue::formula(
            format!("=IF({rated_hours}=0,\"\",{rated_amount}/{rated_hours})"),
            worker.average_rate(),
        ),
        CellStyle::TotalRate,
    );
    sheet.set(
        total,
        COL_AMOUNT,
        CellValue::formula(
            format!("=IF({rated_amount}=0,\"\",{rated_amount})"),
            worker.amount().filter(|a| *a != 0.0),
        ),
        CellStyle::TotalCurrency,
    );
    total
}

/// Per-company amounts in G:H, pulled live from the main table
fn company_block(sheet: &mut SheetLayout, report: &PayrollReport, last_data_row: u32) {
    let title_row = HEADER_ROW;
    sheet.set(title_row, COL_SIDE_NAME, CellValue::text(COMPANY_BLOCK_TITLE), CellStyle::CompanyTitle);
    sheet.merge(title_row, COL_SIDE_NAME, title_row, COL_SIDE_AMOUNT);
    sheet.set(title_row + 1, COL_SIDE_NAME, CellValue::text(COMPANY_HEADERS[0]), CellStyle::CompanyHeader);
    sheet.set(title_row + 1, COL_SIDE_AMOUNT, CellValue::text(COMPANY_HEADERS[1]), CellStyle::CompanyHeader);

    let amounts = abs_col_range(COL_AMOUNT, FIRST_DATA_ROW, last_data_row);
    let names = abs_col_range(COL_COMPANY, FIRST_DATA_ROW, last_data_row);
    let rates = abs_col_range(COL_RATE, FIRST_DATA_ROW, last_data_row);

    let first = title_row + 2;
    let mut row = first;
    for company in &report.companies {
        let formula = format!(
            "=SUMIFS({amounts},{names},\"={}\",{rates},\"<>\")",
            criteria_literal(&company.name)
        );
        sheet.set(row, COL_SIDE_NAME, CellValue::text(&company.name), CellStyle::CompanyName);
        sheet.set(
            row,
            COL_SIDE_AMOUNT,
            CellValue::formula(formula, Some(company.total_amount)),
            CellStyle::CompanyAmount,
        );
        row += 1;
    }

    sheet.set(row, COL_SIDE_NAME, CellValue::text(TOTAL_LABEL), CellStyle::CompanyTotalLabel);
    let total = if report.companies.is_empty() {
        CellValue::Number(0.0)
    } else {
        let cached = report.companies.iter().map(|c| c.total_amount).sum();
        CellValue::formula(format!("=SUM({})", col_range(COL_SIDE_AMOUNT, first, row - 1)), Some(cached))
    };
    sheet.set(row, COL_SIDE_AMOUNT, total, CellStyle::CompanyTotalAmount);
}

/// Detail sheet of one worker: literal values and literal totals
pub fn worker_sheet(worker: &WorkerBucket, report: &PayrollReport, name: &str) -> SheetLayout {
    let mut sheet = SheetLayout::new(name);
    let last_col = (DETAIL_HEADERS.len() - 1) as u16;

    sheet.set(0, 0, CellValue::text(&worker.worker_name), CellStyle::Title);
    sheet.merge(0, 0, 0, last_col);
    sheet.set(1, 0, CellValue::text(range_subtitle(report)), CellStyle::Subtitle);
    sheet.merge(1, 0, 1, last_col);
    for (col, header) in (0u16..).zip(DETAIL_HEADERS) {
        sheet.set(HEADER_ROW, col, CellValue::text(header), CellStyle::Header);
    }

    let optional = |text: &Option<String>| text.as_ref().map_or(CellValue::Blank, CellValue::text);
    let mut row = FIRST_DATA_ROW;
    for detail in &worker.details {
        sheet.set(row, 0, CellValue::text(&detail.day_label), CellStyle::Text);
        sheet.set(row, 1, CellValue::text(detail.date.format("%d/%m/%Y").to_string()), CellStyle::Centered);
        sheet.set(row, 2, CellValue::text(&detail.company), CellStyle::Text);
        sheet.set(row, 3, optional(&detail.entry), CellStyle::Centered);
        sheet.set(row, 4, optional(&detail.exit), CellStyle::Centered);
        sheet.set(row, 5, detail.hours.map_or(CellValue::Blank, CellValue::Number), CellStyle::Hours);
        sheet.set(row, 6, detail.amount.map_or(CellValue::Blank, CellValue::Number), CellStyle::Currency);
        sheet.set(row, 7, optional(&detail.notes), CellStyle::Notes);
        row += 1;
    }

    if !worker.details.is_empty() {
        let hours: f64 = worker.details.iter().filter_map(|d| d.hours).sum();
        let amounts: Vec<f64> = worker.details.iter().filter_map(|d| d.amount).collect();
        sheet.set(row, 0, CellValue::text(TOTAL_LABEL), CellStyle::TotalLabel);
        for col in 1..=4 {
            sheet.set(row, col, CellValue::Blank, CellStyle::TotalLabel);
        }
        sheet.set(row, 5, CellValue::Number(hours), CellStyle::TotalHours);
        let amount = if amounts.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Number(amounts.iter().sum())
        };
        sheet.set(row, 6, amount, CellStyle::TotalCurrency);
        sheet.set(row, 7, CellValue::Blank, CellStyle::TotalLabel);
    }

    sheet.column_widths = vec![
        (0, 12.0),
        (1, 12.0),
        (2, 28.0),
        (3, 9.0),
        (4, 9.0),
        (5, 9.0),
        (6, 12.0),
        (7, 50.0),
    ];
    sheet.freeze = Some((FIRST_DATA_ROW, 0));
    sheet
}
