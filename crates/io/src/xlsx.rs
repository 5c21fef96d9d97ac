// Excel file import/export
//
// Import goes through calamine (xlsx, xls, xlsb, ods). Export writes a
// generated workbook draft with rust_xlsxwriter.

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::Timelike;
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use cellcheck_engine::workbook::WorkbookDraft;

use crate::error::IoError;
use crate::source::SheetSelector;
use crate::xlsx_validation::constraint_to_xlsx;

/// Excel's column limit.
const MAX_COLS: usize = 16_384;

/// Read one worksheet as text records, anchored at A1.
///
/// Leading empty rows and columns are kept as empty cells so that row offsets
/// count from the top of the sheet.
pub fn read_records(path: &Path, sheet: &SheetSelector) -> Result<Vec<Vec<String>>, IoError> {
    let range = read_range(path, sheet)?;
    Ok(range_to_records(&range))
}

/// Open a workbook and read the selected worksheet.
pub fn read_range(path: &Path, sheet: &SheetSelector) -> Result<Range<Data>, IoError> {
    if !path.exists() {
        return Err(IoError::file(path, "no such file"));
    }
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Spreadsheet(format!("Failed to open '{}': {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        SheetSelector::Index(i) => sheet_names.get(*i).cloned(),
        SheetSelector::Name(name) => sheet_names.iter().find(|n| *n == name).cloned(),
    }
    .ok_or_else(|| IoError::SheetNotFound(sheet.to_string()))?;

    workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::Spreadsheet(format!("Failed to read sheet '{}': {}", name, e)))
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Spreadsheet(format!("Failed to open '{}': {}", path.display(), e)))?;
    Ok(workbook.sheet_names().to_vec())
}

fn range_to_records(range: &Range<Data>) -> Vec<Vec<String>> {
    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut records: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut record = vec![String::new(); start_col as usize];
        record.extend(
            row.iter()
                .take(MAX_COLS.saturating_sub(start_col as usize))
                .map(cell_to_string),
        );
        while record.last().is_some_and(|v| v.is_empty()) {
            record.pop();
        }
        records.push(record);
    }
    records
}

/// Render a cell the way a user typed it.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                value.date().format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{}", dt.as_f64()),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Summary of a workbook export.
#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub validations_exported: usize,
    pub names_defined: usize,
    pub export_duration_ms: u128,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        format!(
            "{} sheet(s), {} cell(s), {} constraint(s), {} named range(s) in {}ms",
            self.sheets_exported,
            self.cells_exported,
            self.validations_exported,
            self.names_defined,
            self.export_duration_ms
        )
    }
}

/// Write a workbook draft to `path`. Nothing is written if any part fails.
pub fn export(draft: &WorkbookDraft, path: &Path) -> Result<ExportResult, IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in draft.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| IoError::Write(format!("Failed to create sheet '{}': {}", sheet.name, e)))?;

        for (row, col, value) in sheet.cells() {
            worksheet.write_string(row, col as u16, value)?;
            result.cells_exported += 1;
        }

        for (&col, &width) in sheet.column_widths() {
            worksheet.set_column_width(col as u16, width)?;
        }

        for validation in sheet.validations() {
            let dv = constraint_to_xlsx(&validation.constraint)?;
            // rust_xlsxwriter uses 0-based row/col as u32/u16
            worksheet
                .add_data_validation(
                    validation.first_row,
                    validation.col as u16,
                    validation.last_row,
                    validation.col as u16,
                    &dv,
                )
                .map_err(|e| IoError::Write(format!("Failed to add validation: {}", e)))?;
            result.validations_exported += 1;
        }

        result.sheets_exported += 1;
    }

    for defined in draft.defined_names() {
        xlsx_workbook
            .define_name(&defined.name, &format!("={}", defined.range))
            .map_err(|e| IoError::Write(format!("Failed to define name '{}': {}", defined.name, e)))?;
        result.names_defined += 1;
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| IoError::Write(format!("Failed to save '{}': {}", path.display(), e)))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok(result)
}
