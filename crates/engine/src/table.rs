//! In-memory source table
//!
//! Loaders (CSV, spreadsheet) produce raw records; [`Table::from_records`]
//! picks the header row and keeps every data row below it as text.

use std::collections::HashMap;

/// A loaded source: header names plus data rows, all as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = dedupe_headers(headers);
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        Self {
            headers,
            rows,
            index,
        }
    }

    /// Build a table from raw records, skipping `header_row` leading records.
    ///
    /// The record at `header_row` holds the column names. Data rows whose
    /// cells are all empty are dropped.
    pub fn from_records(records: Vec<Vec<String>>, header_row: usize) -> Self {
        let mut records = records.into_iter().skip(header_row);
        let Some(headers) = records.next() else {
            return Self::default();
        };
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let rows = records
            .filter(|r| r.iter().any(|v| !v.trim().is_empty()))
            .collect();
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns with a real header, as `(position, name)`.
    pub fn meaningful_columns(&self) -> Vec<(usize, &str)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_placeholder_header(h))
            .map(|(i, h)| (i, h.as_str()))
            .collect()
    }

    /// Row context for the data row at `row` (0-based).
    pub fn row_context(&self, row: usize) -> RowContext<'_> {
        RowContext {
            index: &self.index,
            values: self.rows.get(row).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

/// Read access to the other cells of the row being validated.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    index: &'a HashMap<String, usize>,
    values: &'a [String],
}

impl<'a> RowContext<'a> {
    /// Value of `column` in this row. Short rows read as empty cells.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let i = *self.index.get(column)?;
        Some(self.values.get(i).map(String::as_str).unwrap_or(""))
    }

    /// Value at a column position.
    pub fn at(&self, position: usize) -> &'a str {
        self.values.get(position).map(String::as_str).unwrap_or("")
    }
}

/// Blank headers and auto-generated `Unnamed: N` placeholders carry no column.
pub fn is_placeholder_header(header: &str) -> bool {
    let header = header.trim();
    header.is_empty() || header.starts_with("Unnamed")
}

/// Repeated header names get a `.1`, `.2`, ... suffix so each maps to one column.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                return format!("Unnamed: {i}");
            }
            let count = seen.entry(h.clone()).or_insert(0);
            let name = if *count == 0 { h.clone() } else { format!("{h}.{count}") };
            *count += 1;
            name
        })
        .collect()
}
