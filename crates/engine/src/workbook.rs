//! In-memory model of a generated workbook
//!
//! The generation engine fills a [`WorkbookDraft`]; the io crate writes it out
//! as xlsx in one pass. Cells are plain strings keyed by 0-based
//! `(row, col)`.

use std::collections::BTreeMap;

use crate::constraint::Constraint;

/// Width factor and padding applied when auto-sizing columns.
pub const WIDTH_FACTOR: f64 = 1.2;
pub const WIDTH_PADDING: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookDraft {
    sheets: Vec<SheetDraft>,
    defined_names: Vec<DefinedName>,
}

impl WorkbookDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet and return its index. Sheet order is creation order.
    pub fn add_sheet(&mut self, name: &str) -> usize {
        self.sheets.push(SheetDraft::new(name));
        self.sheets.len() - 1
    }

    pub fn sheets(&self) -> &[SheetDraft] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&SheetDraft> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut SheetDraft> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&SheetDraft> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Register a workbook-level name for a range like `Sets!$A$2:$A$4`.
    pub fn define_name(&mut self, name: impl Into<String>, range: impl Into<String>) {
        self.defined_names.push(DefinedName {
            name: name.into(),
            range: range.into(),
        });
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn defined_name(&self, name: &str) -> Option<&DefinedName> {
        self.defined_names.iter().find(|d| d.name == name)
    }

    /// Size every populated column of every sheet to fit its longest value.
    pub fn autosize(&mut self) {
        for sheet in &mut self.sheets {
            sheet.autosize();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetDraft {
    pub name: String,
    cells: BTreeMap<(u32, usize), String>,
    validations: Vec<ColumnValidation>,
    column_widths: BTreeMap<usize, f64>,
}

impl SheetDraft {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
            validations: Vec::new(),
            column_widths: BTreeMap::new(),
        }
    }

    pub fn write(&mut self, row: u32, col: usize, value: impl Into<String>) {
        self.cells.insert((row, col), value.into());
    }

    pub fn get(&self, row: u32, col: usize) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    /// Populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, usize, &str)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v.as_str()))
    }

    /// Values of one column from `first_row` down, in row order.
    pub fn column_values(&self, col: usize, first_row: u32) -> Vec<&str> {
        self.cells
            .iter()
            .filter(|((r, c), _)| *c == col && *r >= first_row)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Number of columns that hold at least one cell.
    pub fn used_columns(&self) -> usize {
        self.cells.keys().map(|&(_, c)| c + 1).max().unwrap_or(0)
    }

    pub fn add_validation(&mut self, validation: ColumnValidation) {
        self.validations.push(validation);
    }

    pub fn validations(&self) -> &[ColumnValidation] {
        &self.validations
    }

    pub fn validation_for(&self, col: usize) -> Option<&ColumnValidation> {
        self.validations.iter().find(|v| v.col == col)
    }

    pub fn column_widths(&self) -> &BTreeMap<usize, f64> {
        &self.column_widths
    }

    fn autosize(&mut self) {
        let mut longest: BTreeMap<usize, usize> = BTreeMap::new();
        for (&(_, col), value) in &self.cells {
            let len = value.chars().count();
            let entry = longest.entry(col).or_insert(0);
            *entry = (*entry).max(len);
        }
        self.column_widths = longest
            .into_iter()
            .map(|(col, len)| (col, (len + WIDTH_PADDING) as f64 * WIDTH_FACTOR))
            .collect();
    }
}

/// A constraint attached to rows `first_row..=last_row` of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValidation {
    pub col: usize,
    pub first_row: u32,
    pub last_row: u32,
    pub constraint: Constraint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Absolute range without a leading `=`.
    pub range: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autosize_uses_longest_value() {
        let mut wb = WorkbookDraft::new();
        let idx = wb.add_sheet("Data");
        let sheet = wb.sheet_mut(idx).unwrap();
        sheet.write(0, 0, "id");
        sheet.write(1, 0, "sample-0001");
        sheet.write(0, 2, "é");
        wb.autosize();

        let widths = wb.sheet(idx).unwrap().column_widths();
        assert_eq!(widths.len(), 2);
        assert!((widths[&0] - 13.0 * 1.2).abs() < 1e-9);
        assert!((widths[&2] - 3.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_column_values_in_row_order() {
        let mut sheet = SheetDraft::new("Sets");
        sheet.write(3, 1, "c");
        sheet.write(0, 1, "header");
        sheet.write(1, 1, "a");
        sheet.write(2, 0, "other");
        assert_eq!(sheet.column_values(1, 1), vec!["a", "c"]);
        assert_eq!(sheet.used_columns(), 2);
    }

    #[test]
    fn test_defined_names() {
        let mut wb = WorkbookDraft::new();
        wb.define_name("city_France", "Sets!$A$2:$A$3");
        assert_eq!(wb.defined_name("city_France").unwrap().range, "Sets!$A$2:$A$3");
        assert!(wb.defined_name("city_Spain").is_none());
    }
}
