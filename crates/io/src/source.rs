//! Source selection and loading into a [`Table`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cellcheck_engine::Table;

use crate::error::IoError;

/// Which worksheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// 0-based position in the workbook.
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

/// All-digit selectors are positions, anything else is a sheet name.
impl FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(index) => SheetSelector::Index(index),
            Err(_) => SheetSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "#{i}"),
            SheetSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// xlsx, xls, xlsb or ods workbook.
    Spreadsheet { sheet: SheetSelector },
    /// Delimited text. `None` sniffs the delimiter.
    Tabular { delimiter: Option<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceSpec {
    pub fn spreadsheet(path: impl Into<PathBuf>, sheet: SheetSelector) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::Spreadsheet { sheet },
        }
    }

    pub fn tabular(path: impl Into<PathBuf>, delimiter: Option<u8>) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::Tabular { delimiter },
        }
    }

    /// Pick the kind from the file extension: `.csv`, `.tsv` and `.txt` are
    /// tabular, everything else is read as a workbook's first sheet.
    pub fn infer(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ext = extension(&path);
        match ext.as_str() {
            "csv" => Self::tabular(path, Some(b',')),
            "tsv" | "tab" => Self::tabular(path, Some(b'\t')),
            "txt" => Self::tabular(path, None),
            _ => Self::spreadsheet(path, SheetSelector::default()),
        }
    }

    /// Label used in log lines.
    pub fn label(&self) -> String {
        self.path.display().to_string()
    }
}

/// Load a source, using the record at `header_row` as column names.
pub fn load_table(source: &SourceSpec, header_row: usize) -> Result<Table, IoError> {
    let records = match &source.kind {
        SourceKind::Spreadsheet { sheet } => crate::xlsx::read_records(&source.path, sheet)?,
        SourceKind::Tabular { delimiter } => crate::csv::read_records(&source.path, *delimiter)?,
    };
    Ok(Table::from_records(records, header_row))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_selector_from_str() {
        assert_eq!("0".parse::<SheetSelector>().unwrap(), SheetSelector::Index(0));
        assert_eq!("2".parse::<SheetSelector>().unwrap(), SheetSelector::Index(2));
        assert_eq!(
            "Data".parse::<SheetSelector>().unwrap(),
            SheetSelector::Name("Data".into())
        );
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(
            SourceSpec::infer("a.CSV").kind,
            SourceKind::Tabular { delimiter: Some(b',') }
        );
        assert_eq!(
            SourceSpec::infer("a.tsv").kind,
            SourceKind::Tabular { delimiter: Some(b'\t') }
        );
        assert_eq!(
            SourceSpec::infer("a.xlsx").kind,
            SourceKind::Spreadsheet { sheet: SheetSelector::Index(0) }
        );
    }

    #[test]
    fn test_load_tabular_with_header_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "exported 2024-01-01\nstatus,notes\nopen,\nclosed,x\n").unwrap();

        let table = load_table(&SourceSpec::infer(&path), 1).unwrap();
        assert_eq!(table.headers(), &["status".to_string(), "notes".to_string()]);
        assert_eq!(table.row_count(), 2);
    }
}
