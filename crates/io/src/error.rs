use std::path::PathBuf;

use thiserror::Error;

use cellcheck_engine::{GenerateError, RuleError, TemplateError};

/// Errors raised while reading sources, writing workbooks or extracting templates.
#[derive(Debug, Error)]
pub enum IoError {
    /// The source or output file could not be opened, read or created.
    #[error("cannot access '{}': {message}", path.display())]
    File { path: PathBuf, message: String },
    #[error("sheet {0} not found")]
    SheetNotFound(String),
    /// calamine failed to open or read the workbook.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("csv error: {0}")]
    Csv(String),
    /// rust_xlsxwriter failed to build or save the workbook.
    #[error("xlsx write error: {0}")]
    Write(String),
    /// Worksheet or workbook XML could not be parsed.
    #[error("xlsx read error: {0}")]
    Xml(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        IoError::File {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for IoError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        IoError::Write(err.to_string())
    }
}
