// File I/O operations
//
// Sources (csv, spreadsheets) load into the engine's `Table`; generated
// workbook drafts are written as xlsx; xlsx data validations read back into
// templates.

pub mod csv;
pub mod error;
pub mod extract;
pub mod ops;
pub mod source;
pub mod xlsx;
pub mod xlsx_validation;

pub use error::IoError;
pub use ops::{extract, generate, validate};
pub use source::{load_table, SheetSelector, SourceKind, SourceSpec};
pub use xlsx::ExportResult;
