use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while a rule checks a cell.
///
/// Invalid cell values are never reported here; they become failures in the
/// report. These errors mean the template cannot describe the data at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The row has no value for the parent column of a linked set.
    #[error("column '{column}': parent column '{parent}' is not present in the row")]
    MissingParentColumn { column: String, parent: String },
    /// The parent value has no allowed-subset registered in the linked set.
    #[error("column '{column}': no allowed values registered for {parent} = '{value}'")]
    UnknownParentValue {
        column: String,
        parent: String,
        value: String,
    },
}

/// Errors raised while building or loading a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// TOML parse / deserialization error.
    #[error("template parse error: {0}")]
    Parse(String),
    /// Template could not be serialized back to TOML.
    #[error("template serialize error: {0}")]
    Serialize(String),
    #[error("template has no columns")]
    Empty,
    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),
    #[error("column '{column}': set rule has no allowed values")]
    EmptyValues { column: String },
    /// A linked set names a parent column the template does not have.
    #[error("column '{column}': parent column '{parent}' is not in the template")]
    UnknownParent { column: String, parent: String },
    /// A linked set must come after its parent so the parent's sheet column is known.
    #[error("column '{column}': parent column '{parent}' must be declared before it")]
    ParentAfterChild { column: String, parent: String },
    #[error("column '{column}': unique_with references unknown column '{other}'")]
    UnknownUniqueColumn { column: String, other: String },
    #[error("column '{column}': invalid pattern: {message}")]
    InvalidPattern { column: String, message: String },
    #[error("column '{column}': {message}")]
    InvalidBounds { column: String, message: String },
    #[error("cannot read '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Errors raised while laying out the generated workbook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// A linked set was rendered before its parent had a Data column.
    #[error("column '{column}': parent column '{parent}' has not been placed")]
    UnplacedParent { column: String, parent: String },
    /// A value list name is not usable as a workbook defined name.
    #[error("column '{column}': cannot define range name '{name}': {reason}")]
    InvalidRangeName {
        column: String,
        name: String,
        reason: String,
    },
}
