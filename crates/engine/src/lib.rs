//! `cellcheck-engine`: rules, templates and the two engines that consume them.
//!
//! Pure engine crate: validation works on an already loaded [`Table`],
//! generation produces an in-memory [`WorkbookDraft`]. File formats live in
//! `cellcheck-io`.

pub mod cell_ref;
pub mod constraint;
pub mod error;
pub mod generate;
pub mod report;
pub mod reporter;
pub mod rule;
pub mod table;
pub mod template;
pub mod validate;
pub mod workbook;

pub use error::{GenerateError, RuleError, TemplateError};
pub use generate::GenerationEngine;
pub use report::{ColumnSummary, Failure, FailureReport};
pub use reporter::{CaptureReporter, Reporter, TracingReporter};
pub use rule::{Rule, RuleKind};
pub use table::Table;
pub use template::Template;
pub use validate::{Abort, ValidationEngine, ValidationOptions, ValidationOutcome};
pub use workbook::WorkbookDraft;
