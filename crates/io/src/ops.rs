//! File-level entry points: validate a source, generate a workbook, extract
//! a template.

use std::path::Path;

use cellcheck_engine::{
    GenerationEngine, Reporter, Template, ValidationEngine, ValidationOptions, ValidationOutcome,
};

use crate::error::IoError;
use crate::extract::extract_template;
use crate::source::{load_table, SourceSpec};
use crate::xlsx::{export, ExportResult};

/// Load `source` and check it against `template`.
///
/// Per-cell failures and schema mismatches land in the outcome; only
/// unreadable input and fatal rule errors return `Err`.
pub fn validate(
    template: &Template,
    source: &SourceSpec,
    options: &ValidationOptions,
    reporter: &dyn Reporter,
) -> Result<ValidationOutcome, IoError> {
    reporter.debug(&format!(
        "Loading {} (header row {})",
        source.label(),
        options.header_row
    ));
    let table = load_table(source, options.header_row)?;
    let outcome =
        ValidationEngine::new(template, options.clone()).run(&table, &source.label(), reporter)?;
    Ok(outcome)
}

/// Render `template` as a data-entry workbook at `output`.
pub fn generate(
    template: &Template,
    output: &Path,
    reporter: &dyn Reporter,
) -> Result<ExportResult, IoError> {
    let draft = GenerationEngine::new(template).build(reporter)?;
    let result = export(&draft, output)?;
    reporter.info(&format!("Wrote {}: {}", output.display(), result.summary()));
    Ok(result)
}

/// Rebuild a template from `source` and write it to `output` as TOML.
pub fn extract(
    source: &Path,
    sheet: Option<&str>,
    output: &Path,
    reporter: &dyn Reporter,
) -> Result<Template, IoError> {
    let template = extract_template(source, sheet, reporter)?;
    let toml = template.to_toml()?;
    std::fs::write(output, toml).map_err(|e| IoError::file(output, e))?;
    reporter.info(&format!(
        "Extracted {} column(s) from {} into {}",
        template.len(),
        source.display(),
        output.display()
    ));
    Ok(template)
}
