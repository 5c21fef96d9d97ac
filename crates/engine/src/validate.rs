//! Validation engine
//!
//! A run has two passes. The schema pass compares source headers against the
//! template and may abort before any cell is read. The row pass applies each
//! column's rule to every data row and collects failures.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::error::RuleError;
use crate::report::{ColumnSummary, ColumnTracker, Failure, FailureReport};
use crate::reporter::Reporter;
use crate::table::Table;
use crate::template::Template;

/// Run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Number of leading rows skipped before the header row. Reported row
    /// numbers start at `header_row + 1`.
    pub header_row: usize,
    /// Skip source columns that have no rule instead of aborting.
    pub ignore_missing_validators: bool,
}

/// Why a run stopped before the row pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Abort {
    /// The source has no data rows.
    NoData,
    /// Template columns are absent from the source.
    MissingFields,
    /// Source columns have no rule and the ignore option is off.
    MissingValidators,
}

/// Result of one validation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationOutcome {
    pub abort: Option<Abort>,
    pub report: FailureReport,
    /// Source columns without a rule, sorted.
    pub missing_validators: BTreeSet<String>,
    /// Template columns absent from the source, sorted.
    pub missing_fields: BTreeSet<String>,
    /// Per-column statistics for failing columns, in template order.
    pub summaries: Vec<ColumnSummary>,
    pub rows_processed: usize,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.abort.is_none() && self.report.is_empty()
    }
}

pub struct ValidationEngine<'t> {
    template: &'t Template,
    options: ValidationOptions,
}

impl<'t> ValidationEngine<'t> {
    pub fn new(template: &'t Template, options: ValidationOptions) -> Self {
        Self { template, options }
    }

    /// Validate `table`. `source` only labels log lines.
    ///
    /// Invalid cells never produce `Err`; they land in the outcome's report.
    /// `Err` means the template cannot be applied to this data at all.
    pub fn run(
        &self,
        table: &Table,
        source: &str,
        reporter: &dyn Reporter,
    ) -> Result<ValidationOutcome, RuleError> {
        reporter.info(&format!("Validating {source}"));
        let mut outcome = ValidationOutcome::default();

        if table.is_empty() {
            reporter.info("Source file has no data");
            outcome.abort = Some(Abort::NoData);
            return Ok(outcome);
        }

        let source_columns: Vec<(usize, &str)> = table.meaningful_columns();
        let source_names: BTreeSet<&str> = source_columns.iter().map(|(_, n)| *n).collect();

        outcome.missing_validators = source_names
            .iter()
            .filter(|c| !self.template.contains(c))
            .map(|c| c.to_string())
            .collect();
        outcome.missing_fields = self
            .template
            .column_names()
            .filter(|c| !source_names.contains(c))
            .map(String::from)
            .collect();

        if !outcome.missing_validators.is_empty() {
            reporter.info("Missing...");
            reporter.error("Missing validators for:");
            log_missing(reporter, &outcome.missing_validators);
            if !self.options.ignore_missing_validators {
                outcome.abort = Some(Abort::MissingValidators);
            }
        }

        if !outcome.missing_fields.is_empty() {
            reporter.info("Missing...");
            reporter.error("Missing expected fields:");
            log_missing(reporter, &outcome.missing_fields);
            outcome.abort = Some(Abort::MissingFields);
        }

        if outcome.abort.is_some() {
            return Ok(outcome);
        }

        // Only columns with a rule take part in the row pass, in template order.
        let mut checked: Vec<(usize, &str)> = source_columns
            .into_iter()
            .filter(|(_, name)| self.template.contains(name))
            .collect();
        checked.sort_by_key(|(_, name)| self.template.position(name));

        let mut trackers: HashMap<&str, ColumnTracker> = checked
            .iter()
            .map(|(_, name)| (*name, ColumnTracker::default()))
            .collect();

        for i in 0..table.row_count() {
            let line = self.options.header_row + 1 + i;
            let row = table.row_context(i);
            for (position, column) in &checked {
                let Some(rule) = self.template.get(column) else {
                    continue;
                };
                let Some(tracker) = trackers.get_mut(column) else {
                    continue;
                };
                let value = row.at(*position);
                if let Some(message) = rule.check(column, value, &row, &mut tracker.state)? {
                    tracker.record(value, line);
                    outcome.report.push(Failure {
                        column: column.to_string(),
                        row: line,
                        message,
                    });
                }
            }
        }
        outcome.rows_processed = table.row_count();

        for (_, column) in &checked {
            let (Some(rule), Some(tracker)) = (self.template.get(column), trackers.get(column))
            else {
                continue;
            };
            if let Some(summary) = tracker.summary(column, rule.name(), outcome.rows_processed) {
                outcome.summaries.push(summary);
            }
        }

        if outcome.report.is_empty() {
            reporter.info("Passed");
        } else {
            reporter.info("Failed");
            self.log_failures(&outcome, source, reporter);
        }

        Ok(outcome)
    }

    fn log_failures(&self, outcome: &ValidationOutcome, source: &str, reporter: &dyn Reporter) {
        for column in outcome.report.columns() {
            reporter.debug(&format!("Failure on field: \"{column}\":"));
            let Some(rows) = outcome.report.column(column) else {
                continue;
            };
            for (row, failures) in rows {
                reporter.debug(&format!("  {source}:{row}"));
                for failure in failures {
                    reporter.debug(&format!("    {}", failure.message));
                }
            }
        }
        for summary in &outcome.summaries {
            let [counts, values] = summary.lines();
            reporter.error(&format!("  {counts}"));
            reporter.error(&format!("    {values}"));
        }
    }
}

fn log_missing(reporter: &dyn Reporter, columns: &BTreeSet<String>) {
    for column in columns {
        reporter.error(&format!("    '{column}'"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CaptureReporter, ReportLevel};
    use crate::rule::Rule;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn status_template() -> Template {
        Template::builder()
            .column("status", Rule::fixed_set(["open", "closed"]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_failure_row_number() {
        let template = status_template();
        let options = ValidationOptions {
            header_row: 2,
            ..Default::default()
        };
        let reporter = CaptureReporter::new();
        let outcome = ValidationEngine::new(&template, options)
            .run(&table(&["status"], &[&["pending"], &["open"]]), "s.csv", &reporter)
            .unwrap();

        assert!(!outcome.passed());
        assert_eq!(outcome.report.len(), 1);
        let failure = outcome.report.iter().next().unwrap();
        assert_eq!(failure.column, "status");
        assert_eq!(failure.row, 3);
        assert_eq!(outcome.summaries[0].fail_count, 1);
        assert!(reporter.contains("SetRule failed 1 time(s) (50.0%) on field: 'status'"));
        assert!(reporter.contains("Invalid fields: ['pending'] in rows: [3]"));
    }

    #[test]
    fn test_pass() {
        let template = status_template();
        let reporter = CaptureReporter::new();
        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(&table(&["status"], &[&["open"], &["closed"]]), "s.csv", &reporter)
            .unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.rows_processed, 2);
        assert_eq!(reporter.at(ReportLevel::Info).last().map(String::as_str), Some("Passed"));
    }

    #[test]
    fn test_no_data_aborts() {
        let template = status_template();
        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(&table(&["status"], &[]), "s.csv", &CaptureReporter::new())
            .unwrap();
        assert_eq!(outcome.abort, Some(Abort::NoData));
        assert!(outcome.report.is_empty());
        assert!(!outcome.passed());
    }

    #[test]
    fn test_missing_fields_abort_before_rows() {
        let template = Template::builder()
            .column("a", Rule::fixed_set(["x"]))
            .column("b", Rule::any())
            .column("c", Rule::any())
            .build()
            .unwrap();
        let reporter = CaptureReporter::new();
        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(&table(&["a", "b"], &[&["bad", "1"]]), "s.csv", &reporter)
            .unwrap();

        assert_eq!(outcome.abort, Some(Abort::MissingFields));
        assert_eq!(outcome.missing_fields, BTreeSet::from(["c".to_string()]));
        assert!(outcome.report.is_empty());
        assert_eq!(outcome.rows_processed, 0);
        assert!(reporter.contains("Missing expected fields:"));
    }

    #[test]
    fn test_missing_fields_abort_even_when_ignoring_validators() {
        let template = Template::builder()
            .column("a", Rule::any())
            .column("c", Rule::any())
            .build()
            .unwrap();
        let options = ValidationOptions {
            ignore_missing_validators: true,
            ..Default::default()
        };
        let outcome = ValidationEngine::new(&template, options)
            .run(&table(&["a", "extra"], &[&["1", "2"]]), "s.csv", &CaptureReporter::new())
            .unwrap();
        assert_eq!(outcome.abort, Some(Abort::MissingFields));
        assert_eq!(outcome.missing_validators, BTreeSet::from(["extra".to_string()]));
    }

    #[test]
    fn test_missing_validators() {
        let template = status_template();
        let source = table(&["status", "notes"], &[&["open", "whatever"]]);

        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(&source, "s.csv", &CaptureReporter::new())
            .unwrap();
        assert_eq!(outcome.abort, Some(Abort::MissingValidators));
        assert_eq!(outcome.rows_processed, 0);

        let options = ValidationOptions {
            ignore_missing_validators: true,
            ..Default::default()
        };
        let outcome = ValidationEngine::new(&template, options)
            .run(&source, "s.csv", &CaptureReporter::new())
            .unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.missing_validators.len(), 1);
    }

    #[test]
    fn test_placeholder_columns_are_ignored() {
        let template = status_template();
        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(
                &table(&["status", "", "Unnamed: 2"], &[&["open", "x", "y"]]),
                "s.csv",
                &CaptureReporter::new(),
            )
            .unwrap();
        assert!(outcome.passed());
        assert!(outcome.missing_validators.is_empty());
    }

    #[test]
    fn test_linked_set_unknown_parent_value_propagates() {
        let template = Template::builder()
            .column("country", Rule::any())
            .column("city", Rule::linked_set("country", [("France", vec!["Paris"])]))
            .build()
            .unwrap();
        let err = ValidationEngine::new(&template, ValidationOptions::default())
            .run(
                &table(&["country", "city"], &[&["Italy", "Rome"]]),
                "s.csv",
                &CaptureReporter::new(),
            )
            .unwrap_err();
        assert!(matches!(err, RuleError::UnknownParentValue { .. }));
    }

    #[test]
    fn test_failures_across_columns() {
        let template = Template::builder()
            .column("id", Rule::unique(vec![]))
            .column("age", Rule::integer(Some(0), Some(120)))
            .build()
            .unwrap();
        let source = table(
            &["age", "id"],
            &[&["30", "a"], &["-1", "b"], &["old", "a"], &["", "c"]],
        );
        let outcome = ValidationEngine::new(&template, ValidationOptions::default())
            .run(&source, "s.csv", &CaptureReporter::new())
            .unwrap();

        assert_eq!(outcome.report.len(), 4);
        let age_rows: Vec<usize> = outcome.report.column("age").unwrap().keys().copied().collect();
        assert_eq!(age_rows, vec![2, 3, 4]);
        let id_rows: Vec<usize> = outcome.report.column("id").unwrap().keys().copied().collect();
        assert_eq!(id_rows, vec![3]);

        let columns: Vec<&str> = outcome.summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "age"]);
        assert_eq!(outcome.summaries[1].invalid_values, vec!["", "-1", "old"]);
    }
}
