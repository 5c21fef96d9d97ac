//! Failure records and per-column statistics for a validation run.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::rule::RuleState;

/// One invalid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub column: String,
    /// 1-based row number as reported to the user (header offset applied).
    pub row: usize,
    pub message: String,
}

/// Failures grouped by column, then row.
///
/// Columns are keyed by name. Rows within a column are in ascending order,
/// which is also the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FailureReport {
    columns: BTreeMap<String, BTreeMap<usize, Vec<Failure>>>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: Failure) {
        self.columns
            .entry(failure.column.clone())
            .or_default()
            .entry(failure.row)
            .or_default()
            .push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total number of failures across all columns.
    pub fn len(&self) -> usize {
        self.columns
            .values()
            .flat_map(|rows| rows.values())
            .map(Vec::len)
            .sum()
    }

    /// Failures for one column, keyed by row.
    pub fn column(&self, column: &str) -> Option<&BTreeMap<usize, Vec<Failure>>> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Every failure, by column then row.
    pub fn iter(&self) -> impl Iterator<Item = &Failure> {
        self.columns
            .values()
            .flat_map(|rows| rows.values())
            .flatten()
    }
}

/// Offending values and rows for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BadValues {
    /// Distinct offending values, sorted.
    pub invalid_set: BTreeSet<String>,
    /// Row numbers of every failure, in encounter order.
    pub invalid_rows: Vec<usize>,
}

/// Mutable per-run counters for one column.
#[derive(Debug, Default)]
pub struct ColumnTracker {
    pub fail_count: usize,
    pub bad: BadValues,
    pub state: RuleState,
}

impl ColumnTracker {
    pub fn record(&mut self, value: &str, row: usize) {
        self.fail_count += 1;
        self.bad.invalid_set.insert(value.to_string());
        self.bad.invalid_rows.push(row);
    }

    /// Summary for a failing column; `None` when nothing failed.
    pub fn summary(&self, column: &str, rule_name: &str, rows: usize) -> Option<ColumnSummary> {
        if self.fail_count == 0 {
            return None;
        }
        let fail_rate = if rows == 0 {
            0.0
        } else {
            self.fail_count as f64 / rows as f64
        };
        Some(ColumnSummary {
            column: column.to_string(),
            rule: rule_name.to_string(),
            fail_count: self.fail_count,
            fail_rate,
            invalid_values: self.bad.invalid_set.iter().cloned().collect(),
            invalid_rows: self.bad.invalid_rows.clone(),
        })
    }
}

/// Failure statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub rule: String,
    pub fail_count: usize,
    /// Fraction of processed rows that failed (0.0 - 1.0).
    pub fail_rate: f64,
    pub invalid_values: Vec<String>,
    pub invalid_rows: Vec<usize>,
}

impl ColumnSummary {
    /// Human-readable summary lines.
    pub fn lines(&self) -> [String; 2] {
        [
            format!(
                "{} failed {} time(s) ({:.1}%) on field: '{}'",
                self.rule,
                self.fail_count,
                self.fail_rate * 100.0,
                self.column
            ),
            format!(
                "Invalid fields: [{}] in rows: [{}]",
                self.invalid_values
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
                self.invalid_rows
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(column: &str, row: usize) -> Failure {
        Failure {
            column: column.into(),
            row,
            message: "bad".into(),
        }
    }

    #[test]
    fn test_report_groups_by_column_and_row() {
        let mut report = FailureReport::new();
        report.push(failure("b", 3));
        report.push(failure("a", 2));
        report.push(failure("a", 2));
        assert_eq!(report.len(), 3);
        assert_eq!(report.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(report.column("a").unwrap()[&2].len(), 2);
    }

    #[test]
    fn test_tracker_summary() {
        let mut tracker = ColumnTracker::default();
        assert!(tracker.summary("status", "SetRule", 4).is_none());

        tracker.record("pending", 2);
        tracker.record("draft", 4);
        tracker.record("pending", 5);
        let summary = tracker.summary("status", "SetRule", 4).unwrap();
        assert_eq!(summary.fail_count, 3);
        assert!((summary.fail_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(summary.invalid_values, vec!["draft", "pending"]);
        assert_eq!(summary.invalid_rows, vec![2, 4, 5]);

        let [first, second] = summary.lines();
        assert_eq!(first, "SetRule failed 3 time(s) (75.0%) on field: 'status'");
        assert_eq!(second, "Invalid fields: ['draft', 'pending'] in rows: [2, 4, 5]");
    }
}
