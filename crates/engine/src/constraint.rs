//! Spreadsheet-native input constraints
//!
//! The generated workbook attaches one [`Constraint`] per Data column. The
//! model mirrors what an xlsx `<dataValidation>` element can express: list
//! sources, whole/decimal/date bounds and custom formulas. The io crate maps
//! it to and from rust_xlsxwriter / worksheet XML.

use chrono::NaiveDate;
use serde::Serialize;

/// Largest magnitude a spreadsheet decimal bound can hold.
pub const DECIMAL_LIMIT: f64 = 9.99e307;

/// Whole-number constraints hold 32-bit integers.
pub const WHOLE_NUMBER_MIN: f64 = i32::MIN as f64;
pub const WHOLE_NUMBER_MAX: f64 = i32::MAX as f64;

/// Lower bound used for date constraints without an earliest date.
pub const EPOCH_DATE: (i32, u32, u32) = (1900, 1, 1);

/// First date a spreadsheet date constraint can express.
pub fn epoch_date() -> NaiveDate {
    let (y, m, d) = EPOCH_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Error alerts are limited by the xlsx format.
pub const MAX_ALERT_TITLE: usize = 32;
pub const MAX_ALERT_MESSAGE: usize = 255;

/// An input constraint attached to a range of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    /// If true, empty/blank values are always valid.
    pub ignore_blank: bool,
    /// Optional error alert shown when an entered value is rejected.
    pub error_alert: Option<ErrorAlert>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            ignore_blank: true,
            error_alert: None,
        }
    }

    pub fn list(source: ListSource) -> Self {
        Self::new(ConstraintKind::List(source))
    }

    pub fn with_ignore_blank(mut self, ignore: bool) -> Self {
        self.ignore_blank = ignore;
        self
    }

    /// Attach an error alert, truncating title and message to the xlsx limits.
    pub fn with_error_alert(mut self, title: &str, message: &str) -> Self {
        self.error_alert = Some(ErrorAlert {
            title: title.chars().take(MAX_ALERT_TITLE).collect(),
            message: message.chars().take(MAX_ALERT_MESSAGE).collect(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstraintKind {
    /// Restrict to a list of allowed values (dropdown).
    List(ListSource),
    /// Restrict to integers within bounds.
    WholeNumber(Bounds<f64>),
    /// Restrict to decimals within bounds.
    Decimal(Bounds<f64>),
    /// Restrict to dates within bounds.
    Date(Bounds<NaiveDate>),
    /// Custom formula that must return TRUE.
    Custom(String),
}

/// Source of values for a list constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ListSource {
    /// Inline list of allowed values.
    Inline(Vec<String>),
    /// Range reference without a leading `=` (e.g. `Sets!$A$2:$A$10`).
    Range(String),
    /// Formula resolving to a range (e.g. `INDIRECT(...)` or a defined name).
    Formula(String),
}

/// Comparison operator for bounded constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// Operator plus one or two operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds<T> {
    pub operator: ComparisonOperator,
    pub value1: T,
    /// Second value (required for Between/NotBetween).
    pub value2: Option<T>,
}

impl<T> Bounds<T> {
    pub fn between(min: T, max: T) -> Self {
        Self {
            operator: ComparisonOperator::Between,
            value1: min,
            value2: Some(max),
        }
    }

    pub fn at_least(min: T) -> Self {
        Self {
            operator: ComparisonOperator::GreaterThanOrEqual,
            value1: min,
            value2: None,
        }
    }
}

impl<T: Clone> Bounds<T> {
    /// Recover `(min, max)` for the inclusive operators; others yield `(None, None)`.
    pub fn as_range(&self) -> (Option<T>, Option<T>) {
        match self.operator {
            ComparisonOperator::Between => (Some(self.value1.clone()), self.value2.clone()),
            ComparisonOperator::GreaterThanOrEqual => (Some(self.value1.clone()), None),
            ComparisonOperator::LessThanOrEqual => (None, Some(self.value1.clone())),
            ComparisonOperator::EqualTo => (Some(self.value1.clone()), Some(self.value1.clone())),
            _ => (None, None),
        }
    }
}

/// Error alert shown by the spreadsheet application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorAlert {
    pub title: String,
    pub message: String,
}
