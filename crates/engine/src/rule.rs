//! Column rules
//!
//! A [`Rule`] constrains one column. Each variant carries only the state it
//! needs; checking, describing and rendering (see `generate.rs`) each match on
//! [`RuleKind`] in one place.
//!
//! ## Empty cells
//!
//! A cell that is empty after trimming passes every rule when `empty_ok` is
//! set. Otherwise it fails every rule except [`RuleKind::Any`].
//!
//! ## Case sensitivity
//!
//! Set, linked-set and ontology membership is case-sensitive. "Yes" != "yes".

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::RuleError;
use crate::table::RowContext;

/// A validation rule for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    /// If true, empty values are always valid.
    pub empty_ok: bool,
}

/// The rule variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Accept any value.
    Any,
    /// Any non-empty text.
    Text,
    /// Integers within optional inclusive bounds.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Decimal numbers within optional inclusive bounds.
    Float { min: Option<f64>, max: Option<f64> },
    /// Dates within optional inclusive bounds.
    Date {
        day_first: bool,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    },
    Email,
    /// Whole value must match the pattern.
    Regex(Pattern),
    /// Value (optionally combined with sibling columns) must not repeat.
    Unique { unique_with: Vec<String> },
    /// Value must be one of a fixed list.
    FixedSet(ValueList),
    /// Allowed values depend on the value of `parent` in the same row.
    LinkedSet {
        parent: String,
        values: BTreeMap<String, ValueList>,
    },
    /// Value must be a term of an externally sourced ontology.
    Ontology {
        ontology: String,
        root_term: Option<String>,
        terms: ValueList,
    },
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            empty_ok: false,
        }
    }

    /// Set empty_ok option.
    pub fn with_empty_ok(mut self, empty_ok: bool) -> Self {
        self.empty_ok = empty_ok;
        self
    }

    pub fn any() -> Self {
        Self::new(RuleKind::Any)
    }

    pub fn text() -> Self {
        Self::new(RuleKind::Text)
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(RuleKind::Integer { min, max })
    }

    pub fn float(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(RuleKind::Float { min, max })
    }

    pub fn date(earliest: Option<NaiveDate>, latest: Option<NaiveDate>) -> Self {
        Self::new(RuleKind::Date {
            day_first: true,
            earliest,
            latest,
        })
    }

    pub fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(RuleKind::Regex(Pattern::new(pattern)?)))
    }

    pub fn unique(unique_with: Vec<String>) -> Self {
        Self::new(RuleKind::Unique { unique_with })
    }

    /// Create a fixed set rule from allowed values.
    pub fn fixed_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RuleKind::FixedSet(ValueList::new(values)))
    }

    /// Create a linked set rule from `(parent value, allowed values)` pairs.
    pub fn linked_set<I, V, S>(parent: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(key, allowed)| (key.into(), ValueList::new(allowed)))
            .collect();
        Self::new(RuleKind::LinkedSet {
            parent: parent.into(),
            values,
        })
    }

    /// Create an ontology rule from an already materialized term list.
    pub fn ontology<I, S>(ontology: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RuleKind::Ontology {
            ontology: ontology.into(),
            root_term: None,
            terms: ValueList::new(terms),
        })
    }

    /// Short variant name used in failure summaries.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            RuleKind::Any => "AnyRule",
            RuleKind::Text => "TextRule",
            RuleKind::Integer { .. } => "IntegerRule",
            RuleKind::Float { .. } => "FloatRule",
            RuleKind::Date { .. } => "DateRule",
            RuleKind::Email => "EmailRule",
            RuleKind::Regex(_) => "RegexRule",
            RuleKind::Unique { .. } => "UniqueRule",
            RuleKind::FixedSet(_) => "SetRule",
            RuleKind::LinkedSet { .. } => "LinkedSetRule",
            RuleKind::Ontology { .. } => "OntologyRule",
        }
    }

    /// Check one cell.
    ///
    /// Returns `Ok(None)` when the value is valid and `Ok(Some(message))` when
    /// it is not. `Err` is reserved for template errors that make the check
    /// itself impossible.
    pub fn check(
        &self,
        column: &str,
        value: &str,
        row: &RowContext<'_>,
        state: &mut RuleState,
    ) -> Result<Option<String>, RuleError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            if self.empty_ok || matches!(self.kind, RuleKind::Any) {
                return Ok(None);
            }
            return Ok(Some("Empty value".to_string()));
        }

        let message = match &self.kind {
            RuleKind::Any | RuleKind::Text => None,
            RuleKind::Integer { min, max } => check_integer(trimmed, *min, *max),
            RuleKind::Float { min, max } => check_float(trimmed, *min, *max),
            RuleKind::Date {
                day_first,
                earliest,
                latest,
            } => check_date(trimmed, *day_first, *earliest, *latest),
            RuleKind::Email => {
                (!email_regex().is_match(trimmed)).then(|| format!("'{value}' is not a valid email address"))
            }
            RuleKind::Regex(pattern) => (!pattern.is_match(value))
                .then(|| format!("'{value}' does not match pattern '{}'", pattern.as_str())),
            RuleKind::Unique { unique_with } => {
                let mut key = value.to_string();
                for other in unique_with {
                    key.push('\u{1f}');
                    key.push_str(row.get(other).unwrap_or(""));
                }
                if state.seen.insert(key) {
                    None
                } else if unique_with.is_empty() {
                    Some(format!("'{value}' is not unique"))
                } else {
                    Some(format!(
                        "'{value}' is not unique in combination with {}",
                        unique_with.join(", ")
                    ))
                }
            }
            RuleKind::FixedSet(values) => (!values.contains(value))
                .then(|| format!("'{value}' is not one of the allowed values")),
            RuleKind::LinkedSet { parent, values } => {
                let parent_value = row.get(parent).ok_or_else(|| RuleError::MissingParentColumn {
                    column: column.to_string(),
                    parent: parent.clone(),
                })?;
                let allowed = values.get(parent_value).ok_or_else(|| RuleError::UnknownParentValue {
                    column: column.to_string(),
                    parent: parent.clone(),
                    value: parent_value.to_string(),
                })?;
                (!allowed.contains(value))
                    .then(|| format!("'{value}' is not allowed when {parent} is '{parent_value}'"))
            }
            RuleKind::Ontology {
                ontology, terms, ..
            } => (!terms.contains(value))
                .then(|| format!("'{value}' is not a term of ontology {ontology}")),
        };

        Ok(message)
    }

    /// One-line description for the README sheet.
    pub fn describe(&self, column: &str) -> String {
        let body = match &self.kind {
            RuleKind::Any => "Any value".to_string(),
            RuleKind::Text => "Free text".to_string(),
            RuleKind::Integer { min, max } => {
                format!("Integer value{}", describe_bounds(min.as_ref(), max.as_ref()))
            }
            RuleKind::Float { min, max } => {
                format!("Decimal value{}", describe_bounds(min.as_ref(), max.as_ref()))
            }
            RuleKind::Date {
                day_first,
                earliest,
                latest,
            } => {
                let format = if *day_first { "DD/MM/YYYY" } else { "MM/DD/YYYY" };
                format!(
                    "Date ({format} or YYYY-MM-DD){}",
                    describe_bounds(earliest.as_ref(), latest.as_ref())
                )
            }
            RuleKind::Email => "Email address".to_string(),
            RuleKind::Regex(pattern) => format!("Value matching pattern {}", pattern.as_str()),
            RuleKind::Unique { unique_with } if unique_with.is_empty() => "Unique value".to_string(),
            RuleKind::Unique { unique_with } => {
                format!("Unique value in combination with columns: {}", unique_with.join(", "))
            }
            RuleKind::FixedSet(values) => format!("Allowed values: {}", values.join(", ")),
            RuleKind::LinkedSet { parent, values } => {
                let pairs: Vec<String> = values
                    .iter()
                    .map(|(key, allowed)| format!("{key} -> {}", allowed.join(", ")))
                    .collect();
                format!("Depends on column {parent}: {}", pairs.join("; "))
            }
            RuleKind::Ontology {
                ontology,
                root_term: Some(root),
                ..
            } => format!("Term from ontology {ontology} (under {root})"),
            RuleKind::Ontology { ontology, .. } => format!("Term from ontology {ontology}"),
        };

        if self.empty_ok {
            format!("{column} : {body} (empty values allowed)")
        } else {
            format!("{column} : {body}")
        }
    }
}

/// Per-run mutable state of a rule (uniqueness tracking).
#[derive(Debug, Default)]
pub struct RuleState {
    seen: HashSet<String>,
}

/// Ordered list of allowed values with constant-time membership.
#[derive(Debug, Clone, Default)]
pub struct ValueList {
    values: Vec<String>,
    index: HashSet<String>,
}

impl ValueList {
    /// Build a list, dropping repeated values but keeping first-seen order.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for value in values {
            let value = value.into();
            if list.index.insert(value.clone()) {
                list.values.push(value);
            }
        }
        list
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains(value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.values.join(separator)
    }
}

impl PartialEq for ValueList {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// A compiled pattern that must match the whole cell value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| unreachable!("email pattern is valid: {e}"))
    })
}

fn describe_bounds<T: fmt::Display>(min: Option<&T>, max: Option<&T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(" between {min} and {max}"),
        (Some(min), None) => format!(" of at least {min}"),
        (None, Some(max)) => format!(" of at most {max}"),
        (None, None) => String::new(),
    }
}

/// Parse an integer the way a spreadsheet user types it: optional sign, no decimals.
///
/// ```
/// use cellcheck_engine::rule::parse_integer;
///
/// assert_eq!(parse_integer("42"), Some(42));
/// assert_eq!(parse_integer("+7"), Some(7));
/// assert_eq!(parse_integer("3.0"), None);
/// ```
pub fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if normalized.is_empty() || normalized.starts_with('-') && normalized.len() == 1 {
        return None;
    }
    normalized.parse::<i64>().ok()
}

/// Parse a finite decimal number.
pub fn parse_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a date as ISO `YYYY-MM-DD` or slash-separated day/month order.
///
/// A trailing time component (`2024-03-01 00:00:00`, `2024-03-01T10:00`) is
/// accepted and ignored.
pub fn parse_date(value: &str, day_first: bool) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    let date_part = value.split_whitespace().next().unwrap_or(value);
    let slash_format = if day_first { "%d/%m/%Y" } else { "%m/%d/%Y" };
    NaiveDate::parse_from_str(date_part, slash_format).ok()
}

fn check_integer(value: &str, min: Option<i64>, max: Option<i64>) -> Option<String> {
    let Some(n) = parse_integer(value) else {
        return Some(format!("'{value}' is not an integer"));
    };
    if let Some(min) = min.filter(|min| n < *min) {
        return Some(format!("{n} is below the minimum {min}"));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        return Some(format!("{n} is above the maximum {max}"));
    }
    None
}

fn check_float(value: &str, min: Option<f64>, max: Option<f64>) -> Option<String> {
    let Some(n) = parse_float(value) else {
        return Some(format!("'{value}' is not a decimal number"));
    };
    if let Some(min) = min.filter(|min| n < *min) {
        return Some(format!("{n} is below the minimum {min}"));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        return Some(format!("{n} is above the maximum {max}"));
    }
    None
}

fn check_date(
    value: &str,
    day_first: bool,
    earliest: Option<NaiveDate>,
    latest: Option<NaiveDate>,
) -> Option<String> {
    let Some(date) = parse_date(value, day_first) else {
        return Some(format!("'{value}' is not a valid date"));
    };
    if let Some(earliest) = earliest.filter(|e| date < *e) {
        return Some(format!("{date} is before {earliest}"));
    }
    if let Some(latest) = latest.filter(|l| date > *l) {
        return Some(format!("{date} is after {latest}"));
    }
    None
}
