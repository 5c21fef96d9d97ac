//! Rebuild a template from a workbook's data validations.
//!
//! Headers come from row 1 of the selected sheet. Each header column takes
//! the first validation covering it; list sources are resolved against the
//! workbook's own cells and defined names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use cellcheck_engine::cell_ref::{col_from_letters, name_fragment, parse_range_ref, RangeRef};
use cellcheck_engine::constraint::{
    epoch_date, Bounds, Constraint, ConstraintKind, ErrorAlert, ListSource, DECIMAL_LIMIT,
    WHOLE_NUMBER_MAX, WHOLE_NUMBER_MIN,
};
use cellcheck_engine::generate::{DATA_SHEET, ONTOLOGY_SHEET};
use cellcheck_engine::workbook::DefinedName;
use cellcheck_engine::{Reporter, Rule, RuleKind, Template};

use crate::error::IoError;
use crate::source::SheetSelector;
use crate::xlsx;
use crate::xlsx_validation::{parse_defined_names, parse_sheet_validations, ImportedValidation};

/// Sheet read when the caller names none.
pub const DEFAULT_SHEET: &str = DATA_SHEET;

fn indirect_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^INDIRECT\("(?P<prefix>[^"]*)_"&(?:SUBSTITUTE\()*\$?(?P<col>[A-Z]{1,3})\$?\d+"#)
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

fn countif_column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?P<col>[A-Z]{1,3})\$\d+:\$[A-Z]{1,3}\$\d+")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// Ontology name and optional root term from a generated error alert.
fn ontology_alert_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"Term from ontology (?P<name>.+?)(?: \(under (?P<root>.+?)\))?(?: \(empty values allowed\))?$",
        )
        .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// Read-side state for one workbook.
struct WorkbookReader<'a> {
    path: &'a Path,
    data_sheet: String,
    names: Vec<DefinedName>,
    /// Name prefixes of every INDIRECT list on the sheet.
    linked_prefixes: Vec<String>,
    /// Records per sheet, loaded on first use.
    sheets: HashMap<String, Vec<Vec<String>>>,
}

impl<'a> WorkbookReader<'a> {
    fn records(&mut self, sheet: &str) -> Result<&Vec<Vec<String>>, IoError> {
        if !self.sheets.contains_key(sheet) {
            let records = xlsx::read_records(self.path, &SheetSelector::Name(sheet.to_string()))?;
            self.sheets.insert(sheet.to_string(), records);
        }
        self.sheets
            .get(sheet)
            .ok_or_else(|| IoError::SheetNotFound(format!("'{sheet}'")))
    }

    /// Non-empty values of a range, row by row.
    fn range_values(&mut self, range: &RangeRef) -> Result<Vec<String>, IoError> {
        let sheet = range.sheet.clone().unwrap_or_else(|| self.data_sheet.clone());
        let records = self.records(&sheet)?;
        let mut values = Vec::new();
        for row in records
            .iter()
            .skip(range.first_row as usize)
            .take(range.last_row.saturating_sub(range.first_row) as usize + 1)
        {
            for col in range.first_col..=range.last_col {
                if let Some(value) = row.get(col).filter(|v| !v.is_empty()) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }

    fn defined_range(&self, name: &str) -> Option<RangeRef> {
        self.names
            .iter()
            .find(|n| n.name == name)
            .and_then(|n| parse_range_ref(&n.range))
    }
}

/// Rebuild the template described by the validations of `sheet`.
pub fn extract_template(
    path: &Path,
    sheet: Option<&str>,
    reporter: &dyn Reporter,
) -> Result<Template, IoError> {
    let sheet = sheet.unwrap_or(DEFAULT_SHEET);
    let validations = parse_sheet_validations(path, sheet)?;
    let linked_prefixes = validations
        .iter()
        .filter_map(|v| match &v.constraint.kind {
            ConstraintKind::List(ListSource::Formula(formula)) => indirect_pattern()
                .captures(formula)
                .map(|caps| caps["prefix"].to_string()),
            _ => None,
        })
        .collect();
    let mut reader = WorkbookReader {
        path,
        data_sheet: sheet.to_string(),
        names: parse_defined_names(path)?,
        linked_prefixes,
        sheets: HashMap::new(),
    };
    let headers: Vec<String> = reader
        .records(sheet)?
        .first()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    reporter.debug(&format!(
        "Found {} validation(s) and {} defined name(s) in '{}'",
        validations.len(),
        reader.names.len(),
        path.display()
    ));

    let mut builder = Template::builder();
    let mut built: HashMap<String, Rule> = HashMap::new();

    for (col, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let validation = validations
            .iter()
            .find(|v| v.covers_column(col) && v.range.last_row >= 1);
        let rule = match validation {
            Some(ImportedValidation { constraint, .. }) => {
                rule_from_constraint(header, col, constraint, &headers, &built, &mut reader, reporter)?
            }
            None => Rule::any(),
        };
        reporter.debug(&format!("Column '{header}': {}", rule.name()));
        built.insert(header.clone(), rule.clone());
        builder = builder.column(header.clone(), rule);
    }

    Ok(builder.build()?)
}

fn rule_from_constraint(
    column: &str,
    col: usize,
    constraint: &Constraint,
    headers: &[String],
    built: &HashMap<String, Rule>,
    reader: &mut WorkbookReader<'_>,
    reporter: &dyn Reporter,
) -> Result<Rule, IoError> {
    let rule = match &constraint.kind {
        ConstraintKind::List(ListSource::Inline(values)) => Rule::fixed_set(values.clone()),
        ConstraintKind::List(ListSource::Range(range)) => match parse_range_ref(range) {
            Some(range) => list_rule(column, &range, constraint.error_alert.as_ref(), reader)?,
            None => Rule::any(),
        },
        ConstraintKind::List(ListSource::Formula(formula)) => {
            if let Some(caps) = indirect_pattern().captures(formula) {
                let parent = col_from_letters(&caps["col"]).and_then(|c| headers.get(c));
                match parent {
                    Some(parent) => linked_rule(&caps["prefix"], parent, built, reader)?,
                    None => {
                        reporter.debug(&format!("Column '{column}': unresolved parent in {formula}"));
                        Rule::any()
                    }
                }
            } else if let Some(range) = reader.defined_range(formula) {
                list_rule(column, &range, constraint.error_alert.as_ref(), reader)?
            } else {
                reporter.debug(&format!("Column '{column}': unsupported list source {formula}"));
                Rule::any()
            }
        }
        ConstraintKind::WholeNumber(bounds) => {
            let (min, max) = open_limits(bounds, WHOLE_NUMBER_MIN, WHOLE_NUMBER_MAX);
            Rule::integer(min.map(|v| v.round() as i64), max.map(|v| v.round() as i64))
        }
        ConstraintKind::Decimal(bounds) => {
            let (min, max) = open_limits(bounds, -DECIMAL_LIMIT, DECIMAL_LIMIT);
            Rule::float(min, max)
        }
        ConstraintKind::Date(bounds) => {
            let (earliest, latest) = bounds.as_range();
            Rule::date(earliest.filter(|d| *d != epoch_date()), latest)
        }
        ConstraintKind::Custom(formula) if formula.to_ascii_uppercase().contains("COUNTIF") => {
            let unique_with = countif_pattern_columns(formula)
                .into_iter()
                .filter(|&c| c != col)
                .filter_map(|c| headers.get(c).cloned())
                .collect();
            Rule::unique(unique_with)
        }
        ConstraintKind::Custom(formula) => {
            reporter.debug(&format!("Column '{column}': unsupported custom formula {formula}"));
            Rule::any()
        }
    };

    let empty_ok = constraint.ignore_blank && !matches!(rule.kind, RuleKind::Any);
    Ok(rule.with_empty_ok(empty_ok))
}

/// Values behind a range: an ontology when the range lives on the
/// ontology sheet, a fixed set otherwise.
///
/// The ontology name and root term are read back from the column's error
/// alert; without one the column name stands in for the ontology.
fn list_rule(
    column: &str,
    range: &RangeRef,
    alert: Option<&ErrorAlert>,
    reader: &mut WorkbookReader<'_>,
) -> Result<Rule, IoError> {
    let values = reader.range_values(range)?;
    if values.is_empty() {
        return Ok(Rule::any());
    }
    if range.sheet.as_deref() != Some(ONTOLOGY_SHEET) {
        return Ok(Rule::fixed_set(values));
    }

    let (name, root) = match alert.and_then(|a| ontology_alert_pattern().captures(&a.message)) {
        Some(caps) => (
            caps["name"].to_string(),
            caps.name("root").map(|r| r.as_str().to_string()),
        ),
        None => (column.to_string(), None),
    };
    let mut rule = Rule::ontology(name, values);
    if let RuleKind::Ontology { root_term, .. } = &mut rule.kind {
        *root_term = root;
    }
    Ok(rule)
}

/// Collect every defined name `<prefix>_<suffix>` as one parent value block.
///
/// Suffixes are mapped back to the parent's own allowed values when the
/// parent is a fixed set, so `New_Zealand` becomes `New Zealand` again.
fn linked_rule(
    prefix: &str,
    parent: &str,
    built: &HashMap<String, Rule>,
    reader: &mut WorkbookReader<'_>,
) -> Result<Rule, IoError> {
    let parent_values: Vec<String> = match built.get(parent).map(|r| &r.kind) {
        Some(RuleKind::FixedSet(values)) => values.values().to_vec(),
        _ => Vec::new(),
    };

    // A block belongs to this column when its suffix names a parent value.
    // Without known parent values, anything under a longer sibling prefix
    // (`city_area_...` next to `city_...`) belongs to that sibling.
    let name_prefix = format!("{prefix}_");
    let blocks: Vec<(String, RangeRef)> = reader
        .names
        .iter()
        .filter(|n| {
            let Some(suffix) = n.name.strip_prefix(&name_prefix) else {
                return false;
            };
            if parent_values.is_empty() {
                !reader.linked_prefixes.iter().any(|other| {
                    other.len() > prefix.len() && n.name.starts_with(&format!("{other}_"))
                })
            } else {
                parent_values.iter().any(|v| name_fragment(v) == suffix)
            }
        })
        .filter_map(|n| {
            let suffix = n.name.strip_prefix(&name_prefix)?;
            Some((suffix.to_string(), parse_range_ref(&n.range)?))
        })
        .collect();

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (suffix, range) in blocks {
        let key = parent_values
            .iter()
            .find(|v| name_fragment(v) == suffix)
            .cloned()
            .unwrap_or(suffix);
        values.insert(key, reader.range_values(&range)?);
    }

    if values.is_empty() {
        return Ok(Rule::any());
    }
    Ok(Rule::linked_set(parent.to_string(), values))
}

/// Inclusive bounds with the format's open-ended limits mapped to `None`.
fn open_limits(bounds: &Bounds<f64>, low: f64, high: f64) -> (Option<f64>, Option<f64>) {
    let (min, max) = bounds.as_range();
    (min.filter(|v| *v > low), max.filter(|v| *v < high))
}

fn countif_pattern_columns(formula: &str) -> Vec<usize> {
    countif_column_pattern()
        .captures_iter(formula)
        .filter_map(|caps| col_from_letters(&caps["col"]))
        .collect()
}
