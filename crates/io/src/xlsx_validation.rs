//! XLSX Data Validation import/export support
//!
//! This module maps between the engine's [`Constraint`] model and Excel's
//! `<dataValidation>` XML. Export goes through rust_xlsxwriter; import reads
//! the worksheet XML directly because calamine does not expose validations.
//!
//! ## Key gotchas
//! - Excel's `allowBlank="1"` maps to `ignore_blank: true`
//! - Inline lists are written as a quoted formula (`"a,b,c"`) so that lists
//!   of exactly 256 characters are still accepted
//! - Date bounds are stored as serial day numbers in the 1900 date system

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use quick_xml::events::Event;
use quick_xml::Reader;
use rust_xlsxwriter::{
    DataValidation, DataValidationRule, ExcelDateTime, Formula, IntoDataValidationValue,
};
use zip::ZipArchive;

use cellcheck_engine::cell_ref::{parse_range_ref, RangeRef};
use cellcheck_engine::constraint::{
    Bounds, ComparisonOperator, Constraint, ConstraintKind, ErrorAlert, ListSource,
};
use cellcheck_engine::workbook::DefinedName;

use crate::error::IoError;

// ============================================================================
// Export: Constraint -> Excel
// ============================================================================

/// Convert a constraint to a rust_xlsxwriter DataValidation.
pub fn constraint_to_xlsx(constraint: &Constraint) -> Result<DataValidation, IoError> {
    let dv = DataValidation::new();
    let mut dv = match &constraint.kind {
        ConstraintKind::List(source) => dv.allow_list_formula(list_formula(source)),
        ConstraintKind::WholeNumber(bounds) => {
            dv.allow_whole_number(to_rule(bounds, |v| v.round() as i32))
        }
        ConstraintKind::Decimal(bounds) => dv.allow_decimal_number(to_rule(bounds, |v| v)),
        ConstraintKind::Date(bounds) => {
            let value1 = to_excel_date(&bounds.value1)?;
            let value2 = bounds.value2.as_ref().map(to_excel_date).transpose()?;
            let bounds = Bounds {
                operator: bounds.operator,
                value1,
                value2,
            };
            dv.allow_date(to_rule(&bounds, |v| v))
        }
        ConstraintKind::Custom(formula) => dv.allow_custom(Formula::new(formula)),
    };

    dv = dv.ignore_blank(constraint.ignore_blank);

    if let Some(alert) = &constraint.error_alert {
        dv = dv.set_error_title(&alert.title)?;
        dv = dv.set_error_message(&alert.message)?;
    }

    Ok(dv)
}

fn list_formula(source: &ListSource) -> Formula {
    match source {
        ListSource::Inline(items) => {
            let joined = items.join(",").replace('"', "\"\"");
            Formula::new(format!("\"{joined}\""))
        }
        ListSource::Range(range) => Formula::new(range.strip_prefix('=').unwrap_or(range)),
        ListSource::Formula(formula) => Formula::new(formula.strip_prefix('=').unwrap_or(formula)),
    }
}

/// Convert operator + values to a DataValidationRule
fn to_rule<T, U>(bounds: &Bounds<T>, convert: impl Fn(T) -> U) -> DataValidationRule<U>
where
    T: Clone,
    U: IntoDataValidationValue,
{
    let v1 = convert(bounds.value1.clone());
    let v2 = convert(bounds.value2.clone().unwrap_or_else(|| bounds.value1.clone()));

    match bounds.operator {
        ComparisonOperator::Between => DataValidationRule::Between(v1, v2),
        ComparisonOperator::NotBetween => DataValidationRule::NotBetween(v1, v2),
        ComparisonOperator::EqualTo => DataValidationRule::EqualTo(v1),
        ComparisonOperator::NotEqualTo => DataValidationRule::NotEqualTo(v1),
        ComparisonOperator::GreaterThan => DataValidationRule::GreaterThan(v1),
        ComparisonOperator::LessThan => DataValidationRule::LessThan(v1),
        ComparisonOperator::GreaterThanOrEqual => DataValidationRule::GreaterThanOrEqualTo(v1),
        ComparisonOperator::LessThanOrEqual => DataValidationRule::LessThanOrEqualTo(v1),
    }
}

fn to_excel_date(date: &NaiveDate) -> Result<ExcelDateTime, IoError> {
    Ok(ExcelDateTime::from_ymd(
        date.year() as u16,
        date.month() as u8,
        date.day() as u8,
    )?)
}

// ============================================================================
// Import: Excel -> Constraint
// ============================================================================

/// A validation parsed from XLSX.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedValidation {
    pub range: RangeRef,
    pub constraint: Constraint,
}

impl ImportedValidation {
    pub fn covers_column(&self, col: usize) -> bool {
        (self.range.first_col..=self.range.last_col).contains(&col)
    }
}

/// Parse all validation rules from an XLSX file for a specific sheet.
pub fn parse_sheet_validations(
    xlsx_path: &Path,
    sheet_name: &str,
) -> Result<Vec<ImportedValidation>, IoError> {
    let mut archive = open_archive(xlsx_path)?;

    // Step 1: Find the worksheet XML path for this sheet name
    let xml_path = find_worksheet_xml_path(&mut archive, sheet_name)?;

    // Step 2: Read and parse the worksheet XML
    let xml_content = read_zip_file(&mut archive, &xml_path)?;

    // Step 3: Parse <dataValidation> elements
    parse_validations_from_xml(&xml_content)
}

/// Parse the workbook-level defined names.
pub fn parse_defined_names(xlsx_path: &Path) -> Result<Vec<DefinedName>, IoError> {
    let mut archive = open_archive(xlsx_path)?;
    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml")?;
    parse_defined_names_from_xml(&workbook_xml)
}

fn open_archive(xlsx_path: &Path) -> Result<ZipArchive<std::fs::File>, IoError> {
    let file = std::fs::File::open(xlsx_path).map_err(|e| IoError::file(xlsx_path, e))?;
    ZipArchive::new(file).map_err(|e| IoError::Xml(format!("Failed to read XLSX as ZIP: {}", e)))
}

/// Find the worksheet XML path for a given sheet name.
///
/// This requires parsing:
/// 1. xl/workbook.xml to find the sheet's rId
/// 2. xl/_rels/workbook.xml.rels to map rId to the actual XML path
fn find_worksheet_xml_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_name: &str,
) -> Result<String, IoError> {
    let workbook_xml = read_zip_file(archive, "xl/workbook.xml")?;
    let rid = find_sheet_rid(&workbook_xml, sheet_name)?;

    let rels_xml = read_zip_file(archive, "xl/_rels/workbook.xml.rels")?;
    let target = find_relationship_target(&rels_xml, &rid)?;

    // Target is relative to xl/ unless absolute
    Ok(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    })
}

/// Collect an element's attributes as owned strings.
fn attributes(e: &quick_xml::events::BytesStart<'_>) -> HashMap<String, String> {
    e.attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                String::from_utf8_lossy(&attr.value).to_string(),
            )
        })
        .collect()
}

/// Find the rId for a sheet name in workbook.xml
fn find_sheet_rid(workbook_xml: &str, sheet_name: &str) -> Result<String, IoError> {
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                let mut attrs = attributes(e);
                if attrs.get("name").map(|n| unescape_attr(n)) == Some(sheet_name.to_string()) {
                    if let Some(rid) = attrs.remove("r:id") {
                        return Ok(rid);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IoError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Err(IoError::SheetNotFound(format!("'{sheet_name}'")))
}

/// Find the target path for a relationship ID in workbook.xml.rels
fn find_relationship_target(rels_xml: &str, rid: &str) -> Result<String, IoError> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut attrs = attributes(e);
                if attrs.get("Id").map(String::as_str) == Some(rid) {
                    if let Some(target) = attrs.remove("Target") {
                        return Ok(target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IoError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Err(IoError::Xml(format!("Relationship '{}' not found", rid)))
}

/// Read a file from the ZIP archive
fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, IoError> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| IoError::Xml(format!("File '{}' not found in XLSX: {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| IoError::Xml(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Resolve a predefined or numeric entity reference (`amp`, `#34`, `#x22`).
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let n = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(n)
        }
    }
}

/// Unescape entity references in an attribute value.
fn unescape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        match tail.find(';').and_then(|end| Some((end, resolve_entity(&tail[..end])?))) {
            Some((end, c)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Which formula element the reader is inside.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FormulaSlot {
    None,
    First,
    Second,
}

/// Parse <dataValidation> elements from worksheet XML
fn parse_validations_from_xml(xml: &str) -> Result<Vec<ImportedValidation>, IoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut validations = Vec::new();
    let mut buf = Vec::new();
    let mut in_data_validation = false;
    let mut current_attrs: HashMap<String, String> = HashMap::new();
    let mut formula1 = String::new();
    let mut formula2 = String::new();
    let mut slot = FormulaSlot::None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"dataValidation" => {
                in_data_validation = true;
                current_attrs = attributes(e);
                formula1.clear();
                formula2.clear();
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"dataValidation" => {
                // Self-closing <dataValidation /> carries no formulas
                push_validation(&mut validations, &attributes(e), "", "");
            }
            Ok(Event::Start(ref e)) if in_data_validation && e.name().as_ref() == b"formula1" => {
                slot = FormulaSlot::First;
            }
            Ok(Event::Start(ref e)) if in_data_validation && e.name().as_ref() == b"formula2" => {
                slot = FormulaSlot::Second;
            }
            Ok(Event::Text(ref e)) if slot != FormulaSlot::None => {
                let text = e.decode().unwrap_or_default();
                match slot {
                    FormulaSlot::First => formula1.push_str(&text),
                    FormulaSlot::Second => formula2.push_str(&text),
                    FormulaSlot::None => {}
                }
            }
            Ok(Event::GeneralRef(ref e)) if slot != FormulaSlot::None => {
                let name = String::from_utf8_lossy(e);
                if let Some(c) = resolve_entity(&name) {
                    match slot {
                        FormulaSlot::First => formula1.push(c),
                        FormulaSlot::Second => formula2.push(c),
                        FormulaSlot::None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"formula1" || e.name().as_ref() == b"formula2" => {
                slot = FormulaSlot::None;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"dataValidation" => {
                in_data_validation = false;
                push_validation(&mut validations, &current_attrs, &formula1, &formula2);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IoError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(validations)
}

fn push_validation(
    validations: &mut Vec<ImportedValidation>,
    attrs: &HashMap<String, String>,
    formula1: &str,
    formula2: &str,
) {
    let Some(sqref) = attrs.get("sqref") else {
        return;
    };
    let Some(constraint) = parse_single_validation(attrs, formula1.trim(), formula2.trim()) else {
        return;
    };
    // sqref can hold several space-separated ranges
    for range in sqref.split_whitespace().filter_map(parse_range_ref) {
        validations.push(ImportedValidation {
            range,
            constraint: constraint.clone(),
        });
    }
}

/// Parse a single <dataValidation> element into a Constraint
fn parse_single_validation(
    attrs: &HashMap<String, String>,
    formula1: &str,
    formula2: &str,
) -> Option<Constraint> {
    let validation_type = attrs.get("type").map(|s| s.as_str()).unwrap_or("none");

    let kind = match validation_type {
        "list" => ConstraintKind::List(parse_list_source(formula1)?),
        "whole" => ConstraintKind::WholeNumber(parse_bounds(attrs, formula1, formula2, parse_number)?),
        "decimal" => ConstraintKind::Decimal(parse_bounds(attrs, formula1, formula2, parse_number)?),
        "date" => ConstraintKind::Date(parse_bounds(attrs, formula1, formula2, parse_serial_date)?),
        "custom" if !formula1.is_empty() => ConstraintKind::Custom(formula1.to_string()),
        // "none", "time", "textLength" or unknown
        _ => return None,
    };

    // allowBlank: "1" = true, "0" or absent = false
    let ignore_blank = attrs.get("allowBlank").map(|v| v == "1").unwrap_or(false);
    let mut constraint = Constraint::new(kind).with_ignore_blank(ignore_blank);

    let title = attrs.get("errorTitle").map(|t| unescape_attr(t)).unwrap_or_default();
    let message = attrs.get("error").map(|m| unescape_attr(m)).unwrap_or_default();
    if !title.is_empty() || !message.is_empty() {
        constraint.error_alert = Some(ErrorAlert { title, message });
    }

    Some(constraint)
}

/// Parse list source from formula1
pub fn parse_list_source(formula1: &str) -> Option<ListSource> {
    let formula1 = formula1.trim().trim_start_matches('=');

    if formula1.is_empty() {
        return None;
    }

    // Inline list: "Yes,No,Maybe" with embedded quotes doubled
    if formula1.len() >= 2 && formula1.starts_with('"') && formula1.ends_with('"') {
        let inner = formula1[1..formula1.len() - 1].replace("\"\"", "\"");
        let items: Vec<String> = inner.split(',').map(String::from).collect();
        return Some(ListSource::Inline(items));
    }

    // Range reference: Sheet2!$B$1:$B$20, $A$1:$A$10
    if !formula1.contains('(') && parse_range_ref(formula1).is_some() {
        return Some(ListSource::Range(formula1.to_string()));
    }

    // Named range or a formula such as INDIRECT(...)
    Some(ListSource::Formula(formula1.to_string()))
}

/// Parse operator and operands; a missing operator means "between".
fn parse_bounds<T>(
    attrs: &HashMap<String, String>,
    formula1: &str,
    formula2: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<Bounds<T>> {
    let operator = parse_operator(attrs.get("operator").map(|s| s.as_str()))?;
    let value1 = parse(formula1)?;
    let value2 = if matches!(operator, ComparisonOperator::Between | ComparisonOperator::NotBetween) {
        Some(parse(formula2)?)
    } else {
        None
    };

    Some(Bounds {
        operator,
        value1,
        value2,
    })
}

/// Parse comparison operator from Excel attribute
fn parse_operator(op: Option<&str>) -> Option<ComparisonOperator> {
    Some(match op.unwrap_or("between") {
        "between" => ComparisonOperator::Between,
        "notBetween" => ComparisonOperator::NotBetween,
        "equal" => ComparisonOperator::EqualTo,
        "notEqual" => ComparisonOperator::NotEqualTo,
        "greaterThan" => ComparisonOperator::GreaterThan,
        "lessThan" => ComparisonOperator::LessThan,
        "greaterThanOrEqual" => ComparisonOperator::GreaterThanOrEqual,
        "lessThanOrEqual" => ComparisonOperator::LessThanOrEqual,
        _ => return None,
    })
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Convert a 1900-system serial day number to a date.
///
/// Serials up to 60 sit before Excel's phantom 1900-02-29 and count from
/// 1899-12-31; later serials count from 1899-12-30.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as i64;
    let base = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_signed(Duration::days(days))
}

fn parse_serial_date(value: &str) -> Option<NaiveDate> {
    serial_to_date(parse_number(value)?)
}

/// Parse <definedName> elements from workbook XML.
fn parse_defined_names_from_xml(xml: &str) -> Result<Vec<DefinedName>, IoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut names = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"definedName" => {
                let attrs = attributes(e);
                // Skip built-in names such as _xlnm._FilterDatabase
                current = attrs
                    .get("name")
                    .filter(|n| !n.starts_with("_xlnm."))
                    .map(|n| (unescape_attr(n), String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&e.decode().unwrap_or_default());
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some((_, text)) = current.as_mut() {
                    if let Some(c) = resolve_entity(&String::from_utf8_lossy(e)) {
                        text.push(c);
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"definedName" => {
                if let Some((name, range)) = current.take() {
                    names.push(DefinedName {
                        name,
                        range: range.trim().trim_start_matches('=').to_string(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IoError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_sources() {
        assert_eq!(
            parse_list_source("\"open,closed\""),
            Some(ListSource::Inline(vec!["open".into(), "closed".into()]))
        );
        assert_eq!(
            parse_list_source("\"say \"\"hi\"\",bye\""),
            Some(ListSource::Inline(vec!["say \"hi\"".into(), "bye".into()]))
        );
        assert_eq!(
            parse_list_source("Sets!$A$2:$A$40"),
            Some(ListSource::Range("Sets!$A$2:$A$40".into()))
        );
        assert_eq!(
            parse_list_source("INDIRECT(\"city_\"&$B2)"),
            Some(ListSource::Formula("INDIRECT(\"city_\"&$B2)".into()))
        );
        assert_eq!(
            parse_list_source("StatusOptions"),
            Some(ListSource::Formula("StatusOptions".into()))
        );
        assert_eq!(parse_list_source(""), None);
    }

    #[test]
    fn test_parse_validations_from_xml() {
        let xml = r#"<worksheet><dataValidations count="3">
<dataValidation type="list" allowBlank="1" showErrorMessage="1" errorTitle="Invalid value" error="status : one of open, closed" sqref="A2:A1048576"><formula1>"open,closed"</formula1></dataValidation>
<dataValidation type="whole" operator="between" sqref="B2:B1048576"><formula1>0</formula1><formula2>120</formula2></dataValidation>
<dataValidation type="list" sqref="C2:C1048576"><formula1>INDIRECT("city_"&amp;SUBSTITUTE(SUBSTITUTE($B2," ","_"),"-","_"))</formula1></dataValidation>
<dataValidation type="textLength" operator="lessThan" sqref="D2"><formula1>10</formula1></dataValidation>
</dataValidations></worksheet>"#;
        let validations = parse_validations_from_xml(xml).unwrap();
        assert_eq!(validations.len(), 3);

        let status = &validations[0];
        assert!(status.covers_column(0));
        assert_eq!((status.range.first_row, status.range.last_row), (1, 1_048_575));
        assert!(status.constraint.ignore_blank);
        assert_eq!(
            status.constraint.error_alert.as_ref().map(|a| a.title.as_str()),
            Some("Invalid value")
        );

        assert_eq!(
            validations[1].constraint.kind,
            ConstraintKind::WholeNumber(Bounds::between(0.0, 120.0))
        );
        assert!(!validations[1].constraint.ignore_blank);

        assert_eq!(
            validations[2].constraint.kind,
            ConstraintKind::List(ListSource::Formula(
                "INDIRECT(\"city_\"&SUBSTITUTE(SUBSTITUTE($B2,\" \",\"_\"),\"-\",\"_\"))".into()
            ))
        );
    }

    #[test]
    fn test_parse_defined_names() {
        let xml = r#"<workbook><definedNames>
<definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Data!$A$1:$B$3</definedName>
<definedName name="city_France">Sets!$A$2:$A$4</definedName>
<definedName name="city_New_Zealand">Sets!$A$5:$A$6</definedName>
</definedNames></workbook>"#;
        let names = parse_defined_names_from_xml(xml).unwrap();
        assert_eq!(
            names,
            vec![
                DefinedName {
                    name: "city_France".into(),
                    range: "Sets!$A$2:$A$4".into()
                },
                DefinedName {
                    name: "city_New_Zealand".into(),
                    range: "Sets!$A$5:$A$6".into()
                },
            ]
        );
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(serial_to_date(1.0), NaiveDate::from_ymd_opt(1900, 1, 1));
        assert_eq!(serial_to_date(59.0), NaiveDate::from_ymd_opt(1900, 2, 28));
        assert_eq!(serial_to_date(61.0), NaiveDate::from_ymd_opt(1900, 3, 1));
        assert_eq!(serial_to_date(43831.0), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(serial_to_date(0.0), None);
    }

    #[test]
    fn test_unescape_attr() {
        assert_eq!(unescape_attr("a &amp; b &quot;c&quot;"), "a & b \"c\"");
        assert_eq!(unescape_attr("&#233;t&#xE9;"), "été");
        assert_eq!(unescape_attr("AT&T"), "AT&T");
    }

    #[test]
    fn test_constraint_to_xlsx_bounded_kinds() {
        let whole = Constraint::new(ConstraintKind::WholeNumber(Bounds::between(0.0, 120.0)));
        let decimal = Constraint::new(ConstraintKind::Decimal(Bounds::at_least(-1.5)));
        let date = Constraint::new(ConstraintKind::Date(Bounds::between(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )))
        .with_error_alert("Invalid value", "collected : Date between 2020-01-01 and 2024-12-31");
        for constraint in [whole, decimal, date] {
            assert!(constraint_to_xlsx(&constraint).is_ok(), "{constraint:?}");
        }
    }

    #[test]
    fn test_constraint_to_xlsx_accepts_full_inline_list() {
        let values: Vec<String> = vec!["a".repeat(127), "b".repeat(128)];
        let constraint = Constraint::list(ListSource::Inline(values));
        assert!(constraint_to_xlsx(&constraint).is_ok());
    }
}
