//! Generation engine
//!
//! Renders a template as a blank data-entry workbook:
//!
//! - `README`: one rule description per template column, column A.
//! - `Data`: one header per template column, each column carrying the
//!   spreadsheet-native constraint for its rule on rows 2..1048576.
//! - `Ontologies` / `Sets`: created on first use; each consumer gets the next
//!   free column (header in row 1, values from row 2). Columns are handed out
//!   in template order and never reused.
//!
//! Fixed sets small enough for an inline dropdown stay inline. Larger sets and
//! every ontology are written to an auxiliary sheet and referenced by range.
//! Linked sets write one named block per parent value and resolve the block
//! with `INDIRECT` on the parent cell of the same row.

use std::collections::{HashMap, HashSet};

use crate::cell_ref::{col_to_letter, column_range, is_valid_name, name_fragment, MAX_ROW};
use crate::constraint::{
    epoch_date, Bounds, Constraint, ConstraintKind, ListSource, DECIMAL_LIMIT, WHOLE_NUMBER_MAX,
    WHOLE_NUMBER_MIN,
};
use crate::error::GenerateError;
use crate::reporter::Reporter;
use crate::rule::{Rule, RuleKind, ValueList};
use crate::template::Template;
use crate::workbook::{ColumnValidation, WorkbookDraft};

pub const README_SHEET: &str = "README";
pub const DATA_SHEET: &str = "Data";
pub const ONTOLOGY_SHEET: &str = "Ontologies";
pub const SETS_SHEET: &str = "Sets";

/// Maximum length of an inline dropdown list, separators included.
pub const INLINE_LIST_LIMIT: usize = 256;

/// Title of the alert shown when a typed value breaks a column constraint.
pub const ERROR_TITLE: &str = "Invalid value";

/// True if `values` can be written as an inline list: no value contains the
/// `,` separator and the joined text fits within [`INLINE_LIST_LIMIT`].
pub fn fits_inline<S: AsRef<str>>(values: &[S]) -> bool {
    if values.iter().any(|v| v.as_ref().contains(',')) {
        return false;
    }
    let chars: usize = values.iter().map(|v| v.as_ref().chars().count()).sum();
    chars + values.len().saturating_sub(1) <= INLINE_LIST_LIMIT
}

pub struct GenerationEngine<'t> {
    template: &'t Template,
}

impl<'t> GenerationEngine<'t> {
    pub fn new(template: &'t Template) -> Self {
        Self { template }
    }

    /// Lay out the whole workbook in memory.
    pub fn build(&self, reporter: &dyn Reporter) -> Result<WorkbookDraft, GenerateError> {
        let mut layout = Layout::new(self.template);

        for (column, rule) in self.template.columns() {
            layout.readme(&rule.describe(column));

            let data_col = layout.next_data_col;
            layout.write(layout.data, 0, data_col, column);

            if let Some(kind) = rule.render(column, data_col, &mut layout)? {
                reporter.debug(&format!(
                    "Column '{column}' -> {DATA_SHEET}!{}: {}",
                    col_to_letter(data_col),
                    describe_kind(&kind)
                ));
                let constraint = Constraint::new(kind)
                    .with_ignore_blank(rule.empty_ok)
                    .with_error_alert(ERROR_TITLE, &rule.describe(column));
                if let Some(sheet) = layout.draft.sheet_mut(layout.data) {
                    sheet.add_validation(ColumnValidation {
                        col: data_col,
                        first_row: 1,
                        last_row: MAX_ROW,
                        constraint,
                    });
                }
            } else {
                reporter.debug(&format!(
                    "Column '{column}' -> {DATA_SHEET}!{}: no constraint",
                    col_to_letter(data_col)
                ));
            }

            layout.placed.insert(column.to_string(), data_col);
            layout.next_data_col += 1;
        }

        let mut draft = layout.draft;
        draft.autosize();
        reporter.info(&format!(
            "Generated {} column(s) across sheets: {}",
            self.template.len(),
            draft.sheet_names().join(", ")
        ));
        Ok(draft)
    }
}

/// Mutable state of one generation run.
struct Layout<'t> {
    template: &'t Template,
    draft: WorkbookDraft,
    readme: usize,
    data: usize,
    ontologies: Option<usize>,
    sets: Option<usize>,
    readme_row: u32,
    next_data_col: usize,
    next_ontology_col: usize,
    next_set_col: usize,
    /// Data column of every column rendered so far.
    placed: HashMap<String, usize>,
    names: HashSet<String>,
}

impl<'t> Layout<'t> {
    fn new(template: &'t Template) -> Self {
        let mut draft = WorkbookDraft::new();
        let readme = draft.add_sheet(README_SHEET);
        let data = draft.add_sheet(DATA_SHEET);
        Self {
            template,
            draft,
            readme,
            data,
            ontologies: None,
            sets: None,
            readme_row: 0,
            next_data_col: 0,
            next_ontology_col: 0,
            next_set_col: 0,
            placed: HashMap::new(),
            names: HashSet::new(),
        }
    }

    fn write(&mut self, sheet: usize, row: u32, col: usize, value: &str) {
        if let Some(sheet) = self.draft.sheet_mut(sheet) {
            sheet.write(row, col, value);
        }
    }

    fn readme(&mut self, line: &str) {
        let row = self.readme_row;
        self.write(self.readme, row, 0, line);
        self.readme_row += 1;
    }

    fn ontology_sheet(&mut self) -> usize {
        match self.ontologies {
            Some(idx) => idx,
            None => {
                let idx = self.draft.add_sheet(ONTOLOGY_SHEET);
                self.ontologies = Some(idx);
                idx
            }
        }
    }

    fn sets_sheet(&mut self) -> usize {
        match self.sets {
            Some(idx) => idx,
            None => {
                let idx = self.draft.add_sheet(SETS_SHEET);
                self.sets = Some(idx);
                idx
            }
        }
    }

    /// Write `column` as header and `values` below it in the next free
    /// column of `sheet_name`. Returns the range holding the values.
    fn write_list(&mut self, sheet_name: &str, column: &str, values: &ValueList) -> String {
        let (sheet, col) = if sheet_name == ONTOLOGY_SHEET {
            let sheet = self.ontology_sheet();
            let col = self.next_ontology_col;
            self.next_ontology_col += 1;
            (sheet, col)
        } else {
            let sheet = self.sets_sheet();
            let col = self.next_set_col;
            self.next_set_col += 1;
            (sheet, col)
        };

        self.write(sheet, 0, col, column);
        for (i, value) in values.values().iter().enumerate() {
            self.write(sheet, i as u32 + 1, col, value);
        }
        column_range(sheet_name, col, 1, values.len() as u32)
    }

    /// Write one named block per parent value into a fresh Sets column.
    fn write_linked_blocks<'a, I>(
        &mut self,
        column: &str,
        prefix: &str,
        blocks: I,
    ) -> Result<(), GenerateError>
    where
        I: IntoIterator<Item = (&'a String, &'a ValueList)>,
    {
        let sheet = self.sets_sheet();
        let col = self.next_set_col;
        self.next_set_col += 1;

        self.write(sheet, 0, col, column);
        let mut row = 1u32;
        for (parent_value, allowed) in blocks {
            let name = format!("{prefix}_{}", name_fragment(parent_value));
            is_valid_name(&name).map_err(|reason| GenerateError::InvalidRangeName {
                column: column.to_string(),
                name: name.clone(),
                reason,
            })?;
            if !self.names.insert(name.to_lowercase()) {
                return Err(GenerateError::InvalidRangeName {
                    column: column.to_string(),
                    name,
                    reason: "name is already defined".into(),
                });
            }

            let first = row;
            for value in allowed.values() {
                self.write(sheet, row, col, value);
                row += 1;
            }
            if row > first {
                self.draft
                    .define_name(name, column_range(SETS_SHEET, col, first, row - 1));
            }
        }
        Ok(())
    }
}

impl Rule {
    /// Render this rule as a Data-column constraint, writing any value lists
    /// it needs into auxiliary sheets.
    fn render(
        &self,
        column: &str,
        data_col: usize,
        layout: &mut Layout<'_>,
    ) -> Result<Option<ConstraintKind>, GenerateError> {
        let kind = match &self.kind {
            RuleKind::Any | RuleKind::Text | RuleKind::Email | RuleKind::Regex(_) => None,
            RuleKind::Integer { min, max } => Some(ConstraintKind::WholeNumber(Bounds::between(
                min.map_or(WHOLE_NUMBER_MIN, whole_number),
                max.map_or(WHOLE_NUMBER_MAX, whole_number),
            ))),
            RuleKind::Float { min, max } => Some(ConstraintKind::Decimal(Bounds::between(
                min.unwrap_or(-DECIMAL_LIMIT),
                max.unwrap_or(DECIMAL_LIMIT),
            ))),
            RuleKind::Date {
                earliest, latest, ..
            } => {
                let floor = earliest.unwrap_or_else(epoch_date);
                Some(ConstraintKind::Date(match latest {
                    Some(latest) => Bounds::between(floor, *latest),
                    None => Bounds::at_least(floor),
                }))
            }
            RuleKind::Unique { unique_with } => {
                let mut criteria = vec![countif_pair(data_col)];
                for other in unique_with {
                    if let Some(pos) = layout.template.position(other) {
                        criteria.push(countif_pair(pos));
                    }
                }
                let function = if criteria.len() == 1 { "COUNTIF" } else { "COUNTIFS" };
                Some(ConstraintKind::Custom(format!(
                    "{function}({})=1",
                    criteria.join(",")
                )))
            }
            RuleKind::FixedSet(values) => {
                let source = if fits_inline(values.values()) {
                    ListSource::Inline(values.values().to_vec())
                } else {
                    ListSource::Range(layout.write_list(SETS_SHEET, column, values))
                };
                Some(ConstraintKind::List(source))
            }
            RuleKind::Ontology { terms, .. } => Some(ConstraintKind::List(ListSource::Range(
                layout.write_list(ONTOLOGY_SHEET, column, terms),
            ))),
            RuleKind::LinkedSet { parent, values } => {
                let parent_col =
                    *layout
                        .placed
                        .get(parent)
                        .ok_or_else(|| GenerateError::UnplacedParent {
                            column: column.to_string(),
                            parent: parent.clone(),
                        })?;
                let prefix = name_fragment(column);
                layout.write_linked_blocks(column, &prefix, values)?;
                Some(ConstraintKind::List(ListSource::Formula(indirect_formula(
                    &prefix, parent_col,
                ))))
            }
        };
        Ok(kind)
    }
}

/// Whole-number bounds are 32-bit; wider values clamp to the nearest limit.
fn whole_number(value: i64) -> f64 {
    (value as f64).clamp(WHOLE_NUMBER_MIN, WHOLE_NUMBER_MAX)
}

/// `$X$2:$X$1048576,X2` for one COUNTIF(S) criterion.
fn countif_pair(col: usize) -> String {
    let letter = col_to_letter(col);
    format!("${letter}$2:${letter}${},{letter}2", MAX_ROW + 1)
}

/// Formula resolving the named block for the parent value in the same row.
pub fn indirect_formula(prefix: &str, parent_col: usize) -> String {
    format!(
        "INDIRECT(\"{prefix}_\"&SUBSTITUTE(SUBSTITUTE(${}2,\" \",\"_\"),\"-\",\"_\"))",
        col_to_letter(parent_col)
    )
}

fn describe_kind(kind: &ConstraintKind) -> String {
    match kind {
        ConstraintKind::List(ListSource::Inline(values)) => format!("inline list ({} values)", values.len()),
        ConstraintKind::List(ListSource::Range(range)) => format!("list from {range}"),
        ConstraintKind::List(ListSource::Formula(formula)) => format!("list from {formula}"),
        ConstraintKind::WholeNumber(_) => "whole number".into(),
        ConstraintKind::Decimal(_) => "decimal".into(),
        ConstraintKind::Date(_) => "date".into(),
        ConstraintKind::Custom(formula) => format!("custom {formula}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::CaptureReporter;

    fn build(template: &Template) -> WorkbookDraft {
        GenerationEngine::new(template)
            .build(&CaptureReporter::new())
            .unwrap()
    }

    fn constraint(draft: &WorkbookDraft, col: usize) -> Option<&Constraint> {
        draft
            .sheet_by_name(DATA_SHEET)
            .and_then(|s| s.validation_for(col))
            .map(|v| &v.constraint)
    }

    #[test]
    fn test_fits_inline_threshold() {
        assert!(fits_inline(&["a".repeat(256)]));
        assert!(!fits_inline(&["a".repeat(257)]));
        // 2 * 127 + 1 separator = 255, 2 * 128 + 1 = 257
        assert!(fits_inline(&["a".repeat(127), "b".repeat(127)]));
        assert!(!fits_inline(&["a".repeat(128), "b".repeat(128)]));
        assert!(fits_inline::<&str>(&[]));
        assert!(!fits_inline(&["1,5 m", "2 m"]));
    }

    #[test]
    fn test_fixed_set_with_comma_goes_to_sets_sheet() {
        let template = Template::builder()
            .column("depth", Rule::fixed_set(["1,5 m", "2 m"]))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(
            constraint(&draft, 0).unwrap().kind,
            ConstraintKind::List(ListSource::Range("Sets!$A$2:$A$3".into()))
        );
        let sets = draft.sheet_by_name(SETS_SHEET).unwrap();
        assert_eq!(sets.column_values(0, 1), vec!["1,5 m", "2 m"]);
    }

    #[test]
    fn test_readme_and_data_headers() {
        let template = Template::builder()
            .column("id", Rule::unique(vec![]))
            .column("status", Rule::fixed_set(["open", "closed"]))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(draft.sheet_names(), vec![README_SHEET, DATA_SHEET]);
        let readme = draft.sheet_by_name(README_SHEET).unwrap();
        assert_eq!(readme.get(0, 0), Some("id : Unique value"));
        assert_eq!(readme.get(1, 0), Some("status : Allowed values: open, closed"));

        let data = draft.sheet_by_name(DATA_SHEET).unwrap();
        assert_eq!(data.get(0, 0), Some("id"));
        assert_eq!(data.get(0, 1), Some("status"));

        let v = data.validation_for(1).unwrap();
        assert_eq!((v.first_row, v.last_row), (1, MAX_ROW));
        assert_eq!(
            v.constraint.kind,
            ConstraintKind::List(ListSource::Inline(vec!["open".into(), "closed".into()]))
        );
        assert_eq!(
            constraint(&draft, 0).unwrap().kind,
            ConstraintKind::Custom("COUNTIF($A$2:$A$1048576,A2)=1".into())
        );
    }

    #[test]
    fn test_large_set_goes_to_sets_sheet() {
        let values: Vec<String> = (0..100).map(|i| format!("value-{i:03}")).collect();
        let template = Template::builder()
            .column("small", Rule::fixed_set(["a", "b"]))
            .column("big", Rule::fixed_set(values.clone()))
            .column("bigger", Rule::fixed_set(values.clone()))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(draft.sheet_names(), vec![README_SHEET, DATA_SHEET, SETS_SHEET]);
        let sets = draft.sheet_by_name(SETS_SHEET).unwrap();
        assert_eq!(sets.get(0, 0), Some("big"));
        assert_eq!(sets.get(0, 1), Some("bigger"));
        assert_eq!(sets.column_values(0, 1).len(), 100);
        assert_eq!(sets.used_columns(), 2);

        assert_eq!(
            constraint(&draft, 1).unwrap().kind,
            ConstraintKind::List(ListSource::Range("Sets!$A$2:$A$101".into()))
        );
        assert_eq!(
            constraint(&draft, 2).unwrap().kind,
            ConstraintKind::List(ListSource::Range("Sets!$B$2:$B$101".into()))
        );
    }

    #[test]
    fn test_ontology_sheet_created_lazily_in_first_use_order() {
        let values: Vec<String> = (0..60).map(|i| format!("long value {i}")).collect();
        let template = Template::builder()
            .column("species", Rule::ontology("NCBITaxon", ["Homo sapiens", "Mus musculus"]))
            .column("big", Rule::fixed_set(values))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(
            draft.sheet_names(),
            vec![README_SHEET, DATA_SHEET, ONTOLOGY_SHEET, SETS_SHEET]
        );
        let ontologies = draft.sheet_by_name(ONTOLOGY_SHEET).unwrap();
        assert_eq!(ontologies.get(0, 0), Some("species"));
        assert_eq!(ontologies.column_values(0, 1), vec!["Homo sapiens", "Mus musculus"]);
        assert_eq!(
            constraint(&draft, 0).unwrap().kind,
            ConstraintKind::List(ListSource::Range("Ontologies!$A$2:$A$3".into()))
        );
    }

    #[test]
    fn test_linked_set_named_blocks() {
        let template = Template::builder()
            .column("id", Rule::any())
            .column("country", Rule::fixed_set(["France", "New Zealand"]))
            .column(
                "city",
                Rule::linked_set(
                    "country",
                    [
                        ("New Zealand", vec!["Auckland", "Wellington"]),
                        ("France", vec!["Paris", "Lyon", "Nice"]),
                    ],
                ),
            )
            .build()
            .unwrap();
        let draft = build(&template);

        let sets = draft.sheet_by_name(SETS_SHEET).unwrap();
        assert_eq!(sets.get(0, 0), Some("city"));
        // Blocks are sorted by parent value.
        assert_eq!(
            sets.column_values(0, 1),
            vec!["Paris", "Lyon", "Nice", "Auckland", "Wellington"]
        );
        assert_eq!(draft.defined_name("city_France").unwrap().range, "Sets!$A$2:$A$4");
        assert_eq!(draft.defined_name("city_New_Zealand").unwrap().range, "Sets!$A$5:$A$6");

        assert_eq!(
            constraint(&draft, 2).unwrap().kind,
            ConstraintKind::List(ListSource::Formula(
                "INDIRECT(\"city_\"&SUBSTITUTE(SUBSTITUTE($B2,\" \",\"_\"),\"-\",\"_\"))".into()
            ))
        );
    }

    #[test]
    fn test_linked_set_invalid_name() {
        let template = Template::builder()
            .column("country", Rule::any())
            .column("city", Rule::linked_set("country", [("(none)", vec!["x"])]))
            .build()
            .unwrap();
        let err = GenerationEngine::new(&template)
            .build(&CaptureReporter::new())
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRangeName { name, .. } if name == "city_(none)"));
    }

    #[test]
    fn test_linked_set_colliding_names() {
        let template = Template::builder()
            .column("country", Rule::any())
            .column(
                "city",
                Rule::linked_set("country", [("Saint Denis", vec!["a"]), ("Saint-Denis", vec!["b"])]),
            )
            .build()
            .unwrap();
        let err = GenerationEngine::new(&template)
            .build(&CaptureReporter::new())
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRangeName { .. }));
    }

    #[test]
    fn test_numeric_and_date_bounds() {
        let template = Template::builder()
            .column("age", Rule::integer(Some(0), None))
            .column("depth", Rule::float(None, Some(10.5)))
            .column("when", Rule::date(None, None))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(
            constraint(&draft, 0).unwrap().kind,
            ConstraintKind::WholeNumber(Bounds::between(0.0, WHOLE_NUMBER_MAX))
        );
        assert_eq!(
            constraint(&draft, 1).unwrap().kind,
            ConstraintKind::Decimal(Bounds::between(-DECIMAL_LIMIT, 10.5))
        );
        assert_eq!(
            constraint(&draft, 2).unwrap().kind,
            ConstraintKind::Date(Bounds::at_least(epoch_date()))
        );
    }

    #[test]
    fn test_integer_bounds_outside_i32_clamp_in_order() {
        let template = Template::builder()
            .column("big", Rule::integer(Some(3_000_000_000), None))
            .column("small", Rule::integer(None, Some(-3_000_000_000)))
            .column("wide", Rule::integer(Some(-5_000_000_000), Some(5_000_000_000)))
            .build()
            .unwrap();
        let draft = build(&template);

        assert_eq!(
            constraint(&draft, 0).unwrap().kind,
            ConstraintKind::WholeNumber(Bounds::between(WHOLE_NUMBER_MAX, WHOLE_NUMBER_MAX))
        );
        assert_eq!(
            constraint(&draft, 1).unwrap().kind,
            ConstraintKind::WholeNumber(Bounds::between(WHOLE_NUMBER_MIN, WHOLE_NUMBER_MIN))
        );
        assert_eq!(
            constraint(&draft, 2).unwrap().kind,
            ConstraintKind::WholeNumber(Bounds::between(WHOLE_NUMBER_MIN, WHOLE_NUMBER_MAX))
        );
    }

    #[test]
    fn test_unique_with_siblings_uses_countifs() {
        let template = Template::builder()
            .column("site", Rule::any())
            .column("id", Rule::unique(vec!["site".into()]))
            .build()
            .unwrap();
        let draft = build(&template);
        assert_eq!(
            constraint(&draft, 1).unwrap().kind,
            ConstraintKind::Custom(
                "COUNTIFS($B$2:$B$1048576,B2,$A$2:$A$1048576,A2)=1".into()
            )
        );
    }

    #[test]
    fn test_constraint_flags_follow_rule() {
        let template = Template::builder()
            .column("status", Rule::fixed_set(["a"]).with_empty_ok(true))
            .column("free", Rule::text())
            .build()
            .unwrap();
        let draft = build(&template);
        let c = constraint(&draft, 0).unwrap();
        assert!(c.ignore_blank);
        assert_eq!(c.error_alert.as_ref().unwrap().title, ERROR_TITLE);
        assert!(constraint(&draft, 1).is_none());
    }

    #[test]
    fn test_column_widths() {
        let template = Template::builder()
            .column("status", Rule::fixed_set(["a"]))
            .build()
            .unwrap();
        let draft = build(&template);
        let data = draft.sheet_by_name(DATA_SHEET).unwrap();
        assert!((data.column_widths()[&0] - 8.0 * 1.2).abs() < 1e-9);
    }
}
