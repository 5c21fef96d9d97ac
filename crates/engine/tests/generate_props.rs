// Property-based tests for the generated layout.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use cellcheck_engine::constraint::{ConstraintKind, ListSource};
use cellcheck_engine::generate::{fits_inline, DATA_SHEET, SETS_SHEET};
use cellcheck_engine::{CaptureReporter, GenerationEngine, Rule, Template};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/// Distinct values, sometimes short enough to inline, sometimes not.
fn arb_values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,12}", 1..60).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn fixed_set_inline_iff_under_limit(values in arb_values()) {
        let expected_inline =
            values.iter().map(|v| v.len()).sum::<usize>() + values.len() - 1 <= 256;
        prop_assert_eq!(fits_inline(&values), expected_inline);

        let template = Template::builder()
            .column("field", Rule::fixed_set(values.clone()))
            .build()
            .unwrap();
        let draft = GenerationEngine::new(&template)
            .build(&CaptureReporter::new())
            .unwrap();

        let constraint = &draft
            .sheet_by_name(DATA_SHEET)
            .unwrap()
            .validation_for(0)
            .unwrap()
            .constraint;

        match &constraint.kind {
            ConstraintKind::List(ListSource::Inline(inline)) => {
                prop_assert!(expected_inline);
                prop_assert_eq!(inline, &values);
                prop_assert!(draft.sheet_by_name(SETS_SHEET).is_none());
            }
            ConstraintKind::List(ListSource::Range(_)) => {
                prop_assert!(!expected_inline);
                let sets = draft.sheet_by_name(SETS_SHEET).unwrap();
                prop_assert_eq!(sets.used_columns(), 1);
                prop_assert_eq!(sets.column_values(0, 1).len(), values.len());
            }
            other => prop_assert!(false, "unexpected constraint {:?}", other),
        }
    }

    #[test]
    fn sets_columns_follow_template_order(sizes in prop::collection::vec(0usize..3, 1..8)) {
        // 0 = inline set, 1 = oversized set, 2 = free text
        let mut builder = Template::builder();
        let mut expected = Vec::new();
        for (i, kind) in sizes.iter().enumerate() {
            let name = format!("col{i}");
            let rule = match kind {
                0 => Rule::fixed_set(["x", "y"]),
                1 => {
                    expected.push(name.clone());
                    Rule::fixed_set((0..40).map(|n| format!("{name}-value-{n}")))
                }
                _ => Rule::text(),
            };
            builder = builder.column(name, rule);
        }
        let template = builder.build().unwrap();
        let draft = GenerationEngine::new(&template)
            .build(&CaptureReporter::new())
            .unwrap();

        match draft.sheet_by_name(SETS_SHEET) {
            None => prop_assert!(expected.is_empty()),
            Some(sets) => {
                let headers: Vec<String> = (0..sets.used_columns())
                    .map(|c| sets.get(0, c).unwrap_or_default().to_string())
                    .collect();
                prop_assert_eq!(headers, expected);
            }
        }
    }
}
