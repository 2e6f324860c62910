//! Property tests for the filter engine

use proptest::prelude::*;
use runboard_query::{apply, Filter};
use runboard_scheme::{
    ClassificationResult, ClassificationScheme, DocumentId, Field, ResultId, RunId, SchemeId,
};
use serde_json::json;
use std::collections::BTreeSet;

const SCORE: SchemeId = SchemeId(1);
const TAGS: SchemeId = SchemeId(2);

fn schemes() -> Vec<ClassificationScheme> {
    vec![
        ClassificationScheme::new(SCORE, "Score")
            .with_field(Field::number("score").with_scale(0.0, 100.0)),
        ClassificationScheme::new(TAGS, "Tags").with_field(Field::text_list("tags")),
    ]
}

fn arb_results() -> impl Strategy<Value = Vec<ClassificationResult>> {
    let run = RunId::generate();
    prop::collection::vec(
        (0i64..20, prop::bool::ANY, 0u32..100, "[a-c]{1,3}"),
        0..40,
    )
    .prop_map(move |rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (doc, is_score, score, tag))| {
                let (scheme, value) = if is_score {
                    (SCORE, json!(score))
                } else {
                    (TAGS, json!([tag]))
                };
                ClassificationResult::new(ResultId(i as i64), DocumentId(doc), scheme, run, value)
            })
            .collect()
    })
}

fn arb_filters() -> impl Strategy<Value = Vec<Filter>> {
    prop::collection::vec(
        prop_oneof![
            (0.0f64..100.0, 0.0f64..100.0).prop_map(|(a, b)| Filter::range(SCORE, a.min(b), a.max(b))),
            "[a-c]{1,2}".prop_map(|t| Filter::contains(TAGS, t)),
            "[a-c]{1,3}".prop_map(|t| Filter::equals(TAGS, t)),
        ],
        0..4,
    )
}

fn all_documents(results: &[ClassificationResult]) -> BTreeSet<DocumentId> {
    results.iter().map(|r| r.document_id).collect()
}

proptest! {
    #[test]
    fn no_filters_is_identity(results in arb_results()) {
        prop_assert_eq!(apply(&[], &results, &schemes()), all_documents(&results));
    }

    #[test]
    fn apply_is_pure_and_idempotent(results in arb_results(), filters in arb_filters()) {
        let before = results.clone();
        let first = apply(&filters, &results, &schemes());
        let second = apply(&filters, &results, &schemes());
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(before, results.clone());
        prop_assert!(first.is_subset(&all_documents(&results)));
    }

    #[test]
    fn documents_without_scheme_results_survive(results in arb_results(), filters in arb_filters()) {
        let matched = apply(&filters, &results, &schemes());
        for document in all_documents(&results) {
            let schemes_present: BTreeSet<SchemeId> = results
                .iter()
                .filter(|r| r.document_id == document)
                .map(|r| r.scheme_id)
                .collect();
            let untouched = filters.iter().all(|f| !schemes_present.contains(&f.scheme_id));
            if untouched {
                prop_assert!(matched.contains(&document));
            }
        }
    }

    #[test]
    fn adding_a_filter_never_widens(results in arb_results(), filters in arb_filters(), extra in arb_filters()) {
        let narrow: Vec<Filter> = filters.iter().chain(extra.iter()).cloned().collect();
        let wide = apply(&filters, &results, &schemes());
        let narrowed = apply(&narrow, &results, &schemes());
        prop_assert!(narrowed.is_subset(&wide));
    }
}
