//! Property tests for binary sentiment formatting

use proptest::prelude::*;
use runboard_scheme::{format_display_value, ClassificationScheme, Field, SchemeId};
use serde_json::json;

fn binary_scheme() -> ClassificationScheme {
    ClassificationScheme::new(SchemeId(1), "Sentiment").with_field(Field::binary("positive"))
}

proptest! {
    #[test]
    fn above_half_is_positive(score in 0.500_001f64..=1.0) {
        let display = format_display_value(&json!(score), &binary_scheme()).unwrap();
        prop_assert_eq!(display.to_string(), "Positive");
    }

    #[test]
    fn half_and_below_is_negative(score in 0.0f64..=0.5) {
        let display = format_display_value(&json!(score), &binary_scheme()).unwrap();
        prop_assert_eq!(display.to_string(), "Negative");
    }

    #[test]
    fn formatting_is_deterministic(score in any::<f64>().prop_filter("finite", |n| n.is_finite())) {
        let scheme = binary_scheme();
        let first = format_display_value(&json!(score), &scheme);
        let second = format_display_value(&json!(score), &scheme);
        prop_assert_eq!(first, second);
    }
}
