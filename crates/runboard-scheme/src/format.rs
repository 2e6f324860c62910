//! Result formatter
//!
//! Produces the single human-readable display value for a raw result. The
//! formatter never fails: decode errors are logged at `debug` and the raw
//! value is rendered as-is.

use crate::scheme::{ClassificationScheme, Field};
use crate::value::{decode_value, is_missing, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Binary sentiment reading of a `[0, 1]` score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// Score above 0.5
    Positive,
    /// Score at or below 0.5
    Negative,
}

impl Sentiment {
    /// Classify a score; exactly 0.5 is negative
    #[inline]
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// Display label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
        }
    }
}

/// Human-readable rendering of a result value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum DisplayValue {
    /// Number, rendered with two decimals
    Number(f64),
    /// Binary sentiment
    Binary(Sentiment),
    /// Plain text (lists joined with `", "`)
    Text(String),
    /// Resolved label(s)
    Label(String),
    /// Recursive `key: value` flattening of a nested object
    Flattened(String),
    /// Free-text summary of a record-typed field
    Summary(String),
}

impl DisplayValue {
    /// Rendered text
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Numeric value, for numeric displays only
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as displayed (rounded to 2 decimals)
    #[must_use]
    pub fn rounded(&self) -> Option<f64> {
        match self {
            Self::Number(n) => format!("{n:.2}").parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.2}"),
            Self::Binary(sentiment) => f.write_str(sentiment.as_str()),
            Self::Text(s) | Self::Label(s) | Self::Flattened(s) | Self::Summary(s) => {
                f.write_str(s)
            }
        }
    }
}

/// Format a raw result value for its scheme
///
/// Returns `None` when the value is missing.
#[must_use]
pub fn format_display_value(raw: &Value, scheme: &ClassificationScheme) -> Option<DisplayValue> {
    match decode_value(raw, scheme) {
        Ok(Some(typed)) => scheme
            .active_field()
            .map(|field| render_typed(&typed, field)),
        Ok(None) => None,
        Err(err) => {
            tracing::debug!(
                scheme_id = %scheme.id,
                error = %err,
                "Falling back to raw display value"
            );
            fallback(raw)
        }
    }
}

/// Render an already decoded value
#[must_use]
pub fn render_typed(typed: &TypedValue, field: &Field) -> DisplayValue {
    match typed {
        TypedValue::Number(n) => DisplayValue::Number(*n),
        TypedValue::Binary(score) => DisplayValue::Binary(Sentiment::from_score(*score)),
        TypedValue::Text(s) => DisplayValue::Text(s.clone()),
        TypedValue::TextList(items) => DisplayValue::Text(items.join(", ")),
        TypedValue::LabelSet(choices) => DisplayValue::Label(
            choices
                .iter()
                .map(|choice| choice.resolve(&field.labels))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        TypedValue::EntityStatements(records) => DisplayValue::Text(
            records
                .iter()
                .map(crate::value::EntityStatement::display)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        TypedValue::Summary(s) => DisplayValue::Summary(s.clone()),
        TypedValue::Nested(value) => DisplayValue::Flattened(flatten_value(value)),
    }
}

fn fallback(raw: &Value) -> Option<DisplayValue> {
    if is_missing(raw) {
        return None;
    }
    Some(match raw {
        Value::Array(_) | Value::Object(_) => DisplayValue::Flattened(flatten_value(raw)),
        other => DisplayValue::Text(flatten_value(other)),
    })
}

/// Flatten any JSON value to text
///
/// Objects become `key: value` pairs joined with `", "`; arrays list their
/// elements the same way.
#[must_use]
pub fn flatten_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", flatten_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SchemeId;
    use serde_json::json;

    fn scheme(field: Field) -> ClassificationScheme {
        ClassificationScheme::new(SchemeId(1), "Test").with_field(field)
    }

    fn display(raw: Value, field: Field) -> Option<String> {
        format_display_value(&raw, &scheme(field)).map(|d| d.to_string())
    }

    #[test]
    fn binary_threshold() {
        assert_eq!(display(json!(0.7), Field::binary("p")).as_deref(), Some("Positive"));
        assert_eq!(display(json!(0.3), Field::binary("p")).as_deref(), Some("Negative"));
        assert_eq!(display(json!(0.5), Field::binary("p")).as_deref(), Some("Negative"));
        assert_eq!(display(json!(false), Field::binary("p")).as_deref(), Some("Negative"));
    }

    #[test]
    fn numbers_use_two_decimals() {
        assert_eq!(display(json!(3), Field::number("n")).as_deref(), Some("3.00"));
        assert_eq!(display(json!("2.456"), Field::number("n")).as_deref(), Some("2.46"));
        assert_eq!(display(json!(0), Field::number("n")).as_deref(), Some("0.00"));
    }

    #[test]
    fn label_index_maps_to_label() {
        let field = Field::label_set("level", ["Low", "Medium", "High"]);
        assert_eq!(display(json!(1), field.clone()).as_deref(), Some("Medium"));
        assert_eq!(display(json!(["low", 2]), field).as_deref(), Some("Low, High"));
    }

    #[test]
    fn text_lists_are_comma_joined() {
        assert_eq!(
            display(json!(["a", "b"]), Field::text_list("tags")).as_deref(),
            Some("a, b")
        );
    }

    #[test]
    fn entity_records_render_as_pairs() {
        let raw = json!([
            {"entity": "NATO", "statement": "expanded membership"},
            {"statement": "no entity"}
        ]);
        assert_eq!(
            display(raw, Field::entity_statements("m")).as_deref(),
            Some("NATO: expanded membership; no entity")
        );
    }

    #[test]
    fn missing_is_none() {
        assert_eq!(display(json!(null), Field::number("n")), None);
        assert_eq!(display(json!(""), Field::text("t")), None);
        assert_eq!(display(json!({"n": null}), Field::number("n")), None);
    }

    #[test]
    fn mismatch_falls_back_to_raw() {
        let value = format_display_value(&json!("high"), &scheme(Field::number("n")));
        assert_eq!(value, Some(DisplayValue::Text("high".into())));
    }

    #[test]
    fn broken_embedded_json_falls_back_to_raw_string() {
        let value = format_display_value(&json!("[oops"), &scheme(Field::text("t")));
        assert_eq!(value, Some(DisplayValue::Text("[oops".into())));
    }

    #[test]
    fn nested_objects_flatten() {
        let value = format_display_value(
            &json!({"a": 1, "b": {"c": "x"}}),
            &scheme(Field::text("t")),
        );
        assert_eq!(value, Some(DisplayValue::Flattened("a: 1, b: c: x".into())));
    }

    #[test]
    fn embedded_empty_object_has_no_display() {
        assert_eq!(format_display_value(&json!("{}"), &scheme(Field::text("t"))), None);
        assert_eq!(format_display_value(&json!("[]"), &scheme(Field::text_list("l"))), None);
    }

    #[test]
    fn rounded_matches_rendered_number() {
        assert_eq!(DisplayValue::Number(50.004).rounded(), Some(50.0));
        assert_eq!(DisplayValue::Number(2.456).rounded(), Some(2.46));
        assert_eq!(DisplayValue::Label("High".into()).rounded(), None);
    }

    #[test]
    fn only_numbers_expose_numeric_value() {
        assert_eq!(DisplayValue::Number(2.0).as_number(), Some(2.0));
        assert_eq!(DisplayValue::Binary(Sentiment::Positive).as_number(), None);
        assert_eq!(DisplayValue::Text("12".into()).as_number(), None);
    }
}
