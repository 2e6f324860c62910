//! Typed value decoding
//!
//! Raw result values arrive as loosely shaped JSON. They are decoded exactly
//! once into a [`TypedValue`] selected by the active field's [`FieldKind`];
//! formatting, filtering and charting all match on that closed set instead of
//! re-probing JSON shapes.
//!
//! Decoding rules:
//! - `null`, blank strings, `[]` and `{}` are missing (no data); `0` and
//!   `false` are data
//! - strings starting with `[` or `{` are parsed as embedded JSON first
//! - objects for non-record fields are unwrapped by key: field name, scheme
//!   name, `"value"`, then the sole key of a single-key object

use crate::error::FormatError;
use crate::scheme::{ClassificationScheme, Field, FieldKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Key carrying a free-text summary in record-typed values
pub const DEFAULT_FIELD_KEY: &str = "default_field";

/// One selected label, as the classifier emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelChoice {
    /// Position in the field's label list
    Index(i64),
    /// Label name (matched case-insensitively)
    Name(String),
}

impl LabelChoice {
    /// Map this choice through an ordered label list
    ///
    /// Unmapped values fall back to their raw rendering.
    #[must_use]
    pub fn resolve(&self, labels: &[String]) -> String {
        match self {
            Self::Index(index) => label_at(labels, *index).unwrap_or_else(|| index.to_string()),
            Self::Name(name) => labels
                .iter()
                .find(|label| label.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .or_else(|| {
                    name.trim()
                        .parse::<i64>()
                        .ok()
                        .and_then(|index| label_at(labels, index))
                })
                .unwrap_or_else(|| name.clone()),
        }
    }
}

fn label_at(labels: &[String], index: i64) -> Option<String> {
    usize::try_from(index)
        .ok()
        .and_then(|i| labels.get(i))
        .cloned()
}

/// A single entity/statement record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStatement {
    /// Entity the statement is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Statement text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// Optional sentiment score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    /// Optional per-record summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Any other sub-fields, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EntityStatement {
    /// Record with entity and statement
    #[must_use]
    pub fn new(entity: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            statement: Some(statement.into()),
            ..Self::default()
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Self {
                statement: Some(crate::format::flatten_value(other)),
                ..Self::default()
            },
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut record = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "entity" => record.entity = scalar_text(value),
                "statement" => record.statement = scalar_text(value),
                "summary" => record.summary = scalar_text(value),
                "sentiment" => record.sentiment = to_number(value),
                _ => {
                    record.extra.insert(key.clone(), value.clone());
                }
            }
        }
        record
    }

    /// Display form: `entity: statement`, whichever half is present, or the
    /// flattened extra sub-fields
    #[must_use]
    pub fn display(&self) -> String {
        match (non_blank(&self.entity), non_blank(&self.statement)) {
            (Some(entity), Some(statement)) => format!("{entity}: {statement}"),
            (Some(only), None) | (None, Some(only)) => only.to_string(),
            (None, None) => {
                if let Some(summary) = non_blank(&self.summary) {
                    return summary.to_string();
                }
                let extra: Map<String, Value> = self
                    .extra
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                crate::format::flatten_value(&Value::Object(extra))
            }
        }
    }

    /// Every string-valued sub-field: entity, statement, summary, then extras
    pub fn text_fields(&self) -> impl Iterator<Item = &str> + '_ {
        [&self.entity, &self.statement, &self.summary]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .chain(self.extra.values().filter_map(Value::as_str))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Raw value decoded against its scheme's active field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum TypedValue {
    /// Continuous number
    Number(f64),
    /// Binary sentiment score
    Binary(f64),
    /// Free text
    Text(String),
    /// Plain list of strings
    TextList(Vec<String>),
    /// Label choices, resolved against the field's labels at render time
    LabelSet(Vec<LabelChoice>),
    /// Entity/statement records
    EntityStatements(Vec<EntityStatement>),
    /// Free-text summary (`default_field`) of a record-typed field
    Summary(String),
    /// Object that could not be unwrapped to a field value
    Nested(Value),
}

impl TypedValue {
    /// Numeric payload, if this is a number or binary score
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::Binary(n) => Some(*n),
            _ => None,
        }
    }

    /// Short name of the variant, for logs
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Binary(_) => "binary",
            Self::Text(_) => "text",
            Self::TextList(_) => "text_list",
            Self::LabelSet(_) => "label_set",
            Self::EntityStatements(_) => "entity_statements",
            Self::Summary(_) => "summary",
            Self::Nested(_) => "nested",
        }
    }
}

/// Whether a raw value counts as "no data"
#[must_use]
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Decode a raw value against the scheme's active field
///
/// Returns `Ok(None)` for missing values.
///
/// # Errors
///
/// - [`FormatError::NoActiveField`] if the scheme has no fields
/// - [`FormatError::EmbeddedJson`] if a JSON-looking string fails to parse
/// - [`FormatError::TypeMismatch`] if the value shape does not fit the field
pub fn decode_value(
    raw: &Value,
    scheme: &ClassificationScheme,
) -> Result<Option<TypedValue>, FormatError> {
    let field = scheme
        .active_field()
        .ok_or(FormatError::NoActiveField(scheme.id))?;

    if is_missing(raw) {
        return Ok(None);
    }

    let parsed = parse_embedded(raw)?;
    if is_missing(parsed.as_ref()) {
        return Ok(None);
    }
    let kind = field.kind();

    let value: &Value = match parsed.as_ref() {
        Value::Object(map) if kind != FieldKind::EntityStatementList => {
            match extract_field_value(map, field, scheme) {
                Some(inner) => inner,
                None => return Ok(Some(TypedValue::Nested(Value::Object(map.clone())))),
            }
        }
        other => other,
    };

    if is_missing(value) {
        return Ok(None);
    }

    decode_for_kind(value, field, kind).map(Some)
}

fn parse_embedded(raw: &Value) -> Result<Cow<'_, Value>, FormatError> {
    match raw {
        Value::String(s) => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                Ok(Cow::Owned(serde_json::from_str(trimmed)?))
            } else {
                Ok(Cow::Borrowed(raw))
            }
        }
        _ => Ok(Cow::Borrowed(raw)),
    }
}

fn extract_field_value<'a>(
    map: &'a Map<String, Value>,
    field: &Field,
    scheme: &ClassificationScheme,
) -> Option<&'a Value> {
    map.get(&field.name)
        .or_else(|| map.get(&scheme.name))
        .or_else(|| map.get("value"))
        .or_else(|| {
            if map.len() == 1 {
                map.values().next()
            } else {
                None
            }
        })
}

fn decode_for_kind(value: &Value, field: &Field, kind: FieldKind) -> Result<TypedValue, FormatError> {
    match kind {
        FieldKind::Number => to_number(value)
            .map(TypedValue::Number)
            .ok_or_else(|| FormatError::mismatch(&field.name, "number", shape(value))),
        FieldKind::Binary => to_number(value)
            .map(TypedValue::Binary)
            .ok_or_else(|| FormatError::mismatch(&field.name, "number", shape(value))),
        FieldKind::Text => match value {
            Value::Array(items) => Ok(TypedValue::TextList(string_items(items))),
            Value::Object(_) => Ok(TypedValue::Nested(value.clone())),
            other => Ok(TypedValue::Text(scalar_text(other).unwrap_or_default())),
        },
        FieldKind::TextList => match value {
            Value::Array(items) => Ok(TypedValue::TextList(string_items(items))),
            Value::Object(_) => Ok(TypedValue::Nested(value.clone())),
            other => Ok(TypedValue::TextList(scalar_text(other).into_iter().collect())),
        },
        FieldKind::LabelSet => match value {
            Value::Array(items) => Ok(TypedValue::LabelSet(
                items
                    .iter()
                    .filter(|item| !is_missing(item))
                    .map(label_choice)
                    .collect(),
            )),
            Value::Object(_) => Err(FormatError::mismatch(&field.name, "label list", "object")),
            other => Ok(TypedValue::LabelSet(vec![label_choice(other)])),
        },
        FieldKind::EntityStatementList => match value {
            Value::Array(items) => Ok(TypedValue::EntityStatements(
                items
                    .iter()
                    .filter(|item| !is_missing(item))
                    .map(EntityStatement::from_value)
                    .collect(),
            )),
            Value::Object(map) => {
                if let Some(summary) = map.get(DEFAULT_FIELD_KEY) {
                    Ok(TypedValue::Summary(crate::format::flatten_value(summary)))
                } else if map.contains_key("entity") || map.contains_key("statement") {
                    Ok(TypedValue::EntityStatements(vec![EntityStatement::from_map(map)]))
                } else {
                    Ok(TypedValue::Nested(value.clone()))
                }
            }
            Value::String(s) => Ok(TypedValue::Summary(s.clone())),
            other => Err(FormatError::mismatch(
                &field.name,
                "list of records",
                shape(other),
            )),
        },
    }
}

#[allow(clippy::cast_possible_truncation)]
fn label_choice(value: &Value) -> LabelChoice {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(index) => LabelChoice::Index(index),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => LabelChoice::Index(f as i64),
                _ => LabelChoice::Name(n.to_string()),
            },
        },
        other => LabelChoice::Name(crate::format::flatten_value(other)),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !is_missing(item))
        .map(crate::format::flatten_value)
        .collect()
}

/// Numeric interpretation: numbers, numeric strings, booleans as 1/0
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(crate::format::flatten_value(other)),
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
