//! Classification scheme type model
//!
//! A scheme is an ordered list of fields, but only the first field is
//! semantically active. The wire names of [`FieldType`] follow the backend
//! (`int`, `str`, `List[str]`, `List[Dict[str, any]]`).

use crate::ids::SchemeId;
use serde::{Deserialize, Serialize};

/// Declared type of a scheme field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Numeric value, optionally bounded by a scale
    #[serde(rename = "int", alias = "Number")]
    Number,
    /// Free text
    #[serde(rename = "str", alias = "Text")]
    Text,
    /// List of strings, optionally a set of labels
    #[serde(rename = "List[str]", alias = "TextList")]
    TextList,
    /// List of entity/statement records
    #[serde(rename = "List[Dict[str, any]]", alias = "EntityStatementList")]
    EntityStatementList,
}

/// Resolved semantic kind of a field
///
/// Derived from [`FieldType`] plus the field configuration: a `Number` bounded
/// by exactly `[0, 1]` is [`FieldKind::Binary`], a `TextList` flagged as a set
/// of labels is [`FieldKind::LabelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Continuous number
    Number,
    /// Binary sentiment (`> 0.5` is positive)
    Binary,
    /// Free text
    Text,
    /// Plain list of strings
    TextList,
    /// List of labels drawn from an ordered label set
    LabelSet,
    /// Entity/statement records
    EntityStatementList,
}

/// Declared sub-field of a structured record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictKey {
    /// Sub-field name
    pub name: String,
    /// Declared primitive type (`str`, `int`, `float`, `bool`)
    #[serde(rename = "type")]
    pub key_type: String,
}

/// A field of a classification scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Description shown to the classifier
    #[serde(default)]
    pub description: String,
    /// Lower scale bound
    #[serde(default)]
    pub scale_min: Option<f64>,
    /// Upper scale bound
    #[serde(default)]
    pub scale_max: Option<f64>,
    /// Whether a `TextList` is restricted to `labels`
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_set_of_labels: bool,
    /// Ordered label set
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<String>,
    /// Declared record sub-fields
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dict_keys: Vec<DictKey>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Field {
    /// Create a field of the given type with no configuration
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: String::new(),
            scale_min: None,
            scale_max: None,
            is_set_of_labels: false,
            labels: Vec::new(),
            dict_keys: Vec::new(),
        }
    }

    /// Numeric field
    #[inline]
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Binary sentiment field (`Number` bounded by `[0, 1]`)
    #[inline]
    #[must_use]
    pub fn binary(name: impl Into<String>) -> Self {
        Self::number(name).with_scale(0.0, 1.0)
    }

    /// Text field
    #[inline]
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Plain list-of-strings field
    #[inline]
    #[must_use]
    pub fn text_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::TextList)
    }

    /// Label set field
    #[must_use]
    pub fn label_set<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::new(name, FieldType::TextList);
        field.is_set_of_labels = true;
        field.labels = labels.into_iter().map(Into::into).collect();
        field
    }

    /// Entity/statement list field
    #[inline]
    #[must_use]
    pub fn entity_statements(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::EntityStatementList)
    }

    /// With scale bounds
    #[inline]
    #[must_use]
    pub fn with_scale(mut self, min: f64, max: f64) -> Self {
        self.scale_min = Some(min);
        self.scale_max = Some(max);
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this is a binary sentiment field
    #[inline]
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_binary(&self) -> bool {
        self.field_type == FieldType::Number
            && self.scale_min == Some(0.0)
            && self.scale_max == Some(1.0)
    }

    /// Resolved semantic kind
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.field_type {
            FieldType::Number if self.is_binary() => FieldKind::Binary,
            FieldType::Number => FieldKind::Number,
            FieldType::Text => FieldKind::Text,
            FieldType::TextList if self.is_set_of_labels && !self.labels.is_empty() => {
                FieldKind::LabelSet
            }
            FieldType::TextList => FieldKind::TextList,
            FieldType::EntityStatementList => FieldKind::EntityStatementList,
        }
    }

    /// Advisory scale bounds for display
    ///
    /// Binary fields have no annotation; their bounds change interpretation
    /// instead.
    #[must_use]
    pub fn scale_annotation(&self) -> Option<(f64, f64)> {
        if self.kind() != FieldKind::Number {
            return None;
        }
        match (self.scale_min, self.scale_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// Human-readable description of the field type
    #[must_use]
    pub fn type_description(&self) -> String {
        match self.kind() {
            FieldKind::Binary => "Yes/No".to_string(),
            FieldKind::Number => match self.scale_annotation() {
                Some((min, max)) => format!("Scale ({min} to {max})"),
                None => "Number".to_string(),
            },
            FieldKind::Text => "Text".to_string(),
            FieldKind::TextList => "List of Strings".to_string(),
            FieldKind::LabelSet => format!("Multiple Choice ({} options)", self.labels.len()),
            FieldKind::EntityStatementList => "Complex Structure".to_string(),
        }
    }
}

/// A classification scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScheme {
    /// Scheme ID
    pub id: SchemeId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Ordered fields; only the first is active
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Extra instructions passed to the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_instructions: Option<String>,
}

impl ClassificationScheme {
    /// Create scheme without fields
    #[must_use]
    pub fn new(id: SchemeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
            model_instructions: None,
        }
    }

    /// Append a field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The field that drives interpretation (first field wins)
    #[inline]
    #[must_use]
    pub fn active_field(&self) -> Option<&Field> {
        self.fields.first()
    }

    /// Kind of the active field
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<FieldKind> {
        self.active_field().map(Field::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_one_scale_is_binary() {
        assert_eq!(Field::binary("positive").kind(), FieldKind::Binary);
        assert_eq!(
            Field::number("score").with_scale(0.0, 10.0).kind(),
            FieldKind::Number
        );
        assert_eq!(Field::number("score").kind(), FieldKind::Number);
    }

    #[test]
    fn label_flag_without_labels_is_plain_list() {
        let mut field = Field::text_list("tags");
        field.is_set_of_labels = true;
        assert_eq!(field.kind(), FieldKind::TextList);

        let field = Field::label_set("level", ["Low", "High"]);
        assert_eq!(field.kind(), FieldKind::LabelSet);
    }

    #[test]
    fn only_non_binary_numbers_carry_scale_annotation() {
        assert_eq!(Field::binary("b").scale_annotation(), None);
        assert_eq!(
            Field::number("n").with_scale(1.0, 5.0).scale_annotation(),
            Some((1.0, 5.0))
        );
    }

    #[test]
    fn type_descriptions() {
        assert_eq!(Field::binary("b").type_description(), "Yes/No");
        assert_eq!(
            Field::number("n").with_scale(1.0, 10.0).type_description(),
            "Scale (1 to 10)"
        );
        assert_eq!(
            Field::label_set("l", ["a", "b", "c"]).type_description(),
            "Multiple Choice (3 options)"
        );
        assert_eq!(
            Field::entity_statements("e").type_description(),
            "Complex Structure"
        );
    }

    #[test]
    fn deserializes_backend_shape() {
        let scheme: ClassificationScheme = serde_json::from_value(json!({
            "id": 7,
            "name": "Urgency",
            "description": "How urgent",
            "fields": [{
                "name": "level",
                "type": "List[str]",
                "description": "",
                "scale_min": null,
                "scale_max": null,
                "is_set_of_labels": true,
                "labels": ["Low", "Medium", "High"],
                "dict_keys": null
            }]
        }))
        .unwrap();

        assert_eq!(scheme.id, SchemeId(7));
        assert_eq!(scheme.kind(), Some(FieldKind::LabelSet));
        assert_eq!(scheme.active_field().unwrap().labels.len(), 3);
    }

    #[test]
    fn first_field_wins() {
        let scheme = ClassificationScheme::new(SchemeId(1), "Mixed")
            .with_field(Field::text("summary"))
            .with_field(Field::number("score"));
        assert_eq!(scheme.kind(), Some(FieldKind::Text));
    }
}
