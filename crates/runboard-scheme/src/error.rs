//! Error types for value decoding
//!
//! A [`FormatError`] never escapes the formatter: callers of
//! [`format_display_value`](crate::format_display_value) always receive a
//! fallback rendering. It is exposed for code that wants to know *why* a raw
//! value could not be interpreted.

use crate::ids::SchemeId;

/// Raw value could not be interpreted for its scheme
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Scheme has no fields, so there is no active field to interpret against
    #[error("scheme {0} has no fields")]
    NoActiveField(SchemeId),

    /// A string looked like embedded JSON but failed to parse
    #[error("embedded JSON could not be parsed: {0}")]
    EmbeddedJson(#[from] serde_json::Error),

    /// Value shape does not fit the field type
    #[error("expected {expected} for field `{field}`, found {found}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Expected shape
        expected: &'static str,
        /// Shape actually found
        found: &'static str,
    },
}

impl FormatError {
    /// Create a type mismatch error
    #[inline]
    pub(crate) fn mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}
