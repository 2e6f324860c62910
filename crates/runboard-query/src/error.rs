//! Error types for filter validation
//!
//! Evaluation itself never fails: malformed filters are vacuously satisfied.
//! [`FilterError`] is reported by [`Filter::validate`](crate::Filter::validate)
//! so hosts can flag a filter before applying it.

use crate::filter::FilterOperator;
use runboard_scheme::{FieldKind, SchemeId};

/// Filter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// Filter references a scheme that is not loaded
    #[error("unknown scheme: {0}")]
    UnknownScheme(SchemeId),

    /// Scheme has no fields to filter on
    #[error("scheme {0} has no fields")]
    NoActiveField(SchemeId),

    /// Operator not supported for the field kind
    #[error("operator {operator} is not supported for {kind:?} fields")]
    IllegalOperator {
        /// Requested operator
        operator: FilterOperator,
        /// Kind of the scheme's active field
        kind: FieldKind,
    },

    /// Value shape does not fit the operator
    #[error("operator {operator} cannot take a {found} value")]
    ValueShape {
        /// Requested operator
        operator: FilterOperator,
        /// Shape of the supplied value
        found: &'static str,
    },

    /// Range with min above max
    #[error("invalid range: {min} > {max}")]
    InvalidRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}
