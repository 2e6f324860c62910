//! Runboard Scheme Model
//!
//! Describes classification schemes and how their raw result values are
//! interpreted.
//!
//! # Overview
//!
//! - **Identifiers**: typed ids for documents, schemes, results, workspaces and runs
//! - **ClassificationScheme / Field**: the scheme type model ("first field wins")
//! - **TypedValue**: raw JSON decoded once into a closed variant keyed by field kind
//! - **DisplayValue**: the human-readable rendering produced by the formatter
//!
//! # Example
//!
//! ```rust
//! use runboard_scheme::{format_display_value, ClassificationScheme, Field, SchemeId};
//! use serde_json::json;
//!
//! let scheme = ClassificationScheme::new(SchemeId(1), "Urgency")
//!     .with_field(Field::label_set("level", ["Low", "Medium", "High"]));
//!
//! let display = format_display_value(&json!(1), &scheme).unwrap();
//! assert_eq!(display.to_string(), "Medium");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod ids;
pub mod result;
pub mod scheme;
pub mod value;

// Re-exports
pub use error::FormatError;
pub use format::{flatten_value, format_display_value, render_typed, DisplayValue, Sentiment};
pub use ids::{DocumentId, ResultId, RunId, SchemeId, WorkspaceId};
pub use result::{ClassificationResult, Document};
pub use scheme::{ClassificationScheme, DictKey, Field, FieldKind, FieldType};
pub use value::{decode_value, is_missing, EntityStatement, LabelChoice, TypedValue};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with schemes and results
    pub use crate::{
        format_display_value, ClassificationResult, ClassificationScheme, DisplayValue,
        DocumentId, Field, FieldKind, ResultId, RunId, SchemeId, TypedValue, WorkspaceId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
