//! Runboard Query
//!
//! Read-only views over classification results.
//!
//! # Overview
//!
//! - **FilterEngine**: AND across filters, OR across a document's results
//!   for the filter's scheme, evaluated over display values
//! - **build_series**: per-day chart points in individual or grouped mode
//!
//! Neither component mutates results; both work on snapshots.
//!
//! # Example
//!
//! ```rust
//! use runboard_query::{apply, Filter};
//! use runboard_scheme::{
//!     ClassificationResult, ClassificationScheme, DocumentId, Field, ResultId, RunId, SchemeId,
//! };
//! use serde_json::json;
//!
//! let scheme = ClassificationScheme::new(SchemeId(1), "Score")
//!     .with_field(Field::number("score").with_scale(0.0, 100.0));
//! let run = RunId::generate();
//! let results = vec![
//!     ClassificationResult::new(ResultId(1), DocumentId(1), SchemeId(1), run, json!(20)),
//!     ClassificationResult::new(ResultId(2), DocumentId(2), SchemeId(1), run, json!(80)),
//! ];
//!
//! let matched = apply(&[Filter::range(SchemeId(1), 0.0, 50.0)], &results, &[scheme]);
//! assert_eq!(matched.into_iter().collect::<Vec<_>>(), vec![DocumentId(1)]);
//! ```

#![warn(missing_docs)]

pub mod chart;
pub mod error;
pub mod filter;

// Re-exports
pub use chart::{build_series, ChartMode, ChartPoint, ChartValue, NO_DATA_LABEL};
pub use error::FilterError;
pub use filter::{apply, legal_operators, Filter, FilterEngine, FilterOperator, FilterValue};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for filtering and charting
    pub use crate::{
        build_series, ChartMode, ChartPoint, ChartValue, Filter, FilterEngine, FilterOperator,
        FilterValue,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
