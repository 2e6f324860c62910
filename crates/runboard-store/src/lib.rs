//! Runboard Store
//!
//! Shared mutable state of the engine: canonical classification results and
//! the run history derived from them.
//!
//! # Overview
//!
//! - **ResultStore**: results keyed by id with secondary indices by run,
//!   document and (scheme, document)
//! - **RunLedger**: run history items, renames and per-workspace favorites
//! - **sort_runs / search_runs**: pure helpers over history items
//!
//! # Example
//!
//! ```rust
//! use runboard_scheme::{ClassificationResult, DocumentId, ResultId, RunId, SchemeId};
//! use runboard_store::ResultStore;
//! use serde_json::json;
//!
//! let store = ResultStore::new();
//! let run = RunId::generate();
//! store.ingest(ClassificationResult::new(
//!     ResultId(1),
//!     DocumentId(7),
//!     SchemeId(2),
//!     run,
//!     json!(0.8),
//! ));
//!
//! assert_eq!(store.by_run(run).len(), 1);
//! assert_eq!(store.by_document(DocumentId(7))[0].id, ResultId(1));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod ledger;
pub mod store;

// Re-exports
pub use error::LedgerError;
pub use ledger::{
    format_run_timestamp, search_runs, sort_runs, LedgerSnapshot, RunHistoryItem, RunLedger,
    RunSortKey, SortOrder,
};
pub use store::ResultStore;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for store operations
    pub use crate::{LedgerError, ResultStore, RunHistoryItem, RunLedger};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
