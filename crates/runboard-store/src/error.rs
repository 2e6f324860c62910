//! Error types for the run history ledger

use runboard_scheme::RunId;

/// Ledger operation errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No history item for this run
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    /// Rename to a blank name
    #[error("run name must not be empty")]
    EmptyName,

    /// Snapshot file could not be read or written
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be (de)serialized
    #[error("ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Check if error refers to an unknown run
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RunNotFound(_))
    }
}
