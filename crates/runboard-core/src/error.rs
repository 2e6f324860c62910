//! Error types for the run orchestrator
//!
//! Provides error handling for:
//! - Selection and configuration problems (fatal, raised before dispatch)
//! - Individual job failures (collected, never abort the batch)
//! - Read-back failures (surfaced on the run outcome)
//! - Backend client errors

use runboard_scheme::{DocumentId, RunId, SchemeId};
use runboard_store::LedgerError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Run could not start
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Results of a run could not be read back
    #[error(transparent)]
    ReadBack(#[from] ReadBackFailure),

    /// Backend call failed
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Run history update failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Backend has no results for the run
    #[error("run not found: {0}")]
    RunNotFound(RunId),
}

impl EngineError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(err) => err.is_retryable(),
            Self::ReadBack(failure) => failure.error.is_retryable(),
            Self::Configuration(_) | Self::Ledger(_) | Self::RunNotFound(_) => false,
        }
    }

    /// Check if error was raised before any job was dispatched
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Selection or configuration problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// No documents selected
    #[error("no documents selected")]
    NoDocuments,

    /// No schemes selected
    #[error("no classification schemes selected")]
    NoSchemes,

    /// No model provider configured
    #[error("no model provider selected")]
    NoProvider,

    /// Provider has no API key
    #[error("API key not found for selected provider: {provider}")]
    MissingApiKey {
        /// Provider name
        provider: String,
    },

    /// Engine configuration is invalid or unparsable
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Backend client errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("request failed: {0}")]
    Request(String),

    /// Backend answered with an error status
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Call did not finish in time
    #[error("timed out after {after_secs}s")]
    Timeout {
        /// Configured timeout
        after_secs: u64,
    },

    /// Response could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// One failed classification job
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("document {document_id} / scheme {scheme_id}: {error}")]
pub struct JobFailure {
    /// Document of the failed job
    pub document_id: DocumentId,
    /// Scheme of the failed job
    pub scheme_id: SchemeId,
    /// Cause
    pub error: ClientError,
}

/// Aggregate of the failed jobs of one run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("classified {succeeded} of {total}; {} job(s) failed", .failures.len())]
pub struct BatchFailure {
    /// Run the jobs belonged to
    pub run_id: RunId,
    /// Jobs dispatched
    pub total: usize,
    /// Jobs that succeeded
    pub succeeded: usize,
    /// Failed jobs
    pub failures: Vec<JobFailure>,
}

/// Read-back of a completed run failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("read-back of run {run_id} failed: {error}")]
pub struct ReadBackFailure {
    /// Run being read back
    pub run_id: RunId,
    /// Cause
    pub error: ClientError,
}
