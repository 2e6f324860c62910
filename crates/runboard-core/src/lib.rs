//! Runboard Core - Run Orchestrator
//!
//! Turns a selection of documents and schemes into a batch of classification
//! jobs sharing one run identity, and keeps the result store and run history
//! in step with what the backend produced.
//!
//! # Components
//!
//! - **RunOrchestrator**: validation, bounded concurrent fan-out, settle-all
//!   collection, delayed read-back and history recording
//! - **ClassificationClient**: the backend calls the engine makes
//! - **EngineConfig**: concurrency, timeouts and read-back settings (TOML)
//! - **telemetry**: `tracing-subscriber` setup for hosts and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use runboard_core::prelude::*;
//! use std::sync::Arc;
//!
//! let orchestrator = RunOrchestrator::new(
//!     EngineConfig::default(),
//!     client,
//!     Arc::new(ResultStore::new()),
//!     Arc::new(RunLedger::new()),
//! );
//! let outcome = orchestrator
//!     .run_classification(workspace, &documents, &schemes, RunMeta::named("Q3 review"), Some(&provider))
//!     .await?;
//! println!("{}", outcome.summary());
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod telemetry;

// Re-exports
pub use client::{ClassificationClient, ClassifyRequest, ProviderConfig};
pub use config::{EngineConfig, ReadBackConfig};
pub use error::{
    BatchFailure, ClientError, ConfigurationError, EngineError, JobFailure, ReadBackFailure,
};
pub use orchestrator::{JobSpec, RunMeta, RunOrchestrator, RunOutcome, RunProgress, RunStatus};

#[cfg(test)]
pub use client::MockClassificationClient;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running classifications
    pub use crate::{
        ClassificationClient, ClassifyRequest, ClientError, EngineConfig, EngineError,
        ProviderConfig, RunMeta, RunOrchestrator, RunOutcome, RunStatus,
    };
    pub use runboard_store::{ResultStore, RunLedger};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
