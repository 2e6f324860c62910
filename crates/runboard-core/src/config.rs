//! Engine configuration
//!
//! Loaded from TOML; every key is optional and falls back to its default:
//!
//! ```toml
//! max_concurrent_jobs = 8
//! job_timeout_secs = 300
//! default_run_name_prefix = "Classification Run"
//!
//! [read_back]
//! enabled = true
//! delay_ms = 1000
//! ```

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum jobs in flight (`None` or 0 = unbounded)
    pub max_concurrent_jobs: Option<usize>,
    /// Per-job timeout in seconds
    pub job_timeout_secs: u64,
    /// Post-dispatch read-back
    pub read_back: ReadBackConfig,
    /// Prefix of generated run names
    pub default_run_name_prefix: String,
}

/// Delayed read-back of a run after all jobs settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadBackConfig {
    /// Whether to read the run back at all
    pub enabled: bool,
    /// Delay before reading back, in milliseconds
    pub delay_ms: u64,
}

impl Default for ReadBackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 1000,
        }
    }
}

impl ReadBackConfig {
    /// Delay as a duration
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: Some(8),
            job_timeout_secs: 300,
            read_back: ReadBackConfig::default(),
            default_run_name_prefix: "Classification Run".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max concurrent jobs (`None` or 0 = unbounded)
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_jobs(mut self, max: Option<usize>) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// With per-job timeout
    #[inline]
    #[must_use]
    pub fn with_job_timeout_secs(mut self, secs: u64) -> Self {
        self.job_timeout_secs = secs;
        self
    }

    /// With read-back settings
    #[inline]
    #[must_use]
    pub fn with_read_back(mut self, enabled: bool, delay_ms: u64) -> Self {
        self.read_back = ReadBackConfig { enabled, delay_ms };
        self
    }

    /// With run name prefix
    #[inline]
    #[must_use]
    pub fn with_default_run_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_run_name_prefix = prefix.into();
        self
    }

    /// Per-job timeout as a duration
    #[inline]
    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Effective number of jobs in flight for a batch of `total` jobs
    #[must_use]
    pub fn concurrency_limit(&self, total: usize) -> usize {
        match self.max_concurrent_jobs {
            Some(max) if max > 0 => max.min(total.max(1)),
            _ => total.max(1),
        }
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidConfig`] if the TOML is malformed or the
    /// resulting configuration fails [`validate`](Self::validate)
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(source)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidConfig`] if the file cannot be read or
    /// parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Check invariants
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidConfig`] for a zero job timeout or a
    /// blank run name prefix
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.job_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "job_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.default_run_name_prefix.trim().is_empty() {
            return Err(ConfigurationError::InvalidConfig(
                "default_run_name_prefix must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
