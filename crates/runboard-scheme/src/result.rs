//! Documents and classification results

use crate::ids::{DocumentId, ResultId, RunId, SchemeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A classified document (opaque beyond what the engine needs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID
    pub id: DocumentId,
    /// Title
    pub title: String,
    /// When the document entered the workspace
    pub insertion_date: DateTime<Utc>,
}

impl Document {
    /// Create document record
    #[inline]
    #[must_use]
    pub fn new(id: DocumentId, title: impl Into<String>, insertion_date: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            insertion_date,
        }
    }
}

/// One classification of one document under one scheme within one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Result ID
    pub id: ResultId,
    /// Classified document
    pub document_id: DocumentId,
    /// Scheme used
    pub scheme_id: SchemeId,
    /// Raw value as returned by the classifier
    pub value: Value,
    /// When the classification was produced
    pub timestamp: DateTime<Utc>,
    /// Run this result belongs to
    pub run_id: RunId,
    /// Run name
    #[serde(default)]
    pub run_name: String,
    /// Run description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_description: Option<String>,
}

impl ClassificationResult {
    /// Create result stamped with the current time and no run metadata
    #[must_use]
    pub fn new(
        id: ResultId,
        document_id: DocumentId,
        scheme_id: SchemeId,
        run_id: RunId,
        value: Value,
    ) -> Self {
        Self {
            id,
            document_id,
            scheme_id,
            value,
            timestamp: Utc::now(),
            run_id,
            run_name: String::new(),
            run_description: None,
        }
    }

    /// With timestamp
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// With run name and description
    #[inline]
    #[must_use]
    pub fn with_run_meta(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        self.run_name = name.into();
        self.run_description = description;
        self
    }

    /// The `(document, scheme, run)` triple this result is live for
    #[inline]
    #[must_use]
    pub fn triple(&self) -> (DocumentId, SchemeId, RunId) {
        (self.document_id, self.scheme_id, self.run_id)
    }
}
