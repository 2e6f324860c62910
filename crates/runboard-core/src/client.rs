//! Classification backend client
//!
//! The engine never talks HTTP itself. Hosts implement
//! [`ClassificationClient`] over whatever transport they use; tests use the
//! generated `MockClassificationClient` or an in-memory fake.

use crate::error::ClientError;
use async_trait::async_trait;
use runboard_scheme::{
    ClassificationResult, ClassificationScheme, Document, DocumentId, RunId, SchemeId, WorkspaceId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model provider selection
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name
    pub provider: String,
    /// Model name
    pub model: String,
    /// API key, if one is stored for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Create provider selection without API key
    #[inline]
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether a non-blank API key is present
    #[inline]
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// One classification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    /// Workspace the document lives in
    pub workspace_id: WorkspaceId,
    /// Document to classify
    pub document_id: DocumentId,
    /// Scheme to classify under
    pub scheme_id: SchemeId,
    /// Run the result belongs to
    pub run_id: RunId,
    /// Run name
    pub run_name: String,
    /// Run description
    pub run_description: Option<String>,
    /// Model provider
    pub provider: ProviderConfig,
}

/// Backend calls made by the engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassificationClient: Send + Sync {
    /// Classify one document under one scheme
    async fn classify_document(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResult, ClientError>;

    /// All results recorded for a run
    async fn list_results_by_run(
        &self,
        run_id: RunId,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<ClassificationResult>, ClientError>;

    /// Schemes of a workspace
    async fn list_schemes(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<ClassificationScheme>, ClientError>;

    /// Documents of a workspace
    async fn list_documents(&self, workspace_id: WorkspaceId) -> Result<Vec<Document>, ClientError>;
}
