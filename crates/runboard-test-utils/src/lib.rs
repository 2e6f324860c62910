//! Testing utilities for the Runboard workspace
//!
//! Shared fixtures and an in-memory classification backend.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use runboard_core::{
    ClassificationClient, ClassifyRequest, ClientError, EngineConfig, ProviderConfig,
};
use runboard_scheme::{
    ClassificationResult, ClassificationScheme, Document, DocumentId, Field, ResultId, RunId,
    SchemeId, WorkspaceId,
};
use runboard_store::ResultStore;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

pub const WORKSPACE: WorkspaceId = WorkspaceId(1);

pub fn binary_scheme(id: i64) -> ClassificationScheme {
    ClassificationScheme::new(SchemeId(id), "Sentiment").with_field(Field::binary("positive"))
}

pub fn label_scheme(id: i64) -> ClassificationScheme {
    ClassificationScheme::new(SchemeId(id), "Priority")
        .with_field(Field::label_set("priority", ["Low", "Medium", "High"]))
}

pub fn entity_scheme(id: i64) -> ClassificationScheme {
    ClassificationScheme::new(SchemeId(id), "Mentions")
        .with_field(Field::entity_statements("mentions"))
}

pub fn score_scheme(id: i64) -> ClassificationScheme {
    ClassificationScheme::new(SchemeId(id), "Score")
        .with_field(Field::number("score").with_scale(0.0, 10.0))
}

pub fn provider_with_key() -> ProviderConfig {
    ProviderConfig::new("openai", "gpt-4o-mini").with_api_key("test-key")
}

/// Engine config with read-back enabled but no delay
pub fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .with_read_back(true, 0)
        .with_job_timeout_secs(5)
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn make_result(
    id: i64,
    document: i64,
    scheme: i64,
    run_id: RunId,
    value: Value,
) -> ClassificationResult {
    ClassificationResult::new(
        ResultId(id),
        DocumentId(document),
        SchemeId(scheme),
        run_id,
        value,
    )
}

pub fn store_with(results: impl IntoIterator<Item = ClassificationResult>) -> ResultStore {
    let store = ResultStore::new();
    store.ingest_all(results);
    store
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: i64,
    results: Vec<ClassificationResult>,
    failing: HashSet<(DocumentId, SchemeId)>,
    values: HashMap<SchemeId, Value>,
    fail_read_back: bool,
    classify_calls: usize,
}

/// In-memory backend that records every result it produces
#[derive(Debug, Default)]
pub struct FakeClassificationClient {
    state: Mutex<FakeState>,
    schemes: Vec<ClassificationScheme>,
    documents: Vec<Document>,
}

impl FakeClassificationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schemes(mut self, schemes: Vec<ClassificationScheme>) -> Self {
        self.schemes = schemes;
        self
    }

    pub fn with_documents(mut self, ids: &[i64]) -> Self {
        self.documents = ids
            .iter()
            .map(|&id| Document::new(DocumentId(id), format!("Document {id}"), at(1, 9)))
            .collect();
        self
    }

    /// Fail every classification of `document` under `scheme`
    pub fn failing_on(self, document: i64, scheme: i64) -> Self {
        self.state
            .lock()
            .failing
            .insert((DocumentId(document), SchemeId(scheme)));
        self
    }

    /// Value returned for every job of `scheme` (default `1`)
    pub fn returning_value(self, scheme: i64, value: Value) -> Self {
        self.state.lock().values.insert(SchemeId(scheme), value);
        self
    }

    pub fn failing_read_back(self) -> Self {
        self.state.lock().fail_read_back = true;
        self
    }

    /// Seed results as if a previous run had been persisted
    pub fn seed(&self, results: impl IntoIterator<Item = ClassificationResult>) {
        let mut state = self.state.lock();
        for result in results {
            state.next_id = state.next_id.max(result.id.0);
            state.results.push(result);
        }
    }

    pub fn classify_calls(&self) -> usize {
        self.state.lock().classify_calls
    }

    pub fn recorded(&self) -> Vec<ClassificationResult> {
        self.state.lock().results.clone()
    }
}

#[async_trait]
impl ClassificationClient for FakeClassificationClient {
    async fn classify_document(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResult, ClientError> {
        let mut state = self.state.lock();
        state.classify_calls += 1;

        if state
            .failing
            .contains(&(request.document_id, request.scheme_id))
        {
            return Err(ClientError::Status {
                status: 502,
                message: format!(
                    "model call failed for document {} / scheme {}",
                    request.document_id, request.scheme_id
                ),
            });
        }

        state.next_id += 1;
        let value = state
            .values
            .get(&request.scheme_id)
            .cloned()
            .unwrap_or_else(|| json!(1));
        let result = ClassificationResult::new(
            ResultId(state.next_id),
            request.document_id,
            request.scheme_id,
            request.run_id,
            value,
        )
        .with_run_meta(request.run_name, request.run_description);
        state.results.push(result.clone());
        Ok(result)
    }

    async fn list_results_by_run(
        &self,
        run_id: RunId,
        _workspace_id: WorkspaceId,
    ) -> Result<Vec<ClassificationResult>, ClientError> {
        let state = self.state.lock();
        if state.fail_read_back {
            return Err(ClientError::Request("backend unavailable".to_string()));
        }
        Ok(state
            .results
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn list_schemes(
        &self,
        _workspace_id: WorkspaceId,
    ) -> Result<Vec<ClassificationScheme>, ClientError> {
        Ok(self.schemes.clone())
    }

    async fn list_documents(
        &self,
        _workspace_id: WorkspaceId,
    ) -> Result<Vec<Document>, ClientError> {
        Ok(self.documents.clone())
    }
}
