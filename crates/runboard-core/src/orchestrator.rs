//! Run orchestrator
//!
//! Drives one classification run:
//! 1. Validate the selection (and provider) before anything is dispatched
//! 2. Allocate a fresh run id
//! 3. Fan out `documents x schemes` jobs, bounded and individually timed out
//! 4. Settle all jobs; ingest successes, collect failures
//! 5. Optionally read the run back after a delay
//! 6. Record a run history item if at least one job succeeded
//!
//! Runs cannot be cancelled once dispatched.

use crate::client::{ClassificationClient, ClassifyRequest, ProviderConfig};
use crate::config::EngineConfig;
use crate::error::{
    BatchFailure, ClientError, ConfigurationError, EngineError, JobFailure, ReadBackFailure,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use runboard_scheme::{ClassificationResult, DocumentId, ResultId, RunId, SchemeId, WorkspaceId};
use runboard_store::{ResultStore, RunHistoryItem, RunLedger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Name and description of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Run name (blank = generated)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

impl RunMeta {
    /// Named run
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One job of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Document to classify
    pub document_id: DocumentId,
    /// Scheme to classify under
    pub scheme_id: SchemeId,
    /// Run the job belongs to
    pub run_id: RunId,
    /// Run name
    pub run_name: String,
    /// Run description
    pub run_description: Option<String>,
}

/// Progress report sent after every settled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    /// Run being reported on
    pub run_id: RunId,
    /// Jobs settled so far
    pub completed: usize,
    /// Jobs in the run
    pub total: usize,
    /// Jobs that succeeded so far
    pub succeeded: usize,
    /// Jobs that failed so far
    pub failed: usize,
}

/// Run lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// All jobs settled; results not (yet) confirmed by read-back
    Dispatched,
    /// Results confirmed by read-back
    Loaded,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Run ID
    pub run_id: RunId,
    /// Effective run name
    pub run_name: String,
    /// Lifecycle state
    pub status: RunStatus,
    /// Jobs dispatched
    pub total_jobs: usize,
    /// Results produced by successful jobs
    pub succeeded: Vec<ResultId>,
    /// Failed jobs
    pub failures: Vec<JobFailure>,
    /// Read-back failure, if the read-back was attempted and failed
    pub read_back_error: Option<ReadBackFailure>,
    /// History item recorded for the run
    pub history: Option<RunHistoryItem>,
}

impl RunOutcome {
    /// `"classified N of M"`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("classified {} of {}", self.succeeded.len(), self.total_jobs)
    }

    /// Whether every job succeeded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Aggregate of failed jobs, if any failed
    #[must_use]
    pub fn error_summary(&self) -> Option<BatchFailure> {
        if self.failures.is_empty() {
            return None;
        }
        Some(BatchFailure {
            run_id: self.run_id,
            total: self.total_jobs,
            succeeded: self.succeeded.len(),
            failures: self.failures.clone(),
        })
    }
}

/// Classification run orchestrator
pub struct RunOrchestrator {
    config: EngineConfig,
    client: Arc<dyn ClassificationClient>,
    store: Arc<ResultStore>,
    ledger: Arc<RunLedger>,
    progress: Option<mpsc::Sender<RunProgress>>,
}

impl std::fmt::Debug for RunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("config", &self.config)
            .field("results", &self.store.len())
            .field("runs", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

impl RunOrchestrator {
    /// Create orchestrator over shared store and ledger
    #[must_use]
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn ClassificationClient>,
        store: Arc<ResultStore>,
        ledger: Arc<RunLedger>,
    ) -> Self {
        Self {
            config,
            client,
            store,
            ledger,
            progress: None,
        }
    }

    /// With progress channel
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, sender: mpsc::Sender<RunProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared result store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Shared run ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<RunLedger> {
        &self.ledger
    }

    /// Classify every document under every scheme through the client
    ///
    /// Individual job failures do not fail the call; they are reported on
    /// the outcome. After all jobs settle the run is read back (when
    /// enabled) so the store holds what the backend persisted.
    ///
    /// # Errors
    /// [`EngineError::Configuration`] if the selection, provider or engine
    /// configuration is invalid; nothing is dispatched in that case
    pub async fn run_classification(
        &self,
        workspace_id: WorkspaceId,
        document_ids: &[DocumentId],
        scheme_ids: &[SchemeId],
        meta: RunMeta,
        provider: Option<&ProviderConfig>,
    ) -> Result<RunOutcome, EngineError> {
        self.validate_selection(document_ids, scheme_ids)?;
        let provider = provider.ok_or(ConfigurationError::NoProvider)?;
        if !provider.has_api_key() {
            return Err(ConfigurationError::MissingApiKey {
                provider: provider.provider.clone(),
            }
            .into());
        }

        let client = Arc::clone(&self.client);
        let provider = provider.clone();
        let execute = move |job: JobSpec| {
            let client = Arc::clone(&client);
            let request = ClassifyRequest {
                workspace_id,
                document_id: job.document_id,
                scheme_id: job.scheme_id,
                run_id: job.run_id,
                run_name: job.run_name,
                run_description: job.run_description,
                provider: provider.clone(),
            };
            async move { client.classify_document(request).await }
        };

        let (mut outcome, started_at) = self
            .fan_out(document_ids, scheme_ids, meta.clone(), execute)
            .await;

        if self.config.read_back.enabled {
            self.read_back(workspace_id, &mut outcome).await;
        }

        self.record_history(&mut outcome, &meta, started_at);
        self.log_finished(&outcome);
        Ok(outcome)
    }

    /// Dispatch a run through a caller-supplied job executor
    ///
    /// `execute` is called once per `(document, scheme)` pair. No read-back
    /// is performed; the outcome is [`RunStatus::Dispatched`].
    ///
    /// # Errors
    /// [`EngineError::Configuration`] if no documents or schemes are
    /// selected, or the engine configuration is invalid
    pub async fn dispatch<F, Fut>(
        &self,
        document_ids: &[DocumentId],
        scheme_ids: &[SchemeId],
        meta: RunMeta,
        execute: F,
    ) -> Result<RunOutcome, EngineError>
    where
        F: Fn(JobSpec) -> Fut,
        Fut: Future<Output = Result<ClassificationResult, ClientError>>,
    {
        self.validate_selection(document_ids, scheme_ids)?;

        let (mut outcome, started_at) = self
            .fan_out(document_ids, scheme_ids, meta.clone(), execute)
            .await;

        self.record_history(&mut outcome, &meta, started_at);
        self.log_finished(&outcome);
        Ok(outcome)
    }

    /// Load a historical run from the backend
    ///
    /// Results are ingested; a history item is recorded if the run is new
    /// to the ledger.
    ///
    /// # Errors
    /// - [`EngineError::Client`] if the backend call fails
    /// - [`EngineError::RunNotFound`] if the backend has no results
    pub async fn load_run(
        &self,
        workspace_id: WorkspaceId,
        run_id: RunId,
    ) -> Result<RunHistoryItem, EngineError> {
        let results = self.client.list_results_by_run(run_id, workspace_id).await?;
        let results: Vec<_> = results.into_iter().filter(|r| r.run_id == run_id).collect();
        if results.is_empty() {
            return Err(EngineError::RunNotFound(run_id));
        }

        tracing::debug!(%run_id, count = results.len(), "Loaded run results");
        self.store.ingest_all(results.iter().cloned());

        if let Some(existing) = self.ledger.get(run_id) {
            return Ok(existing);
        }

        let mut item = RunHistoryItem::from_results(run_id, &results)
            .ok_or(EngineError::RunNotFound(run_id))?;
        if item.name.trim().is_empty() {
            item.name = self.default_run_name(item.recorded_at);
        }
        self.ledger.record(item.clone());
        Ok(item)
    }

    /// Derive history items for runs present in `results`
    ///
    /// Returns the runs newly added to the ledger.
    pub fn refresh_history(
        &self,
        workspace_id: WorkspaceId,
        results: &[ClassificationResult],
    ) -> Vec<RunId> {
        let added = self.ledger.record_from_results(results);
        tracing::debug!(
            %workspace_id,
            scanned = results.len(),
            added = added.len(),
            "Refreshed run history"
        );
        added
    }

    fn validate_selection(
        &self,
        document_ids: &[DocumentId],
        scheme_ids: &[SchemeId],
    ) -> Result<(), ConfigurationError> {
        if document_ids.is_empty() {
            return Err(ConfigurationError::NoDocuments);
        }
        if scheme_ids.is_empty() {
            return Err(ConfigurationError::NoSchemes);
        }
        self.config.validate()
    }

    fn allocate_run_id(&self) -> RunId {
        loop {
            let run_id = RunId::generate();
            if !self.ledger.contains(run_id) && !self.store.contains_run(run_id) {
                return run_id;
            }
            tracing::debug!(%run_id, "Run id already known, regenerating");
        }
    }

    fn default_run_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{} - {}",
            self.config.default_run_name_prefix,
            at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        )
    }

    async fn fan_out<F, Fut>(
        &self,
        document_ids: &[DocumentId],
        scheme_ids: &[SchemeId],
        meta: RunMeta,
        execute: F,
    ) -> (RunOutcome, DateTime<Utc>)
    where
        F: Fn(JobSpec) -> Fut,
        Fut: Future<Output = Result<ClassificationResult, ClientError>>,
    {
        let started_at = Utc::now();
        let run_id = self.allocate_run_id();
        let run_name = if meta.name.trim().is_empty() {
            self.default_run_name(started_at)
        } else {
            meta.name.trim().to_string()
        };

        let jobs: Vec<JobSpec> = document_ids
            .iter()
            .flat_map(|&document_id| {
                scheme_ids.iter().map(move |&scheme_id| (document_id, scheme_id))
            })
            .map(|(document_id, scheme_id)| JobSpec {
                document_id,
                scheme_id,
                run_id,
                run_name: run_name.clone(),
                run_description: meta.description.clone(),
            })
            .collect();

        let total = jobs.len();
        let limit = self.config.concurrency_limit(total);
        let timeout = self.config.job_timeout();
        let timeout_secs = self.config.job_timeout_secs;

        tracing::info!(
            %run_id,
            name = %run_name,
            documents = document_ids.len(),
            schemes = scheme_ids.len(),
            jobs = total,
            concurrency = limit,
            "Starting classification run"
        );

        let mut settled = stream::iter(jobs.into_iter().map(|job| {
            let pending = execute(job.clone());
            async move {
                let result = match tokio::time::timeout(timeout, pending).await {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Timeout {
                        after_secs: timeout_secs,
                    }),
                };
                (job, result)
            }
        }))
        .buffer_unordered(limit);

        let mut outcome = RunOutcome {
            run_id,
            run_name: run_name.clone(),
            status: RunStatus::Dispatched,
            total_jobs: total,
            succeeded: Vec::new(),
            failures: Vec::new(),
            read_back_error: None,
            history: None,
        };

        while let Some((job, result)) = settled.next().await {
            match result {
                Ok(mut classified) => {
                    classified.run_id = run_id;
                    classified.run_name = run_name.clone();
                    classified.run_description = meta.description.clone();
                    tracing::debug!(
                        %run_id,
                        document_id = %job.document_id,
                        scheme_id = %job.scheme_id,
                        result_id = %classified.id,
                        "Job succeeded"
                    );
                    outcome.succeeded.push(classified.id);
                    self.store.ingest(classified);
                }
                Err(error) => {
                    tracing::warn!(
                        %run_id,
                        document_id = %job.document_id,
                        scheme_id = %job.scheme_id,
                        %error,
                        "Job failed"
                    );
                    outcome.failures.push(JobFailure {
                        document_id: job.document_id,
                        scheme_id: job.scheme_id,
                        error,
                    });
                }
            }
            self.report_progress(&outcome);
        }

        outcome.failures.sort_by_key(|f| (f.document_id, f.scheme_id));
        (outcome, started_at)
    }

    fn report_progress(&self, outcome: &RunOutcome) {
        let Some(sender) = &self.progress else {
            return;
        };
        let progress = RunProgress {
            run_id: outcome.run_id,
            completed: outcome.succeeded.len() + outcome.failures.len(),
            total: outcome.total_jobs,
            succeeded: outcome.succeeded.len(),
            failed: outcome.failures.len(),
        };
        if sender.try_send(progress).is_err() {
            tracing::trace!(run_id = %outcome.run_id, "Progress update dropped");
        }
    }

    async fn read_back(&self, workspace_id: WorkspaceId, outcome: &mut RunOutcome) {
        tokio::time::sleep(self.config.read_back.delay()).await;

        match self
            .client
            .list_results_by_run(outcome.run_id, workspace_id)
            .await
        {
            Ok(results) => {
                let run_id = outcome.run_id;
                let loaded = self
                    .store
                    .ingest_all(results.into_iter().filter(|r| r.run_id == run_id));
                tracing::debug!(%run_id, new_results = loaded, "Run read back");
                outcome.status = RunStatus::Loaded;
            }
            Err(error) => {
                tracing::warn!(run_id = %outcome.run_id, %error, "Read-back failed");
                outcome.read_back_error = Some(ReadBackFailure {
                    run_id: outcome.run_id,
                    error,
                });
            }
        }
    }

    fn record_history(&self, outcome: &mut RunOutcome, meta: &RunMeta, started_at: DateTime<Utc>) {
        if outcome.succeeded.is_empty() {
            return;
        }

        let results = self.store.by_run(outcome.run_id);
        let documents: BTreeSet<DocumentId> = results.iter().map(|r| r.document_id).collect();
        let schemes: BTreeSet<SchemeId> = results.iter().map(|r| r.scheme_id).collect();

        let item = RunHistoryItem::new(outcome.run_id, outcome.run_name.clone(), started_at)
            .with_counts(documents.len(), schemes.len())
            .with_description(meta.description.clone());
        self.ledger.record(item.clone());
        outcome.history = Some(item);
    }

    fn log_finished(&self, outcome: &RunOutcome) {
        tracing::info!(
            run_id = %outcome.run_id,
            requested = outcome.total_jobs,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failures.len(),
            status = ?outcome.status,
            "Classification run finished: {}",
            outcome.summary()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClassificationClient;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    fn orchestrator(client: MockClassificationClient, config: EngineConfig) -> RunOrchestrator {
        RunOrchestrator::new(
            config,
            Arc::new(client),
            Arc::new(ResultStore::new()),
            Arc::new(RunLedger::new()),
        )
    }

    fn no_read_back() -> EngineConfig {
        EngineConfig::default().with_read_back(false, 0)
    }

    fn provider() -> ProviderConfig {
        ProviderConfig::new("openai", "gpt-4o").with_api_key("key")
    }

    fn echo_result(next_id: &AtomicI64, request: &ClassifyRequest) -> ClassificationResult {
        ClassificationResult::new(
            ResultId(next_id.fetch_add(1, Ordering::SeqCst)),
            request.document_id,
            request.scheme_id,
            request.run_id,
            json!(0.8),
        )
    }

    #[tokio::test]
    async fn validation_happens_before_dispatch() {
        let mut client = MockClassificationClient::new();
        client.expect_classify_document().never();
        let orch = orchestrator(client, no_read_back());

        let err = orch
            .run_classification(WorkspaceId(1), &[], &[SchemeId(1)], RunMeta::default(), Some(&provider()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::NoDocuments)));

        let err = orch
            .run_classification(WorkspaceId(1), &[DocumentId(1)], &[], RunMeta::default(), Some(&provider()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::NoSchemes)));

        let err = orch
            .run_classification(WorkspaceId(1), &[DocumentId(1)], &[SchemeId(1)], RunMeta::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(ConfigurationError::NoProvider)));

        let keyless = ProviderConfig::new("openai", "gpt-4o");
        let err = orch
            .run_classification(WorkspaceId(1), &[DocumentId(1)], &[SchemeId(1)], RunMeta::default(), Some(&keyless))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: API key not found for selected provider: openai"
        );
        assert!(orch.ledger().is_empty());
    }

    #[tokio::test]
    async fn runs_every_pair_and_tags_results() {
        let next_id = Arc::new(AtomicI64::new(1));
        let ids = Arc::clone(&next_id);
        let mut client = MockClassificationClient::new();
        client
            .expect_classify_document()
            .times(6)
            .returning(move |request| Ok(echo_result(&ids, &request)));
        let orch = orchestrator(client, no_read_back());

        let outcome = orch
            .run_classification(
                WorkspaceId(1),
                &[DocumentId(1), DocumentId(2), DocumentId(3)],
                &[SchemeId(10), SchemeId(11)],
                RunMeta::named("Weekly").with_description("routine"),
                Some(&provider()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.summary(), "classified 6 of 6");
        assert!(outcome.is_complete());
        assert_eq!(outcome.status, RunStatus::Dispatched);

        let stored = orch.store().by_run(outcome.run_id);
        assert_eq!(stored.len(), 6);
        assert!(stored.iter().all(|r| r.run_name == "Weekly"));
        assert!(stored.iter().all(|r| r.run_description.as_deref() == Some("routine")));

        let item = orch.ledger().get(outcome.run_id).unwrap();
        assert_eq!((item.document_count, item.scheme_count), (3, 2));
        assert_eq!(outcome.history, Some(item));
    }

    #[tokio::test]
    async fn read_back_marks_run_loaded() {
        let mut client = MockClassificationClient::new();
        client.expect_classify_document().returning(|request| {
            Ok(ClassificationResult::new(
                ResultId(1),
                request.document_id,
                request.scheme_id,
                request.run_id,
                json!(1),
            ))
        });
        client
            .expect_list_results_by_run()
            .times(1)
            .returning(|run_id, _| {
                Ok(vec![ClassificationResult::new(
                    ResultId(1),
                    DocumentId(1),
                    SchemeId(1),
                    run_id,
                    json!(2),
                )])
            });
        let orch = orchestrator(client, EngineConfig::default().with_read_back(true, 0));

        let outcome = orch
            .run_classification(WorkspaceId(1), &[DocumentId(1)], &[SchemeId(1)], RunMeta::named("r"), Some(&provider()))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Loaded);
        assert_eq!(orch.store().get(ResultId(1)).unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn read_back_failure_keeps_run_dispatched() {
        let mut client = MockClassificationClient::new();
        client.expect_classify_document().returning(|request| {
            Ok(ClassificationResult::new(
                ResultId(1),
                request.document_id,
                request.scheme_id,
                request.run_id,
                json!(1),
            ))
        });
        client
            .expect_list_results_by_run()
            .returning(|_, _| Err(ClientError::Request("connection reset".into())));
        let orch = orchestrator(client, EngineConfig::default().with_read_back(true, 0));

        let outcome = orch
            .run_classification(WorkspaceId(1), &[DocumentId(1)], &[SchemeId(1)], RunMeta::named("r"), Some(&provider()))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Dispatched);
        assert!(outcome.read_back_error.is_some());
        assert!(orch.ledger().contains(outcome.run_id));
    }

    #[tokio::test]
    async fn all_jobs_failing_records_no_history() {
        let client = MockClassificationClient::new();
        let orch = orchestrator(client, no_read_back());

        let outcome = orch
            .dispatch(&[DocumentId(1), DocumentId(2)], &[SchemeId(1)], RunMeta::named("x"), |_job| async {
                Err::<ClassificationResult, _>(ClientError::Status {
                    status: 500,
                    message: "boom".into(),
                })
            })
            .await
            .unwrap();

        assert_eq!(outcome.summary(), "classified 0 of 2");
        assert_eq!(outcome.error_summary().unwrap().failures.len(), 2);
        assert!(outcome.history.is_none());
        assert!(orch.ledger().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_jobs_time_out() {
        let client = MockClassificationClient::new();
        let orch = orchestrator(client, no_read_back().with_job_timeout_secs(1));

        let outcome = orch
            .dispatch(&[DocumentId(1)], &[SchemeId(1)], RunMeta::named("slow"), |job| async move {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok(ClassificationResult::new(ResultId(1), job.document_id, job.scheme_id, job.run_id, json!(1)))
            })
            .await
            .unwrap();

        assert_eq!(
            outcome.failures[0].error,
            ClientError::Timeout { after_secs: 1 }
        );
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let client = MockClassificationClient::new();
        let orch = orchestrator(client, no_read_back().with_max_concurrent_jobs(Some(2)));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let next_id = Arc::new(AtomicI64::new(1));

        let documents: Vec<_> = (1..=6).map(DocumentId).collect();
        let outcome = orch
            .dispatch(&documents, &[SchemeId(1)], RunMeta::named("bounded"), |job| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                let next_id = Arc::clone(&next_id);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(ClassificationResult::new(
                        ResultId(next_id.fetch_add(1, Ordering::SeqCst)),
                        job.document_id,
                        job.scheme_id,
                        job.run_id,
                        json!(1),
                    ))
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.succeeded.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn progress_is_reported_per_job() {
        let (tx, mut rx) = mpsc::channel(16);
        let orch = orchestrator(MockClassificationClient::new(), no_read_back()).with_progress(tx);

        let outcome = orch
            .dispatch(&[DocumentId(1), DocumentId(2)], &[SchemeId(1)], RunMeta::named("p"), |job| async move {
                if job.document_id == DocumentId(2) {
                    Err(ClientError::Request("down".into()))
                } else {
                    Ok(ClassificationResult::new(ResultId(1), job.document_id, job.scheme_id, job.run_id, json!(1)))
                }
            })
            .await
            .unwrap();

        let mut reports = Vec::new();
        while let Ok(progress) = rx.try_recv() {
            reports.push(progress);
        }
        assert_eq!(reports.len(), 2);
        let last = reports[1];
        assert_eq!((last.completed, last.total, last.succeeded, last.failed), (2, 2, 1, 1));
        assert_eq!(last.run_id, outcome.run_id);
    }

    #[tokio::test]
    async fn blank_name_gets_generated_default() {
        let orch = orchestrator(MockClassificationClient::new(), no_read_back());
        let outcome = orch
            .dispatch(&[DocumentId(1)], &[SchemeId(1)], RunMeta::named("  "), |job| async move {
                Ok(ClassificationResult::new(ResultId(1), job.document_id, job.scheme_id, job.run_id, json!(1)))
            })
            .await
            .unwrap();
        assert!(outcome.run_name.starts_with("Classification Run - "));
    }

    #[tokio::test]
    async fn load_run_records_unseen_runs_once() {
        let run_id = RunId::generate();
        let mut client = MockClassificationClient::new();
        client.expect_list_results_by_run().times(2).returning(|run_id, _| {
            Ok(vec![
                ClassificationResult::new(ResultId(5), DocumentId(1), SchemeId(1), run_id, json!(1))
                    .with_run_meta("Imported", None),
                ClassificationResult::new(ResultId(6), DocumentId(2), SchemeId(1), run_id, json!(0))
                    .with_run_meta("Imported", None),
            ])
        });
        let orch = orchestrator(client, no_read_back());

        let item = orch.load_run(WorkspaceId(1), run_id).await.unwrap();
        assert_eq!(item.name, "Imported");
        assert_eq!(item.document_count, 2);
        assert_eq!(orch.store().by_run(run_id).len(), 2);

        orch.ledger().rename(run_id, "Kept").unwrap();
        let again = orch.load_run(WorkspaceId(1), run_id).await.unwrap();
        assert_eq!(again.name, "Kept");
        assert_eq!(orch.ledger().len(), 1);
    }

    #[tokio::test]
    async fn load_run_without_results_is_not_found() {
        let mut client = MockClassificationClient::new();
        client.expect_list_results_by_run().returning(|_, _| Ok(Vec::new()));
        let orch = orchestrator(client, no_read_back());

        let run_id = RunId::generate();
        let err = orch.load_run(WorkspaceId(1), run_id).await.unwrap_err();
        assert!(matches!(err, EngineError::RunNotFound(id) if id == run_id));
    }
}
