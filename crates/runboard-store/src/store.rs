//! Indexed result store
//!
//! Provides [`ResultStore`], the single owner of canonical classification
//! results. Secondary indices are `DashMap`s of id sets; every index hit is
//! re-checked against the primary map, so a concurrent reader never sees a
//! result under an index it has moved away from.

use dashmap::DashMap;
use runboard_scheme::{ClassificationResult, DocumentId, ResultId, RunId, SchemeId};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

/// Thread-safe result store with secondary indices
#[derive(Debug, Default)]
pub struct ResultStore {
    /// Primary map: result id -> result
    results: DashMap<ResultId, ClassificationResult>,

    /// Run -> result ids
    by_run: DashMap<RunId, BTreeSet<ResultId>>,

    /// Document -> result ids
    by_document: DashMap<DocumentId, BTreeSet<ResultId>>,

    /// (scheme, document) -> result ids
    by_scheme_document: DashMap<(SchemeId, DocumentId), BTreeSet<ResultId>>,
}

impl ResultStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a result by id
    ///
    /// Returns the previous result with the same id, if any. When the
    /// replacement belongs to a different run, document or scheme, the id is
    /// moved out of the old indices.
    pub fn ingest(&self, result: ClassificationResult) -> Option<ClassificationResult> {
        let id = result.id;
        let run_id = result.run_id;
        let document_id = result.document_id;
        let scheme_id = result.scheme_id;

        let previous = self.results.insert(id, result);

        index_insert(&self.by_run, run_id, id);
        index_insert(&self.by_document, document_id, id);
        index_insert(&self.by_scheme_document, (scheme_id, document_id), id);

        if let Some(old) = &previous {
            if old.run_id != run_id {
                index_remove(&self.by_run, &old.run_id, id);
            }
            if old.document_id != document_id {
                index_remove(&self.by_document, &old.document_id, id);
            }
            if (old.scheme_id, old.document_id) != (scheme_id, document_id) {
                index_remove(
                    &self.by_scheme_document,
                    &(old.scheme_id, old.document_id),
                    id,
                );
            }
            tracing::trace!(result_id = %id, "Replaced result");
        }

        previous
    }

    /// Ingest many results; returns how many were new ids
    pub fn ingest_all<I>(&self, results: I) -> usize
    where
        I: IntoIterator<Item = ClassificationResult>,
    {
        results
            .into_iter()
            .map(|result| self.ingest(result))
            .filter(Option::is_none)
            .count()
    }

    /// Get result by id
    #[must_use]
    pub fn get(&self, id: ResultId) -> Option<ClassificationResult> {
        self.results.get(&id).map(|entry| entry.value().clone())
    }

    /// All results of a run, sorted by id
    #[must_use]
    pub fn by_run(&self, run_id: RunId) -> Vec<ClassificationResult> {
        self.collect(index_ids(&self.by_run, &run_id), |r| r.run_id == run_id)
    }

    /// All results for a document, sorted by id
    #[must_use]
    pub fn by_document(&self, document_id: DocumentId) -> Vec<ClassificationResult> {
        self.collect(index_ids(&self.by_document, &document_id), |r| {
            r.document_id == document_id
        })
    }

    /// All results for a document under one scheme, sorted by id
    #[must_use]
    pub fn by_scheme_and_document(
        &self,
        scheme_id: SchemeId,
        document_id: DocumentId,
    ) -> Vec<ClassificationResult> {
        self.collect(
            index_ids(&self.by_scheme_document, &(scheme_id, document_id)),
            |r| r.scheme_id == scheme_id && r.document_id == document_id,
        )
    }

    /// Latest result per `(document, scheme)` within a run, sorted by id
    ///
    /// Later timestamps supersede earlier ones; equal timestamps resolve to
    /// the higher id.
    #[must_use]
    pub fn live_results(&self, run_id: RunId) -> Vec<ClassificationResult> {
        let mut latest: BTreeMap<(DocumentId, SchemeId), ClassificationResult> = BTreeMap::new();
        for result in self.by_run(run_id) {
            let key = (result.document_id, result.scheme_id);
            let supersedes = latest
                .get(&key)
                .map_or(true, |current| {
                    (result.timestamp, result.id) >= (current.timestamp, current.id)
                });
            if supersedes {
                latest.insert(key, result);
            }
        }

        let mut live: Vec<_> = latest.into_values().collect();
        live.sort_by_key(|r| r.id);
        live
    }

    /// Every stored result, sorted by id
    #[must_use]
    pub fn snapshot(&self) -> Vec<ClassificationResult> {
        let mut all: Vec<_> = self
            .results
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|r| r.id);
        all
    }

    /// Distinct run ids present in the store
    #[must_use]
    pub fn run_ids(&self) -> Vec<RunId> {
        let mut runs: Vec<RunId> = self
            .by_run
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect();
        runs.sort();
        runs
    }

    /// Whether a run has any stored result
    #[must_use]
    pub fn contains_run(&self, run_id: RunId) -> bool {
        !self.by_run(run_id).is_empty()
    }

    /// Number of stored results
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn collect<F>(&self, ids: BTreeSet<ResultId>, belongs: F) -> Vec<ClassificationResult>
    where
        F: Fn(&ClassificationResult) -> bool,
    {
        ids.into_iter()
            .filter_map(|id| self.results.get(&id).map(|entry| entry.value().clone()))
            .filter(|result| belongs(result))
            .collect()
    }
}

fn index_insert<K: Eq + Hash>(index: &DashMap<K, BTreeSet<ResultId>>, key: K, id: ResultId) {
    index.entry(key).or_default().insert(id);
}

fn index_remove<K: Eq + Hash>(index: &DashMap<K, BTreeSet<ResultId>>, key: &K, id: ResultId) {
    if let Some(mut ids) = index.get_mut(key) {
        ids.remove(&id);
    }
    index.remove_if(key, |_, ids| ids.is_empty());
}

fn index_ids<K: Eq + Hash>(index: &DashMap<K, BTreeSet<ResultId>>, key: &K) -> BTreeSet<ResultId> {
    index
        .get(key)
        .map(|entry| entry.value().clone())
        .unwrap_or_default()
}
