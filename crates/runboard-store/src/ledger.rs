//! Run history ledger
//!
//! Tracks one [`RunHistoryItem`] per run plus per-workspace favorites.
//! Items are created when a run completes or when results of an unseen run
//! are loaded, change only through [`RunLedger::rename`], and are never
//! deleted.

use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use runboard_scheme::{ClassificationResult, RunId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Display format for run timestamps ("Mar 1, 2024, 9:05 AM")
const DISPLAY_TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

/// Format an instant the way history items display it
#[must_use]
pub fn format_run_timestamp(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

/// Summary of one classification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHistoryItem {
    /// Run ID
    pub id: RunId,
    /// Run name
    pub name: String,
    /// Display timestamp
    pub timestamp: String,
    /// Sortable instant the run was recorded at
    pub recorded_at: DateTime<Utc>,
    /// Distinct documents with results
    pub document_count: usize,
    /// Distinct schemes with results
    pub scheme_count: usize,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RunHistoryItem {
    /// Create item with zero counts
    #[must_use]
    pub fn new(id: RunId, name: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            timestamp: format_run_timestamp(recorded_at),
            recorded_at,
            document_count: 0,
            scheme_count: 0,
            description: None,
        }
    }

    /// With document and scheme counts
    #[inline]
    #[must_use]
    pub fn with_counts(mut self, document_count: usize, scheme_count: usize) -> Self {
        self.document_count = document_count;
        self.scheme_count = scheme_count;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Derive an item from the results of one run
    ///
    /// Counts are distinct ids actually present. Name and description come
    /// from the first result; the recorded instant is the earliest result
    /// timestamp. Returns `None` when no result belongs to `run_id`.
    #[must_use]
    pub fn from_results<'a, I>(run_id: RunId, results: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ClassificationResult>,
    {
        let mut documents = BTreeSet::new();
        let mut schemes = BTreeSet::new();
        let mut first: Option<&ClassificationResult> = None;
        let mut earliest: Option<DateTime<Utc>> = None;

        for result in results.into_iter().filter(|r| r.run_id == run_id) {
            documents.insert(result.document_id);
            schemes.insert(result.scheme_id);
            first.get_or_insert(result);
            earliest = Some(earliest.map_or(result.timestamp, |t| t.min(result.timestamp)));
        }

        let first = first?;
        let recorded_at = earliest.unwrap_or(first.timestamp);
        Some(
            Self::new(run_id, first.run_name.clone(), recorded_at)
                .with_counts(documents.len(), schemes.len())
                .with_description(first.run_description.clone()),
        )
    }
}

/// Serializable ledger contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// History items in insertion order
    pub runs: Vec<RunHistoryItem>,
    /// Favorite `(run, workspace)` pairs in insertion order
    pub favorites: Vec<(RunId, WorkspaceId)>,
}

/// Thread-safe run history ledger
#[derive(Debug, Default)]
pub struct RunLedger {
    runs: RwLock<IndexMap<RunId, RunHistoryItem>>,
    favorites: RwLock<IndexSet<(RunId, WorkspaceId)>>,
}

impl RunLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item; returns the replaced item
    pub fn record(&self, item: RunHistoryItem) -> Option<RunHistoryItem> {
        tracing::debug!(run_id = %item.id, name = %item.name, "Recording run");
        self.runs.write().insert(item.id, item)
    }

    /// All items in insertion order
    #[must_use]
    pub fn list(&self) -> Vec<RunHistoryItem> {
        self.runs.read().values().cloned().collect()
    }

    /// Item for a run
    #[must_use]
    pub fn get(&self, run_id: RunId) -> Option<RunHistoryItem> {
        self.runs.read().get(&run_id).cloned()
    }

    /// Whether the ledger knows a run
    #[inline]
    #[must_use]
    pub fn contains(&self, run_id: RunId) -> bool {
        self.runs.read().contains_key(&run_id)
    }

    /// Number of recorded runs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    /// Check if ledger is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Rename a run
    ///
    /// # Errors
    /// - [`LedgerError::EmptyName`] if `name` is blank
    /// - [`LedgerError::RunNotFound`] if the run is unknown
    pub fn rename(&self, run_id: RunId, name: &str) -> Result<RunHistoryItem, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }

        let mut runs = self.runs.write();
        let item = runs
            .get_mut(&run_id)
            .ok_or(LedgerError::RunNotFound(run_id))?;
        item.name = name.to_string();
        Ok(item.clone())
    }

    /// Derive and record items for every named run in `results`
    ///
    /// Results without a run name are skipped. Known runs keep their
    /// (possibly renamed) name and get refreshed counts. Returns the ids of
    /// runs that were not known before, in first-seen order.
    pub fn record_from_results(&self, results: &[ClassificationResult]) -> Vec<RunId> {
        let mut grouped: IndexMap<RunId, Vec<&ClassificationResult>> = IndexMap::new();
        for result in results.iter().filter(|r| !r.run_name.trim().is_empty()) {
            grouped.entry(result.run_id).or_default().push(result);
        }

        let mut added = Vec::new();
        let mut runs = self.runs.write();
        for (run_id, group) in grouped {
            let Some(derived) = RunHistoryItem::from_results(run_id, group) else {
                continue;
            };
            match runs.get_mut(&run_id) {
                Some(existing) => {
                    existing.document_count = derived.document_count;
                    existing.scheme_count = derived.scheme_count;
                }
                None => {
                    runs.insert(run_id, derived);
                    added.push(run_id);
                }
            }
        }

        if !added.is_empty() {
            tracing::debug!(count = added.len(), "Recorded runs from results");
        }
        added
    }

    /// Mark a run as favorite in a workspace
    ///
    /// Returns `false` if it already was.
    ///
    /// # Errors
    /// [`LedgerError::RunNotFound`] if the run is unknown
    pub fn add_favorite(
        &self,
        run_id: RunId,
        workspace_id: WorkspaceId,
    ) -> Result<bool, LedgerError> {
        if !self.contains(run_id) {
            return Err(LedgerError::RunNotFound(run_id));
        }
        Ok(self.favorites.write().insert((run_id, workspace_id)))
    }

    /// Unmark a favorite; returns whether it was marked
    pub fn remove_favorite(&self, run_id: RunId, workspace_id: WorkspaceId) -> bool {
        self.favorites
            .write()
            .shift_remove(&(run_id, workspace_id))
    }

    /// Whether a run is a favorite in a workspace
    #[must_use]
    pub fn is_favorite(&self, run_id: RunId, workspace_id: WorkspaceId) -> bool {
        self.favorites.read().contains(&(run_id, workspace_id))
    }

    /// Favorite runs of a workspace, in the order they were marked
    #[must_use]
    pub fn favorites(&self, workspace_id: WorkspaceId) -> Vec<RunHistoryItem> {
        let favorites = self.favorites.read();
        let runs = self.runs.read();
        favorites
            .iter()
            .filter(|(_, ws)| *ws == workspace_id)
            .filter_map(|(run_id, _)| runs.get(run_id).cloned())
            .collect()
    }

    /// Copy of the ledger contents
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            runs: self.list(),
            favorites: self.favorites.read().iter().copied().collect(),
        }
    }

    /// Replace the ledger contents
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        let runs: IndexMap<_, _> = snapshot
            .runs
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let favorites: IndexSet<_> = snapshot.favorites.into_iter().collect();

        *self.runs.write() = runs;
        *self.favorites.write() = favorites;
    }

    /// Write a JSON snapshot to `path`
    ///
    /// # Errors
    /// Returns error if serialization or the write fails
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a ledger from a JSON snapshot at `path`
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let bytes = std::fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)?;
        let ledger = Self::new();
        ledger.restore(snapshot);
        Ok(ledger)
    }
}

/// Sort key for history items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunSortKey {
    /// Recorded instant
    #[default]
    Date,
    /// Name (case-insensitive)
    Name,
    /// Document count
    Documents,
    /// Scheme count
    Schemes,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest first
    Ascending,
    /// Largest first
    #[default]
    Descending,
}

/// Sort history items in place (stable)
pub fn sort_runs(items: &mut [RunHistoryItem], key: RunSortKey, order: SortOrder) {
    items.sort_by(|a, b| {
        let ordering = match key {
            RunSortKey::Date => a.recorded_at.cmp(&b.recorded_at),
            RunSortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            RunSortKey::Documents => a.document_count.cmp(&b.document_count),
            RunSortKey::Schemes => a.scheme_count.cmp(&b.scheme_count),
        };
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Items whose name or description contains `query` (case-insensitive)
///
/// A blank query matches everything.
#[must_use]
pub fn search_runs<'a>(items: &'a [RunHistoryItem], query: &str) -> Vec<&'a RunHistoryItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}
