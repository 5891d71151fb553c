//! Reading progress and history over the state repository.
use std::sync::Arc;

use engine_logging::engine_info;
use txtreader_core::{
    book_key, merge, upsert_history, HistoryRecord, ProgressMap, ProgressRecord,
    ProgressSnapshot, Timestamp, Tombstones,
};

use crate::store::{Repository, StateStore, StoreError, DELETED_KEY, HISTORY_KEY, PROGRESS_KEY};

pub struct HistoryService<S> {
    repo: Arc<Repository<S>>,
    profile: Option<String>,
}

impl<S: StateStore> HistoryService<S> {
    pub fn new(repo: Arc<Repository<S>>, profile: Option<String>) -> Self {
        Self { repo, profile }
    }

    fn key(&self, file_name: &str) -> String {
        book_key(file_name, self.profile.as_deref())
    }

    pub fn progress_for(&self, file_name: &str) -> Option<ProgressRecord> {
        self.repo
            .read::<ProgressMap>(PROGRESS_KEY)
            .remove(&self.key(file_name))
    }

    /// Persist the cursor. Reading a book again lifts its tombstone.
    pub fn record(&self, snapshot: &ProgressSnapshot, now: Timestamp) -> Result<(), StoreError> {
        let key = self.key(&snapshot.file_name);
        self.repo.modify(PROGRESS_KEY, |progress: &mut ProgressMap| {
            snapshot.apply_to_progress(progress.entry(key).or_default(), now);
        })?;
        self.repo
            .modify(HISTORY_KEY, |history: &mut Vec<HistoryRecord>| {
                upsert_history(history, snapshot, now);
            })?;

        if self
            .repo
            .read::<Tombstones>(DELETED_KEY)
            .contains(&snapshot.file_name)
        {
            self.repo.modify(DELETED_KEY, |deleted: &mut Tombstones| {
                deleted.remove(&snapshot.file_name);
            })?;
            engine_info!("{} is back in the history", snapshot.file_name);
        }
        Ok(())
    }

    /// Newest first, tombstoned names left out.
    pub fn history(&self) -> Vec<HistoryRecord> {
        let deleted: Tombstones = self.repo.read(DELETED_KEY);
        let mut history: Vec<HistoryRecord> = self
            .repo
            .read::<Vec<HistoryRecord>>(HISTORY_KEY)
            .into_iter()
            .filter(|record| !deleted.contains(&record.file_name))
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history
    }

    /// Drop the book's history and progress and tombstone its name.
    pub fn forget(&self, file_name: &str) -> Result<bool, StoreError> {
        let removed = self
            .repo
            .modify(HISTORY_KEY, |history: &mut Vec<HistoryRecord>| {
                let before = history.len();
                history.retain(|record| record.file_name != file_name);
                history.len() != before
            })?;
        let key = self.key(file_name);
        self.repo.modify(PROGRESS_KEY, |progress: &mut ProgressMap| {
            progress.remove(&key);
        })?;
        self.repo.modify(DELETED_KEY, |deleted: &mut Tombstones| {
            deleted.insert(file_name);
        })?;
        engine_info!("Forgot {}", file_name);
        Ok(removed)
    }

    /// Merge another copy of the state into this one. Returns the merged
    /// history length.
    pub fn merge_from<R: StateStore>(&self, remote: &Repository<R>) -> Result<usize, StoreError> {
        let remote_deleted: Tombstones = remote.read(DELETED_KEY);
        let remote_history: Vec<HistoryRecord> = remote.read(HISTORY_KEY);

        let deleted = self.repo.modify(DELETED_KEY, |deleted: &mut Tombstones| {
            deleted.union_with(&remote_deleted);
            deleted.clone()
        })?;
        let merged = self
            .repo
            .modify(HISTORY_KEY, |history: &mut Vec<HistoryRecord>| {
                *history = merge(history, &remote_history, &deleted);
                history.len()
            })?;
        engine_info!(
            "Merged {} remote records; history now holds {}",
            remote_history.len(),
            merged
        );
        Ok(merged)
    }
}
