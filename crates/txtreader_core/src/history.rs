//! Reading progress, reading history and the tombstone-aware history merge.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Per-book progress keyed by [`book_key`].
pub type ProgressMap = BTreeMap<String, ProgressRecord>;

/// Identity of a book in the progress map: the file name, optionally
/// qualified by a profile namespace.
pub fn book_key(file_name: &str, profile: Option<&str>) -> String {
    match profile.map(str::trim).filter(|p| !p.is_empty()) {
        Some(profile) => format!("{profile}::{file_name}"),
        None => file_name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub page: usize,
    pub chapter: usize,
    pub has_chapters: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<usize>,
    pub last_read: Timestamp,
    /// Fields written by other hosts, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub file_name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub chapter: usize,
    #[serde(default)]
    pub has_chapters: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<usize>,
    #[serde(default)]
    pub last_read: Timestamp,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryRecord {
    pub fn progress(&self) -> ProgressRecord {
        ProgressRecord {
            page: self.page,
            chapter: self.chapter,
            has_chapters: self.has_chapters,
            total_pages: self.total_pages,
            total_chapters: self.total_chapters,
            last_read: self.last_read,
            extra: Map::new(),
        }
    }
}

/// The cursor of an open book at the moment it should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub file_name: String,
    pub file_path: Option<String>,
    pub page: usize,
    pub chapter: usize,
    pub has_chapters: bool,
    pub total_pages: usize,
    pub total_chapters: usize,
}

impl ProgressSnapshot {
    /// Overwrite the known fields of `record`; unknown fields stay untouched.
    pub fn apply_to_progress(&self, record: &mut ProgressRecord, now: Timestamp) {
        record.page = self.page;
        record.chapter = self.chapter;
        record.has_chapters = self.has_chapters;
        record.total_pages = Some(self.total_pages);
        record.total_chapters = Some(self.total_chapters);
        record.last_read = now;
    }

    pub fn apply_to_history(&self, record: &mut HistoryRecord, now: Timestamp) {
        record.file_name = self.file_name.clone();
        if self.file_path.is_some() {
            record.file_path = self.file_path.clone();
        }
        record.timestamp = now;
        record.page = self.page;
        record.chapter = self.chapter;
        record.has_chapters = self.has_chapters;
        record.total_pages = Some(self.total_pages);
        record.total_chapters = Some(self.total_chapters);
        record.last_read = now;
    }

    pub fn to_history(&self, now: Timestamp) -> HistoryRecord {
        let mut record = HistoryRecord {
            file_name: self.file_name.clone(),
            file_path: None,
            timestamp: now,
            page: 0,
            chapter: 0,
            has_chapters: false,
            total_pages: None,
            total_chapters: None,
            last_read: now,
            extra: Map::new(),
        };
        self.apply_to_history(&mut record, now);
        record
    }
}

/// Move the entry for the snapshot's file to the front, creating it if needed.
pub fn upsert_history(history: &mut Vec<HistoryRecord>, snapshot: &ProgressSnapshot, now: Timestamp) {
    let record = match history
        .iter()
        .position(|r| r.file_name == snapshot.file_name)
    {
        Some(idx) => {
            let mut record = history.remove(idx);
            snapshot.apply_to_history(&mut record, now);
            record
        }
        None => snapshot.to_history(now),
    };
    history.insert(0, record);
}

/// Deleted file names. Serialized as a sorted JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tombstones(BTreeSet<String>);

impl Tombstones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.0.contains(file_name)
    }

    /// Returns true when the name was not tombstoned before.
    pub fn insert(&mut self, file_name: impl Into<String>) -> bool {
        self.0.insert(file_name.into())
    }

    pub fn remove(&mut self, file_name: &str) -> bool {
        self.0.remove(file_name)
    }

    pub fn union_with(&mut self, other: &Tombstones) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Tombstones {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Last-write-wins merge keyed by file name. Tombstoned names never appear in
/// the output, whichever side carries them. Output is newest first.
pub fn merge(
    local: &[HistoryRecord],
    remote: &[HistoryRecord],
    tombstones: &Tombstones,
) -> Vec<HistoryRecord> {
    let mut by_name: BTreeMap<&str, &HistoryRecord> = BTreeMap::new();
    for record in local.iter().chain(remote) {
        if tombstones.contains(&record.file_name) {
            continue;
        }
        match by_name.get(record.file_name.as_str()) {
            Some(existing) if existing.timestamp >= record.timestamp => {}
            _ => {
                by_name.insert(record.file_name.as_str(), record);
            }
        }
    }

    let mut merged: Vec<HistoryRecord> = by_name.into_values().cloned().collect();
    merged.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    merged
}
