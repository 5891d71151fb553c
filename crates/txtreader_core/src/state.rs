use std::num::NonZeroUsize;
use std::path::Path;

use crate::history::{ProgressRecord, ProgressSnapshot};
use crate::paginate::default_words_per_page;
use crate::reader::{Book, Cursor};
use crate::view_model::ReaderViewModel;

pub type LoadId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveLoad {
    pub(crate) id: LoadId,
    pub(crate) file_name: String,
    /// Started from a search of the configured directories.
    pub(crate) relocated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reading {
    pub(crate) book: Book,
    pub(crate) cursor: Cursor,
}

impl Reading {
    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            file_name: self.book.file_name().to_string(),
            file_path: self.book.file_path().map(ToOwned::to_owned),
            page: self.cursor.page,
            chapter: self.cursor.chapter,
            has_chapters: self.book.has_chapters(),
            total_pages: self.book.total_pages(),
            total_chapters: self.book.chapter_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    words_per_page: NonZeroUsize,
    next_load_id: LoadId,
    active_load: Option<ActiveLoad>,
    pending_locate: Option<String>,
    reading: Option<Reading>,
    status: Option<Status>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_words_per_page(default_words_per_page())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words_per_page(words_per_page: NonZeroUsize) -> Self {
        Self {
            words_per_page,
            next_load_id: 1,
            active_load: None,
            pending_locate: None,
            reading: None,
            status: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> ReaderViewModel {
        ReaderViewModel::build(self)
    }

    pub fn words_per_page(&self) -> NonZeroUsize {
        self.words_per_page
    }

    /// Id of the load whose result is still wanted.
    pub fn active_load_id(&self) -> Option<LoadId> {
        self.active_load.as_ref().map(|load| load.id)
    }

    pub fn book(&self) -> Option<&Book> {
        self.reading.as_ref().map(|r| &r.book)
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.reading.as_ref().map(|r| r.cursor)
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn reading(&self) -> Option<&Reading> {
        self.reading.as_ref()
    }

    pub(crate) fn loading_file(&self) -> Option<&str> {
        self.active_load.as_ref().map(|load| load.file_name.as_str())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = Some(status);
        self.mark_dirty();
    }

    /// Start a load, superseding any load still in flight.
    pub(crate) fn begin_load(&mut self, path: &str, relocated: bool) -> LoadId {
        let id = self.next_load_id;
        self.next_load_id += 1;
        let file_name = file_name_of(path);
        self.active_load = Some(ActiveLoad {
            id,
            file_name: file_name.clone(),
            relocated,
        });
        self.pending_locate = None;
        self.status = None;
        self.mark_dirty();
        id
    }

    /// Ends the load if `load_id` is the active one.
    pub(crate) fn take_active_load(&mut self, load_id: LoadId) -> Option<ActiveLoad> {
        if self.active_load_id() != Some(load_id) {
            return None;
        }
        self.active_load.take()
    }

    pub(crate) fn set_pending_locate(&mut self, file_name: String) {
        self.pending_locate = Some(file_name);
    }

    pub(crate) fn take_pending_locate(&mut self, file_name: &str) -> bool {
        if self.pending_locate.as_deref() == Some(file_name) {
            self.pending_locate = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn install_book(&mut self, book: Book, saved: Option<&ProgressRecord>) -> ProgressSnapshot {
        let cursor = saved
            .map(|record| book.clamp(Cursor::new(record.chapter, record.page)))
            .unwrap_or_default();
        let reading = Reading { book, cursor };
        let snapshot = reading.snapshot();
        self.reading = Some(reading);
        self.mark_dirty();
        snapshot
    }

    /// Apply a navigation step; returns the snapshot to persist if the cursor moved.
    pub(crate) fn move_cursor<F>(&mut self, step: F) -> Option<ProgressSnapshot>
    where
        F: FnOnce(&Book, Cursor) -> Option<Cursor>,
    {
        let reading = self.reading.as_mut()?;
        let next = step(&reading.book, reading.cursor)?;
        if next == reading.cursor {
            return None;
        }
        reading.cursor = next;
        let snapshot = reading.snapshot();
        self.mark_dirty();
        Some(snapshot)
    }

    pub(crate) fn close_if_open(&mut self, file_name: &str) {
        if self.book().map(Book::file_name) == Some(file_name) {
            self.reading = None;
            self.mark_dirty();
        }
    }
}

pub(crate) fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
