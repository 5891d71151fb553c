use crate::history::ProgressRecord;
use crate::reader::Book;
use crate::LoadId;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked to open a file.
    OpenRequested { path: String },
    /// Load worker finished a book.
    BookLoaded {
        load_id: LoadId,
        book: Box<Book>,
        saved: Option<ProgressRecord>,
    },
    /// Load worker gave up on a book.
    LoadFailed {
        load_id: LoadId,
        failure: LoadFailure,
    },
    /// Result of searching the configured directories for a missing book.
    BookLocated {
        file_name: String,
        path: Option<String>,
    },
    NextPage,
    PrevPage,
    JumpToChapter(usize),
    JumpToPercent(f64),
    /// User asked for a random unread book from a directory.
    RandomRequested { directory: String },
    RandomDrawn {
        directory: String,
        path: Option<String>,
    },
    /// Directory chooser closed; `None` when cancelled.
    DirectoryPicked(Option<String>),
    /// User removed a book from the reading history.
    ForgetRequested { file_name: String },
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    NotFound,
    Unreadable(String),
    Segmentation(String),
}
