use crate::history::ProgressSnapshot;
use crate::LoadId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Read, decode and segment the file on the load worker.
    LoadBook {
        load_id: LoadId,
        path: String,
        words_per_page: usize,
    },
    /// Search the configured directories for a book that moved.
    LocateBook { file_name: String },
    SaveProgress(ProgressSnapshot),
    DrawRandom { directory: String },
    ForgetBook { file_name: String },
}
