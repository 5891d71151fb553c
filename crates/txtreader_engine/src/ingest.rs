//! Read, decode and segment one book.
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::Path;

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;
use txtreader_core::{Book, BookLayout, HeadingRules, LoadFailure, SegmentError};

use crate::decode::{decode_text, DetectionSource};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{path} not found")]
    NotFound { path: String },
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("segmentation failed: {0}")]
    Segment(#[from] SegmentError),
}

impl LoadError {
    /// The shape the reader state machine reacts to.
    pub fn to_failure(&self) -> LoadFailure {
        match self {
            LoadError::NotFound { .. } => LoadFailure::NotFound,
            LoadError::Read { message, .. } => LoadFailure::Unreadable(message.clone()),
            LoadError::Segment(err) => LoadFailure::Segmentation(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBook {
    pub book: Book,
    pub detection: DetectionSource,
}

/// Whole-file read; a missing file is reported apart from other IO errors.
pub fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|err| {
        let path = path.display().to_string();
        if err.kind() == ErrorKind::NotFound {
            LoadError::NotFound { path }
        } else {
            LoadError::Read {
                path,
                message: err.to_string(),
            }
        }
    })
}

/// Detection precedes segmentation; the caller restores progress afterwards.
pub fn load_book(
    path: &Path,
    rules: &HeadingRules,
    words_per_page: NonZeroUsize,
) -> Result<LoadedBook, LoadError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    engine_info!("Loading {}", path.display());

    let bytes = read_file(path)?;
    let decoded = decode_text(&bytes, &file_name);
    if decoded.is_best_effort() {
        engine_warn!("No encoding fits {}; decoded as {}", file_name, decoded.encoding_label);
    }

    let layout = BookLayout::analyze(&decoded.text, rules, words_per_page)?;
    let book = Book::new(
        file_name,
        Some(path.display().to_string()),
        decoded.encoding_label,
        layout,
        words_per_page,
    );
    engine_info!(
        "Loaded {} ({} bytes, {}, {} chapters, {} pages)",
        book.file_name(),
        bytes.len(),
        book.encoding_label(),
        book.chapter_count(),
        book.total_pages()
    );
    Ok(LoadedBook {
        book,
        detection: decoded.source,
    })
}
