use std::fmt;

use serde::{Deserialize, Serialize};
use txtreader_core::LoadId;

use crate::ingest::{LoadError, LoadedBook};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Fetching,
    Parsing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    pub url: Option<String>,
    pub bytes: Option<u64>,
    /// Catalog entries collected so far.
    pub entries: Option<usize>,
}

impl JobProgress {
    pub(crate) fn new(job_id: JobId, stage: Stage) -> Self {
        Self {
            job_id,
            stage,
            url: None,
            bytes: None,
            entries: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    BookLoaded {
        load_id: LoadId,
        result: Result<LoadedBook, LoadError>,
    },
    CatalogCompleted {
        job_id: JobId,
        entries: Vec<CatalogEntry>,
    },
}

/// One chapter link found on a table-of-contents page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
}

/// A downloaded page, still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    /// Where the page ended up after redirects; relative links resolve against it.
    pub final_url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: usize, actual: usize },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "page of {actual} bytes exceeds {max_bytes}")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
