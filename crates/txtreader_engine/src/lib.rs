//! TxtReader engine: file IO, encoding detection, state persistence and the
//! background load worker.
mod catalog;
mod config;
mod decode;
mod engine;
mod fetch;
mod ingest;
mod library;
mod persist;
mod sampler;
mod scan;
mod store;
mod types;

pub use catalog::{
    crawl_catalog, is_chapter_link, parse_catalog_page, CatalogPage, CatalogSettings,
    DEFAULT_PAGE_DELAY, MAX_CATALOG_PAGES,
};
pub use config::{ReaderConfig, DEFAULT_EXTENSION};
pub use decode::{
    decode_html, decode_text, is_readable, DecodedText, DetectionSource, TextEncoding,
    SAMPLE_BYTES, UNREADABLE_RATIO,
};
pub use engine::EngineHandle;
pub use fetch::{ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
pub use ingest::{load_book, read_file, LoadError, LoadedBook};
pub use library::HistoryService;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use sampler::{RandomSampler, ResetScope};
pub use scan::{list_files, locate_book, ScanOptions, IGNORED_DIRS, MAX_SCAN_DEPTH};
pub use store::{
    FsStateStore, MemoryStateStore, Repository, StateStore, StoreError, CONFIG_KEY, DELETED_KEY,
    HISTORY_KEY, PROGRESS_KEY, SAMPLER_KEY,
};
pub use types::{
    CatalogEntry, EngineEvent, FailureKind, FetchError, FetchOutput, JobId,
    JobProgress, Stage,
};
