//! TxtReader core: text segmentation, pagination, progress bookkeeping and the
//! pure reader state machine.
mod chapter;
mod effect;
mod history;
mod msg;
mod paginate;
mod reader;
mod sampler;
mod state;
mod update;
mod view_model;

pub use chapter::{
    segment, Chapter, HeadingMatcher, HeadingRules, RegexHeading, SegmentError, Segmentation,
    MAX_HEADING_CHARS, PREFACE_TITLE, PRESCAN_LINE_LIMIT,
};
pub use effect::Effect;
pub use history::{
    book_key, merge, upsert_history, HistoryRecord, ProgressMap, ProgressRecord,
    ProgressSnapshot, Timestamp, Tombstones,
};
pub use msg::{LoadFailure, Msg};
pub use paginate::{
    chaptered_percentage, char_len, clamp_percent, default_words_per_page, flat_percentage,
    page_count, page_slice, split_pages, DEFAULT_WORDS_PER_PAGE,
};
pub use reader::{Book, BookLayout, Cursor};
pub use sampler::{reset_all, DrawOutcome, ResetCause, SamplerBook, SamplerPhase, SamplerState};
pub use state::{AppState, LoadId, Status};
pub use update::update;
pub use view_model::ReaderViewModel;
