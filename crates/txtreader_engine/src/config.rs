use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use txtreader_core::{default_words_per_page, HeadingRules, SegmentError, DEFAULT_WORDS_PER_PAGE};

pub const DEFAULT_EXTENSION: &str = "txt";

/// User configuration shared by every host. Unknown keys survive a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Directories searched for random picks and for books that moved.
    pub search_paths: Vec<String>,
    pub words_per_page: usize,
    /// Owned by the presentation layer; stored as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,
    pub extension: String,
    /// Replaces the built-in heading rules when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub heading_patterns: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            words_per_page: DEFAULT_WORDS_PER_PAGE,
            theme: None,
            extension: DEFAULT_EXTENSION.to_string(),
            heading_patterns: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl ReaderConfig {
    pub fn words_per_page(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.words_per_page).unwrap_or_else(default_words_per_page)
    }

    pub fn heading_rules(&self) -> Result<HeadingRules, SegmentError> {
        if self.heading_patterns.is_empty() {
            Ok(HeadingRules::builtin())
        } else {
            HeadingRules::from_patterns(&self.heading_patterns)
        }
    }
}
