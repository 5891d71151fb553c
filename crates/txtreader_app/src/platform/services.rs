use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use engine_logging::engine_info;
use txtreader_core::{HeadingRules, Timestamp};
use txtreader_engine::{
    ensure_state_dir, FsStateStore, HistoryService, RandomSampler, ReaderConfig, Repository,
    ScanOptions, CONFIG_KEY,
};

/// Everything backed by the state directory, opened once per run.
pub struct Services {
    pub config: ReaderConfig,
    pub history: HistoryService<FsStateStore>,
    pub sampler: RandomSampler<FsStateStore>,
    pub scan: ScanOptions,
    pub words_per_page: NonZeroUsize,
}

impl Services {
    pub fn open(
        state_dir: &Path,
        profile: Option<String>,
        words_per_page: Option<NonZeroUsize>,
    ) -> anyhow::Result<Self> {
        ensure_state_dir(state_dir)
            .with_context(|| format!("cannot use state directory {}", state_dir.display()))?;
        let repo = Arc::new(Repository::new(FsStateStore::new(state_dir)));
        let config: ReaderConfig = repo.read(CONFIG_KEY);
        let scan = ScanOptions::for_extension(&config.extension);
        let words_per_page = words_per_page.unwrap_or_else(|| config.words_per_page());
        engine_info!(
            "State in {} ({} search paths, {} chars per page)",
            state_dir.display(),
            config.search_paths.len(),
            words_per_page
        );

        Ok(Self {
            history: HistoryService::new(repo.clone(), profile),
            sampler: RandomSampler::new(repo, scan.clone()),
            config,
            scan,
            words_per_page,
        })
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.config.search_paths.iter().map(PathBuf::from).collect()
    }

    pub fn heading_rules(&self) -> anyhow::Result<HeadingRules> {
        self.config
            .heading_rules()
            .context("invalid headingPatterns in config")
    }
}

pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}
