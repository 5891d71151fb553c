use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::engine_error;
use txtreader_core::{default_words_per_page, HeadingRules, LoadId};

use crate::catalog::{crawl_catalog, CatalogSettings};
use crate::fetch::{ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
use crate::ingest::{load_book, LoadError};
use crate::{EngineEvent, JobId, JobProgress, Stage};

enum EngineCommand {
    Load {
        load_id: LoadId,
        path: PathBuf,
        words_per_page: usize,
    },
    CrawlCatalog {
        job_id: JobId,
        url: String,
    },
}

/// Background worker: book loads and catalog crawls run off the caller's
/// thread and report back as [`EngineEvent`]s. Nothing is cancelled; callers
/// drop results they no longer want.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(rules: HeadingRules) -> std::io::Result<Self> {
        Self::with_settings(rules, FetchSettings::default(), CatalogSettings::default())
    }

    pub fn with_settings(
        rules: HeadingRules,
        fetch: FetchSettings,
        catalog: CatalogSettings,
    ) -> std::io::Result<Self> {
        let fetcher = ReqwestFetcher::new(fetch).map_err(std::io::Error::other)?;
        Self::with_fetcher(rules, Arc::new(fetcher), catalog)
    }

    pub fn with_fetcher(
        rules: HeadingRules,
        fetcher: Arc<dyn Fetcher>,
        catalog: CatalogSettings,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let rules = Arc::new(rules);
        let catalog = Arc::new(catalog);

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let worker = Worker {
                    rules: rules.clone(),
                    fetcher: fetcher.clone(),
                    catalog: catalog.clone(),
                    event_tx: event_tx.clone(),
                };
                runtime.spawn(async move {
                    worker.handle(command).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn load(&self, load_id: LoadId, path: impl Into<PathBuf>, words_per_page: usize) {
        let _ = self.cmd_tx.send(EngineCommand::Load {
            load_id,
            path: path.into(),
            words_per_page,
        });
    }

    pub fn crawl_catalog(&self, job_id: JobId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::CrawlCatalog {
            job_id,
            url: url.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the worker is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct Worker {
    rules: Arc<HeadingRules>,
    fetcher: Arc<dyn Fetcher>,
    catalog: Arc<CatalogSettings>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    async fn handle(self, command: EngineCommand) {
        match command {
            EngineCommand::Load {
                load_id,
                path,
                words_per_page,
            } => {
                let words_per_page =
                    NonZeroUsize::new(words_per_page).unwrap_or_else(default_words_per_page);
                let rules = self.rules.clone();
                let shown = path.display().to_string();
                let result = tokio::task::spawn_blocking(move || {
                    load_book(&path, &rules, words_per_page)
                })
                .await
                .unwrap_or_else(|err| {
                    engine_error!("Load worker for {} failed: {}", shown, err);
                    Err(LoadError::Read {
                        path: shown,
                        message: err.to_string(),
                    })
                });
                let _ = self.event_tx.send(EngineEvent::BookLoaded { load_id, result });
            }
            EngineCommand::CrawlCatalog { job_id, url } => {
                let sink = ChannelProgressSink::new(self.event_tx.clone());
                sink.emit(EngineEvent::Progress(JobProgress {
                    url: Some(url.clone()),
                    ..JobProgress::new(job_id, Stage::Queued)
                }));
                let entries =
                    crawl_catalog(self.fetcher.as_ref(), job_id, &url, &self.catalog, &sink).await;
                let _ = self
                    .event_tx
                    .send(EngineEvent::CatalogCompleted { job_id, entries });
            }
        }
    }
}
