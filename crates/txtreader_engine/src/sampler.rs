use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::engine_info;
use txtreader_core::{reset_all, ResetCause, SamplerBook, Timestamp};

use crate::scan::{list_files, ScanOptions};
use crate::store::{Repository, StateStore, StoreError, SAMPLER_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    Directory(PathBuf),
    All,
}

/// Random unread-book picker backed by the `sampler` document.
pub struct RandomSampler<S> {
    repo: Arc<Repository<S>>,
    options: ScanOptions,
}

impl<S: StateStore> RandomSampler<S> {
    pub fn new(repo: Arc<Repository<S>>, options: ScanOptions) -> Self {
        Self { repo, options }
    }

    /// Draw a file not yet drawn from `directory`; `None` when it holds no books.
    pub fn draw(&self, directory: &Path, now: Timestamp) -> Result<Option<PathBuf>, StoreError> {
        let population: BTreeSet<String> = list_files(directory, &self.options)
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        let key = directory_key(directory);
        let outcome = self.repo.modify(SAMPLER_KEY, |book: &mut SamplerBook| {
            book.entry(key.clone())
                .or_default()
                .draw(population, &mut rand::thread_rng(), now)
        })?;

        match outcome.reset {
            Some(ResetCause::PopulationChanged) => {
                engine_info!("Book list under {} changed; starting a new round", key)
            }
            Some(ResetCause::Exhausted) => {
                engine_info!("Every book under {} was drawn; starting a new round", key)
            }
            None => {}
        }
        Ok(outcome.pick.map(PathBuf::from))
    }

    pub fn reset(&self, scope: &ResetScope) -> Result<(), StoreError> {
        self.repo.modify(SAMPLER_KEY, |book: &mut SamplerBook| match scope {
            ResetScope::Directory(directory) => {
                if let Some(state) = book.get_mut(&directory_key(directory)) {
                    state.reset();
                }
            }
            ResetScope::All => reset_all(book),
        })?;
        engine_info!("Sampler reset: {:?}", scope);
        Ok(())
    }
}

fn directory_key(directory: &Path) -> String {
    directory.to_string_lossy().into_owned()
}
