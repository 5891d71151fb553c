use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use txtreader_core::{Effect, Msg};
use txtreader_engine::{locate_book, EngineEvent, EngineHandle};

use super::services::{now_millis, Services};

/// Executes the effects `update` asks for. Effects that finish on the spot
/// hand their result back as messages; book loads arrive later through
/// [`EffectRunner::wait_for_load`].
pub struct EffectRunner<'a> {
    engine: EngineHandle,
    services: &'a Services,
}

impl<'a> EffectRunner<'a> {
    pub fn new(engine: EngineHandle, services: &'a Services) -> Self {
        Self { engine, services }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        effects
            .into_iter()
            .filter_map(|effect| self.run_one(effect))
            .collect()
    }

    fn run_one(&self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::LoadBook {
                load_id,
                path,
                words_per_page,
            } => {
                engine_info!("LoadBook load_id={} path={}", load_id, path);
                self.engine.load(load_id, path, words_per_page);
                None
            }
            Effect::LocateBook { file_name } => {
                let found = locate_book(
                    &file_name,
                    &self.services.search_paths(),
                    &self.services.scan,
                );
                engine_info!("Located {}: {:?}", file_name, found);
                Some(Msg::BookLocated {
                    file_name,
                    path: found.map(|p| p.display().to_string()),
                })
            }
            Effect::SaveProgress(snapshot) => {
                if let Err(err) = self.services.history.record(&snapshot, now_millis()) {
                    engine_error!("Failed to save progress for {}: {}", snapshot.file_name, err);
                }
                None
            }
            Effect::DrawRandom { directory } => {
                let path = match self.services.sampler.draw(Path::new(&directory), now_millis()) {
                    Ok(path) => path,
                    Err(err) => {
                        engine_error!("Random draw in {} failed: {}", directory, err);
                        None
                    }
                };
                Some(Msg::RandomDrawn {
                    directory,
                    path: path.map(|p| p.display().to_string()),
                })
            }
            Effect::ForgetBook { file_name } => {
                if let Err(err) = self.services.history.forget(&file_name) {
                    engine_error!("Failed to forget {}: {}", file_name, err);
                }
                None
            }
        }
    }

    /// Next load result as a message, with saved progress attached.
    pub fn wait_for_load(&self, timeout: Duration) -> Option<Msg> {
        loop {
            match self.engine.recv_timeout(timeout)? {
                EngineEvent::BookLoaded { load_id, result } => {
                    return Some(match result {
                        Ok(loaded) => {
                            let saved = self.services.history.progress_for(loaded.book.file_name());
                            Msg::BookLoaded {
                                load_id,
                                book: Box::new(loaded.book),
                                saved,
                            }
                        }
                        Err(err) => {
                            engine_warn!("Load {} failed: {}", load_id, err);
                            Msg::LoadFailed {
                                load_id,
                                failure: err.to_failure(),
                            }
                        }
                    });
                }
                other => engine_debug!("Ignoring engine event {:?}", other),
            }
        }
    }
}
