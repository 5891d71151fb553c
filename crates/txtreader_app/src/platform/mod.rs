//! Command-line host: wires the reader core to the engine and the state directory.
mod app;
mod effects;
pub mod logging;
mod render;
mod services;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::DateTime;
use engine_logging::{engine_debug, engine_info};
use txtreader_core::{HistoryRecord, Msg};
use txtreader_engine::{EngineEvent, EngineHandle, FsStateStore, Repository, ResetScope};

use crate::cli::{Cli, Command};
use app::{run_reader, Session};
use services::{now_millis, Services};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let services = Services::open(&cli.state_dir, cli.profile, cli.words_per_page)?;
    match cli.command {
        Command::Read { path } => read(&services, path),
        Command::Random { directory, open } => random(&services, directory, open),
        Command::Reset { directory } => {
            let scope = directory.map_or(ResetScope::All, ResetScope::Directory);
            services.sampler.reset(&scope)?;
            println!("sampler reset");
            Ok(())
        }
        Command::History => {
            for record in services.history.history() {
                println!("{}", describe(&record));
            }
            Ok(())
        }
        Command::Forget { file_name } => {
            if services.history.forget(&file_name)? {
                println!("removed {file_name} from the history");
            } else {
                println!("{file_name} was not in the history");
            }
            Ok(())
        }
        Command::Merge { remote_state_dir } => merge(&services, &remote_state_dir),
        Command::Catalog { url } => catalog(&services, &url),
    }
}

fn read(services: &Services, path: PathBuf) -> anyhow::Result<()> {
    let mut session = Session::new(services)?;
    session.dispatch(Msg::OpenRequested {
        path: path.display().to_string(),
    });
    read_opened(session)
}

fn read_opened(mut session: Session<'_>) -> anyhow::Result<()> {
    if !session.settle() {
        bail!("timed out waiting for the book to load");
    }
    if session.state().book().is_none() {
        let screen = session.render_if_dirty().unwrap_or_default();
        bail!("{}", screen.trim());
    }
    run_reader(&mut session, io::stdin().lock(), io::stdout().lock())
}

fn random(services: &Services, directory: Option<PathBuf>, open: bool) -> anyhow::Result<()> {
    let directories = match directory {
        Some(directory) => vec![directory],
        None => services.search_paths(),
    };
    if directories.is_empty() {
        bail!("no directory given and no searchPaths configured");
    }

    for directory in &directories {
        if open {
            let mut session = Session::new(services)?;
            session.dispatch(Msg::RandomRequested {
                directory: directory.display().to_string(),
            });
            if session.state().active_load_id().is_some() {
                return read_opened(session);
            }
        } else if let Some(pick) = services.sampler.draw(directory, now_millis())? {
            println!("{}", pick.display());
            return Ok(());
        }
        engine_info!("No books under {}", directory.display());
    }
    println!("no books found");
    Ok(())
}

fn merge(services: &Services, remote_state_dir: &Path) -> anyhow::Result<()> {
    if !remote_state_dir.is_dir() {
        bail!("{} is not a state directory", remote_state_dir.display());
    }
    let remote = Repository::new(FsStateStore::new(remote_state_dir));
    let merged = services
        .history
        .merge_from(&remote)
        .with_context(|| format!("merging {}", remote_state_dir.display()))?;
    println!("history now holds {merged} books");
    Ok(())
}

fn catalog(services: &Services, url: &str) -> anyhow::Result<()> {
    let engine = EngineHandle::new(services.heading_rules()?)?;
    engine.crawl_catalog(1, url);
    while let Some(event) = engine.recv() {
        match event {
            EngineEvent::Progress(progress) => engine_debug!(
                "catalog {:?} url={:?} entries={:?}",
                progress.stage,
                progress.url,
                progress.entries
            ),
            EngineEvent::CatalogCompleted { entries, .. } => {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            EngineEvent::BookLoaded { .. } => {}
        }
    }
    bail!("catalog worker stopped before finishing")
}

fn describe(record: &HistoryRecord) -> String {
    let when = DateTime::from_timestamp_millis(record.timestamp)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let position = match (record.has_chapters, record.total_chapters) {
        (true, Some(total)) => format!("chapter {}/{total}", record.chapter + 1),
        (true, None) => format!("chapter {}", record.chapter + 1),
        (false, _) => match record.total_pages {
            Some(total) => format!("page {}/{total}", record.page + 1),
            None => format!("page {}", record.page + 1),
        },
    };
    format!("{when}  {}  {position}", record.file_name)
}
