use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::time::Duration;

use txtreader_core::{update, AppState, Msg};
use txtreader_engine::EngineHandle;

use super::effects::EffectRunner;
use super::render::render;
use super::services::Services;

/// Longest wait for a single book to load.
const LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Reader state plus the runner that carries out its effects.
pub struct Session<'a> {
    state: AppState,
    runner: EffectRunner<'a>,
}

impl<'a> Session<'a> {
    pub fn new(services: &'a Services) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(services.heading_rules()?)?;
        Ok(Self {
            state: AppState::with_words_per_page(services.words_per_page),
            runner: EffectRunner::new(engine, services),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply `msg` and every message its effects produce.
    pub fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            inbox.extend(self.runner.run(effects));
        }
    }

    /// Block until no load is in flight. Returns false on timeout.
    pub fn settle(&mut self) -> bool {
        while self.state.active_load_id().is_some() {
            match self.runner.wait_for_load(LOAD_TIMEOUT) {
                Some(msg) => self.dispatch(msg),
                None => return false,
            }
        }
        true
    }

    pub fn render_if_dirty(&mut self) -> Option<String> {
        self.state
            .consume_dirty()
            .then(|| render(&self.state.view()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderCommand {
    Next,
    Prev,
    /// 1-based, as shown in the table of contents.
    Chapter(usize),
    Percent(f64),
    Toc,
    Quit,
    Help,
}

pub fn parse_command(line: &str) -> Option<ReaderCommand> {
    let line = line.trim();
    match line {
        "" | "n" | "next" => return Some(ReaderCommand::Next),
        "p" | "prev" => return Some(ReaderCommand::Prev),
        "toc" => return Some(ReaderCommand::Toc),
        "q" | "quit" => return Some(ReaderCommand::Quit),
        "h" | "help" | "?" => return Some(ReaderCommand::Help),
        _ => {}
    }
    if let Some(rest) = line.strip_prefix('%') {
        return rest.trim().parse().ok().map(ReaderCommand::Percent);
    }
    if let Some(rest) = line.strip_prefix("c ") {
        return rest
            .trim()
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .map(ReaderCommand::Chapter);
    }
    None
}

const HELP: &str = "n: next page, p: previous page, c <n>: chapter n, %<p>: jump to percent, toc: chapters, q: quit";

/// Interactive paging over an already opened book.
pub fn run_reader<R: BufRead, W: Write>(
    session: &mut Session<'_>,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    if let Some(screen) = session.render_if_dirty() {
        write!(out, "{screen}")?;
    }
    writeln!(out, "{HELP}")?;
    for line in input.lines() {
        let line = line?;
        let msg = match parse_command(&line) {
            Some(ReaderCommand::Quit) => break,
            Some(ReaderCommand::Next) => Msg::NextPage,
            Some(ReaderCommand::Prev) => Msg::PrevPage,
            Some(ReaderCommand::Chapter(n)) => Msg::JumpToChapter(n - 1),
            Some(ReaderCommand::Percent(p)) => Msg::JumpToPercent(p),
            Some(ReaderCommand::Toc) => {
                if let Some(book) = session.state().book() {
                    for (i, title) in book.titles().iter().enumerate() {
                        writeln!(out, "{:>4}  {title}", i + 1)?;
                    }
                }
                continue;
            }
            Some(ReaderCommand::Help) | None => {
                writeln!(out, "{HELP}")?;
                continue;
            }
        };
        session.dispatch(msg);
        if let Some(screen) = session.render_if_dirty() {
            write!(out, "{screen}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use tempfile::TempDir;
    use txtreader_core::Msg;

    use super::{parse_command, run_reader, ReaderCommand, Session};
    use crate::platform::services::Services;

    #[test]
    fn parses_reader_commands() {
        assert_eq!(parse_command(""), Some(ReaderCommand::Next));
        assert_eq!(parse_command(" p "), Some(ReaderCommand::Prev));
        assert_eq!(parse_command("c 3"), Some(ReaderCommand::Chapter(3)));
        assert_eq!(parse_command("c 0"), None);
        assert_eq!(parse_command("%42.5"), Some(ReaderCommand::Percent(42.5)));
        assert_eq!(parse_command("toc"), Some(ReaderCommand::Toc));
        assert_eq!(parse_command("jump"), None);
    }

    #[test]
    fn reading_saves_progress_across_sessions() {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("saga.txt");
        fs::write(&book, "第一章 启程\n清晨出发。\n第二章 抵达\n夜里到了。\n").unwrap();
        let state_dir = temp.path().join("state");
        let services = Services::open(&state_dir, None, None).unwrap();

        let mut session = Session::new(&services).unwrap();
        session.dispatch(Msg::OpenRequested {
            path: book.display().to_string(),
        });
        assert!(session.settle());
        let mut out = Vec::new();
        run_reader(&mut session, Cursor::new("n\nq\n"), &mut out).unwrap();
        let screen = String::from_utf8(out).unwrap();
        assert!(screen.contains("第二章 抵达 (2/2)"));

        let saved = services.history.progress_for("saga.txt").unwrap();
        assert_eq!((saved.chapter, saved.page), (1, 0));

        // A fresh session restores the cursor.
        let mut session = Session::new(&services).unwrap();
        session.dispatch(Msg::OpenRequested {
            path: book.display().to_string(),
        });
        assert!(session.settle());
        assert_eq!(session.state().cursor().map(|c| c.chapter), Some(1));
    }

    #[test]
    fn moved_book_is_found_in_search_paths() {
        let temp = TempDir::new().unwrap();
        let shelf = temp.path().join("shelf");
        fs::create_dir_all(shelf.join("old")).unwrap();
        fs::write(shelf.join("old/lost.txt"), "no headings here").unwrap();
        let state_dir = temp.path().join("state");
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(
            state_dir.join("config.json"),
            format!(r#"{{"searchPaths": ["{}"]}}"#, shelf.display()),
        )
        .unwrap();
        let services = Services::open(&state_dir, None, None).unwrap();

        let mut session = Session::new(&services).unwrap();
        session.dispatch(Msg::OpenRequested {
            path: temp.path().join("lost.txt").display().to_string(),
        });
        assert!(session.settle());
        let book = session.state().book().unwrap();
        assert_eq!(book.file_name(), "lost.txt");
        assert!(!book.has_chapters());
    }
}
