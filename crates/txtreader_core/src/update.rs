use crate::msg::LoadFailure;
use crate::state::Status;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::OpenRequested { path } => {
            let path = path.trim();
            if path.is_empty() {
                return (state, Vec::new());
            }
            vec![start_load(&mut state, path.to_string(), false)]
        }
        Msg::BookLoaded {
            load_id,
            book,
            saved,
        } => {
            // A newer request superseded this load.
            if state.take_active_load(load_id).is_none() {
                return (state, Vec::new());
            }
            let snapshot = state.install_book(*book, saved.as_ref());
            vec![Effect::SaveProgress(snapshot)]
        }
        Msg::LoadFailed { load_id, failure } => {
            let Some(load) = state.take_active_load(load_id) else {
                return (state, Vec::new());
            };
            match failure {
                LoadFailure::NotFound if !load.relocated => {
                    state.set_pending_locate(load.file_name.clone());
                    state.set_status(Status::Info(format!("searching for {}", load.file_name)));
                    vec![Effect::LocateBook {
                        file_name: load.file_name,
                    }]
                }
                LoadFailure::NotFound => {
                    state.set_status(Status::Error(format!(
                        "{} cannot be located",
                        load.file_name
                    )));
                    Vec::new()
                }
                LoadFailure::Unreadable(message) => {
                    state.set_status(Status::Error(format!(
                        "failed to read {}: {message}",
                        load.file_name
                    )));
                    Vec::new()
                }
                LoadFailure::Segmentation(message) => {
                    state.set_status(Status::Error(format!(
                        "failed to split {} into chapters: {message}",
                        load.file_name
                    )));
                    Vec::new()
                }
            }
        }
        Msg::BookLocated { file_name, path } => {
            if !state.take_pending_locate(&file_name) {
                return (state, Vec::new());
            }
            match path {
                Some(path) => vec![start_load(&mut state, path, true)],
                None => {
                    state.set_status(Status::Error(format!("{file_name} cannot be located")));
                    Vec::new()
                }
            }
        }
        Msg::NextPage => save_if_moved(state.move_cursor(|book, cursor| book.next(cursor))),
        Msg::PrevPage => save_if_moved(state.move_cursor(|book, cursor| book.prev(cursor))),
        Msg::JumpToChapter(chapter) => {
            save_if_moved(state.move_cursor(|book, _| book.chapter_start(chapter)))
        }
        Msg::JumpToPercent(percent) => {
            save_if_moved(state.move_cursor(|book, _| Some(book.at_percent(percent))))
        }
        Msg::RandomRequested { directory } | Msg::DirectoryPicked(Some(directory)) => {
            vec![Effect::DrawRandom { directory }]
        }
        Msg::RandomDrawn { directory, path } => match path {
            Some(path) => vec![start_load(&mut state, path, false)],
            None => {
                state.set_status(Status::Info(format!("no books found under {directory}")));
                Vec::new()
            }
        },
        Msg::ForgetRequested { file_name } => {
            state.close_if_open(&file_name);
            vec![Effect::ForgetBook { file_name }]
        }
        Msg::DirectoryPicked(None) | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_load(state: &mut AppState, path: String, relocated: bool) -> Effect {
    let load_id = state.begin_load(&path, relocated);
    Effect::LoadBook {
        load_id,
        path,
        words_per_page: state.words_per_page().get(),
    }
}

fn save_if_moved(snapshot: Option<crate::ProgressSnapshot>) -> Vec<Effect> {
    snapshot.map(Effect::SaveProgress).into_iter().collect()
}
