use crate::state::{AppState, Status};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReaderViewModel {
    /// File name of the load in flight.
    pub loading: Option<String>,
    pub book_title: Option<String>,
    pub encoding_label: Option<String>,
    pub chapter_title: Option<String>,
    /// 1-based chapter number and chapter count; `None` for flat books.
    pub chapter_number: Option<(usize, usize)>,
    /// 1-based page number and page count within the chapter (or book).
    pub page_number: (usize, usize),
    pub page_text: String,
    pub percentage: f64,
    pub status: Option<Status>,
}

impl ReaderViewModel {
    pub(crate) fn build(state: &AppState) -> Self {
        let mut view = ReaderViewModel {
            loading: state.loading_file().map(ToOwned::to_owned),
            status: state.status().cloned(),
            ..Default::default()
        };
        let Some(reading) = state.reading() else {
            return view;
        };
        let book = &reading.book;
        let cursor = book.clamp(reading.cursor);

        view.book_title = Some(book.file_name().to_string());
        view.encoding_label = Some(book.encoding_label().to_string());
        if let Some(chapter) = book.chapter(cursor.chapter) {
            view.chapter_title = Some(chapter.title.clone());
            view.chapter_number = Some((cursor.chapter + 1, book.chapter_count()));
        }
        view.page_number = (cursor.page + 1, book.pages_in(cursor.chapter));
        view.page_text = book.page_text(cursor).to_string();
        view.percentage = book.percentage(cursor);
        view
    }
}
