use std::fmt::Write;

use txtreader_core::{ReaderViewModel, Status};

/// Plain-text rendering of the reader view.
pub fn render(view: &ReaderViewModel) -> String {
    let mut out = String::new();
    if let Some(file_name) = &view.loading {
        let _ = writeln!(out, "Loading {file_name}...");
    }
    if let Some(title) = &view.book_title {
        let encoding = view.encoding_label.as_deref().unwrap_or("?");
        let _ = writeln!(out, "== {title} [{encoding}] ==");
        if let (Some(chapter), Some((number, count))) = (&view.chapter_title, view.chapter_number) {
            let _ = writeln!(out, "{chapter} ({number}/{count})");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", view.page_text.trim_end());
        let _ = writeln!(out);
        let (page, pages) = view.page_number;
        let _ = writeln!(out, "-- page {page}/{pages}, {:.1}% --", view.percentage);
    }
    match &view.status {
        Some(Status::Info(message)) => {
            let _ = writeln!(out, "{message}");
        }
        Some(Status::Error(message)) => {
            let _ = writeln!(out, "error: {message}");
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::render;
    use txtreader_core::{ReaderViewModel, Status};

    #[test]
    fn renders_chapter_header_and_footer() {
        let view = ReaderViewModel {
            book_title: Some("saga.txt".to_string()),
            encoding_label: Some("GBK".to_string()),
            chapter_title: Some("第一章 启程".to_string()),
            chapter_number: Some((1, 3)),
            page_number: (2, 4),
            page_text: "清晨出发。\n".to_string(),
            percentage: 12.345,
            ..ReaderViewModel::default()
        };
        let text = render(&view);
        assert!(text.starts_with("== saga.txt [GBK] ==\n第一章 启程 (1/3)\n"));
        assert!(text.contains("\n清晨出发。\n"));
        assert!(text.ends_with("-- page 2/4, 12.3% --\n"));
    }

    #[test]
    fn renders_status_without_a_book() {
        let view = ReaderViewModel {
            status: Some(Status::Error("moved.txt cannot be located".to_string())),
            ..ReaderViewModel::default()
        };
        assert_eq!(render(&view), "error: moved.txt cannot be located\n");
    }
}
