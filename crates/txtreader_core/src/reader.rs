use std::num::NonZeroUsize;

use crate::chapter::{segment, Chapter, HeadingRules, SegmentError};
use crate::paginate::{
    chaptered_percentage, char_len, clamp_percent, flat_percentage, page_slice, pages_for_len,
    split_pages,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookLayout {
    Chaptered(Vec<Chapter>),
    /// Pages split once at load time.
    Flat(Vec<String>),
}

impl BookLayout {
    /// Segment `text`, falling back to flat pages when no heading is found.
    pub fn analyze(
        text: &str,
        rules: &HeadingRules,
        words_per_page: NonZeroUsize,
    ) -> Result<Self, SegmentError> {
        let segmentation = segment(text, rules)?;
        if segmentation.no_chapters {
            Ok(BookLayout::Flat(split_pages(text, words_per_page)))
        } else {
            Ok(BookLayout::Chaptered(segmentation.chapters))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub chapter: usize,
    pub page: usize,
}

impl Cursor {
    pub fn new(chapter: usize, page: usize) -> Self {
        Self { chapter, page }
    }
}

/// A decoded, segmented book plus the page size it is navigated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    file_name: String,
    file_path: Option<String>,
    encoding_label: String,
    words_per_page: NonZeroUsize,
    layout: BookLayout,
    chapter_chars: Vec<usize>,
}

impl Book {
    pub fn new(
        file_name: impl Into<String>,
        file_path: Option<String>,
        encoding_label: impl Into<String>,
        layout: BookLayout,
        words_per_page: NonZeroUsize,
    ) -> Self {
        let chapter_chars = match &layout {
            BookLayout::Chaptered(chapters) => {
                chapters.iter().map(|c| char_len(&c.content)).collect()
            }
            BookLayout::Flat(_) => Vec::new(),
        };
        Self {
            file_name: file_name.into(),
            file_path,
            encoding_label: encoding_label.into(),
            words_per_page,
            layout,
            chapter_chars,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn encoding_label(&self) -> &str {
        &self.encoding_label
    }

    pub fn words_per_page(&self) -> NonZeroUsize {
        self.words_per_page
    }

    pub fn layout(&self) -> &BookLayout {
        &self.layout
    }

    pub fn has_chapters(&self) -> bool {
        matches!(self.layout, BookLayout::Chaptered(_))
    }

    /// Zero for flat books.
    pub fn chapter_count(&self) -> usize {
        match &self.layout {
            BookLayout::Chaptered(chapters) => chapters.len(),
            BookLayout::Flat(_) => 0,
        }
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        match &self.layout {
            BookLayout::Chaptered(chapters) => chapters.get(index),
            BookLayout::Flat(_) => None,
        }
    }

    pub fn titles(&self) -> Vec<&str> {
        match &self.layout {
            BookLayout::Chaptered(chapters) => chapters.iter().map(|c| c.title.as_str()).collect(),
            BookLayout::Flat(_) => Vec::new(),
        }
    }

    /// Pages of one chapter, or of the whole book in flat mode.
    pub fn pages_in(&self, chapter: usize) -> usize {
        match &self.layout {
            BookLayout::Chaptered(_) => self
                .chapter_chars
                .get(chapter)
                .map(|&chars| pages_for_len(chars, self.words_per_page))
                .unwrap_or(0),
            BookLayout::Flat(pages) => pages.len(),
        }
    }

    /// Pages across the whole book.
    pub fn total_pages(&self) -> usize {
        match &self.layout {
            BookLayout::Chaptered(_) => self
                .chapter_chars
                .iter()
                .map(|&chars| pages_for_len(chars, self.words_per_page))
                .sum(),
            BookLayout::Flat(pages) => pages.len(),
        }
    }

    /// Pull a possibly stale cursor back inside the book.
    pub fn clamp(&self, cursor: Cursor) -> Cursor {
        match &self.layout {
            BookLayout::Chaptered(chapters) => {
                let chapter = cursor.chapter.min(chapters.len().saturating_sub(1));
                let page = cursor.page.min(self.pages_in(chapter).saturating_sub(1));
                Cursor { chapter, page }
            }
            BookLayout::Flat(pages) => Cursor {
                chapter: 0,
                page: cursor.page.min(pages.len().saturating_sub(1)),
            },
        }
    }

    pub fn page_text(&self, cursor: Cursor) -> &str {
        let cursor = self.clamp(cursor);
        match &self.layout {
            BookLayout::Chaptered(chapters) => chapters
                .get(cursor.chapter)
                .and_then(|c| page_slice(&c.content, self.words_per_page, cursor.page))
                .unwrap_or(""),
            BookLayout::Flat(pages) => pages.get(cursor.page).map(String::as_str).unwrap_or(""),
        }
    }

    /// Next page, crossing into the following chapter; `None` at the end of the book.
    pub fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let cursor = self.clamp(cursor);
        if cursor.page + 1 < self.pages_in(cursor.chapter) {
            return Some(Cursor::new(cursor.chapter, cursor.page + 1));
        }
        if self.has_chapters() && cursor.chapter + 1 < self.chapter_count() {
            return Some(Cursor::new(cursor.chapter + 1, 0));
        }
        None
    }

    /// Previous page, landing on the last page of the previous chapter when crossing back.
    pub fn prev(&self, cursor: Cursor) -> Option<Cursor> {
        let cursor = self.clamp(cursor);
        if cursor.page > 0 {
            return Some(Cursor::new(cursor.chapter, cursor.page - 1));
        }
        if self.has_chapters() && cursor.chapter > 0 {
            let chapter = cursor.chapter - 1;
            let last = self.pages_in(chapter).saturating_sub(1);
            return Some(Cursor::new(chapter, last));
        }
        None
    }

    pub fn chapter_start(&self, chapter: usize) -> Option<Cursor> {
        (chapter < self.chapter_count()).then(|| Cursor::new(chapter, 0))
    }

    /// Cursor on the page holding the character at `percent` of the book.
    pub fn at_percent(&self, percent: f64) -> Cursor {
        let fraction = clamp_percent(percent) / 100.0;
        match &self.layout {
            BookLayout::Flat(pages) => {
                let last = pages.len().saturating_sub(1);
                let page = (fraction * last as f64).round() as usize;
                Cursor::new(0, page.min(last))
            }
            BookLayout::Chaptered(_) => {
                let total: usize = self.chapter_chars.iter().sum();
                let target = (fraction * total as f64).round() as usize;
                let mut before = 0;
                for (chapter, &len) in self.chapter_chars.iter().enumerate() {
                    let is_last = chapter + 1 == self.chapter_chars.len();
                    if target < before + len || is_last {
                        let page = target.saturating_sub(before) / self.words_per_page.get();
                        return self.clamp(Cursor::new(chapter, page));
                    }
                    before += len;
                }
                Cursor::default()
            }
        }
    }

    pub fn percentage(&self, cursor: Cursor) -> f64 {
        let cursor = self.clamp(cursor);
        match &self.layout {
            BookLayout::Chaptered(_) => chaptered_percentage(
                &self.chapter_chars,
                cursor.chapter,
                cursor.page,
                self.words_per_page,
            ),
            BookLayout::Flat(pages) => flat_percentage(cursor.page, pages.len()),
        }
    }
}
