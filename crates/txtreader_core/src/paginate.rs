use std::num::NonZeroUsize;

/// Default page size in characters.
pub const DEFAULT_WORDS_PER_PAGE: usize = 2000;

pub fn default_words_per_page() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WORDS_PER_PAGE).unwrap_or(NonZeroUsize::MIN)
}

pub fn char_len(content: &str) -> usize {
    content.chars().count()
}

/// `ceil(chars / words_per_page)`, never less than one page.
pub fn page_count(content: &str, words_per_page: NonZeroUsize) -> usize {
    pages_for_len(char_len(content), words_per_page)
}

pub(crate) fn pages_for_len(chars: usize, words_per_page: NonZeroUsize) -> usize {
    chars.div_ceil(words_per_page.get()).max(1)
}

/// Characters `[index * wpp, (index + 1) * wpp)` of `content`.
pub fn page_slice(content: &str, words_per_page: NonZeroUsize, index: usize) -> Option<&str> {
    if index >= page_count(content, words_per_page) {
        return None;
    }
    let wpp = words_per_page.get();
    let start = byte_offset(content, index * wpp);
    let end = start + byte_offset(&content[start..], wpp);
    Some(&content[start..end])
}

fn byte_offset(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len())
}

/// Split once into owned pages; used when the document has no chapters.
pub fn split_pages(content: &str, words_per_page: NonZeroUsize) -> Vec<String> {
    let wpp = words_per_page.get();
    let mut pages = Vec::with_capacity(page_count(content, words_per_page));
    let mut current = String::new();
    let mut chars_in_page = 0;
    for ch in content.chars() {
        current.push(ch);
        chars_in_page += 1;
        if chars_in_page == wpp {
            pages.push(std::mem::take(&mut current));
            chars_in_page = 0;
        }
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// Share of characters before the cursor, counting the current chapter up to
/// `min(page * wpp, chapter length)`.
pub fn chaptered_percentage(
    chapter_chars: &[usize],
    chapter: usize,
    page: usize,
    words_per_page: NonZeroUsize,
) -> f64 {
    let total: usize = chapter_chars.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let chapter = chapter.min(chapter_chars.len().saturating_sub(1));
    let prior: usize = chapter_chars[..chapter].iter().sum();
    let current_len = chapter_chars.get(chapter).copied().unwrap_or(0);
    let within = page.saturating_mul(words_per_page.get()).min(current_len);
    clamp_percent((prior + within) as f64 / total as f64 * 100.0)
}

pub fn flat_percentage(page: usize, total_pages: usize) -> f64 {
    match total_pages {
        0 => 0.0,
        1 => 100.0,
        n => clamp_percent(page as f64 / (n - 1) as f64 * 100.0),
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else if value > 100.0 {
        100.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::{byte_offset, clamp_percent};

    #[test]
    fn byte_offset_counts_chars_not_bytes() {
        assert_eq!(byte_offset("第一章", 1), 3);
        assert_eq!(byte_offset("ab", 5), 2);
    }

    #[test]
    fn clamp_handles_nan_and_range() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }
}
