use std::fmt;

use regex::Regex;

/// Lines inspected before giving up on finding any heading.
pub const PRESCAN_LINE_LIMIT: usize = 2000;
/// Trimmed lines of this many characters or more are never headings.
pub const MAX_HEADING_CHARS: usize = 50;
/// Title of the chapter holding text that precedes the first heading.
pub const PREFACE_TITLE: &str = "开始";

const CJK_NUMERALS: &str = "0-9０-９零〇一二三四五六七八九十百千万两";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("invalid heading pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("chapter spans do not tile the text (mismatch at byte {offset})")]
    BrokenSpans { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    /// Exact slice of the source text, heading line included.
    pub content: String,
    pub index: usize,
    pub opened_by_heading: bool,
}

impl Chapter {
    /// Content after the heading line; the whole content for the preface.
    pub fn body(&self) -> &str {
        if !self.opened_by_heading {
            return &self.content;
        }
        match self.content.find('\n') {
            Some(idx) => &self.content[idx + 1..],
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segmentation {
    pub chapters: Vec<Chapter>,
    pub no_chapters: bool,
}

impl Segmentation {
    fn none() -> Self {
        Self {
            chapters: Vec::new(),
            no_chapters: true,
        }
    }
}

/// A single rule recognising a trimmed line as a chapter heading.
pub trait HeadingMatcher: Send + Sync + fmt::Debug {
    fn matches(&self, line: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct RegexHeading {
    regex: Regex,
}

impl RegexHeading {
    pub fn new(pattern: &str) -> Result<Self, SegmentError> {
        let regex = Regex::new(pattern).map_err(|err| SegmentError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { regex })
    }
}

impl HeadingMatcher for RegexHeading {
    fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Ordered set of heading matchers plus the length cap applied before any of them run.
#[derive(Debug)]
pub struct HeadingRules {
    matchers: Vec<Box<dyn HeadingMatcher>>,
    max_chars: usize,
}

impl HeadingRules {
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
            max_chars: MAX_HEADING_CHARS,
        }
    }

    /// Numbered Chinese and English chapter markers, bracketed markers and the
    /// prologue/epilogue vocabulary.
    pub fn builtin() -> Self {
        let mut rules = Self::empty();
        for heading in builtin_patterns().iter().filter_map(|p| RegexHeading::new(p).ok()) {
            rules.push(heading);
        }
        rules
    }

    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, SegmentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::empty();
        for pattern in patterns {
            rules.push(RegexHeading::new(pattern.as_ref())?);
        }
        Ok(rules)
    }

    pub fn with_matcher(mut self, matcher: impl HeadingMatcher + 'static) -> Self {
        self.push(matcher);
        self
    }

    pub fn push(&mut self, matcher: impl HeadingMatcher + 'static) {
        self.matchers.push(Box::new(matcher));
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn is_heading(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.chars().take(self.max_chars).count() >= self.max_chars {
            return false;
        }
        self.matchers.iter().any(|m| m.matches(trimmed))
    }
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A well-formed Roman numeral, so words such as "did" or "mid" are not one.
const ROMAN: &str = "m{0,3}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})";

fn builtin_patterns() -> Vec<String> {
    let n = CJK_NUMERALS;
    vec![
        format!(r"^第\s*[{n}]+\s*[章回节卷集部篇]"),
        format!(r"(?i)^(?:chapter|chap\.)(?:\s*\d+|\s+{ROMAN})(?:\s|[:.：,，]|$)"),
        format!(
            r"^[【\[〖]\s*(?:第\s*[{n}]+\s*[章回节卷]|(?i:chapter)\s*\d+)[^】\]〗]*[】\]〗]"
        ),
        format!(r"^卷\s*[{n}]+"),
        r"^(?:序章|序言|楔子|引子|前言|尾声|后记|番外|终章|附录|完本感言)".to_string(),
        r"^序(?:\s|[:：]|$)".to_string(),
        r"(?i)^(?:prologue|epilogue|afterword|appendix|preface)\b".to_string(),
    ]
}

/// Line slices with their byte offset; each slice keeps its line terminator.
fn line_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, line)
    })
}

fn prescan(text: &str, rules: &HeadingRules) -> bool {
    text.split('\n')
        .take(PRESCAN_LINE_LIMIT)
        .any(|line| rules.is_heading(line))
}

/// Split `text` into chapters at heading lines.
///
/// Returns `no_chapters = true` when none of the first
/// [`PRESCAN_LINE_LIMIT`] lines is a heading. Otherwise the chapter contents
/// tile `text` exactly.
pub fn segment(text: &str, rules: &HeadingRules) -> Result<Segmentation, SegmentError> {
    if !prescan(text, rules) {
        return Ok(Segmentation::none());
    }

    let mut chapters: Vec<Chapter> = Vec::new();
    let mut open: Option<(String, usize)> = None;

    for (offset, line) in line_spans(text) {
        if !rules.is_heading(line) {
            continue;
        }
        match open.take() {
            Some((title, start)) => push_chapter(&mut chapters, title, &text[start..offset], true),
            None if offset > 0 => {
                push_chapter(&mut chapters, PREFACE_TITLE.to_string(), &text[..offset], false)
            }
            None => {}
        }
        open = Some((line.trim().to_string(), offset));
    }

    match open {
        Some((title, start)) => push_chapter(&mut chapters, title, &text[start..], true),
        None => push_chapter(&mut chapters, PREFACE_TITLE.to_string(), text, false),
    }

    verify_spans(text, &chapters)?;
    Ok(Segmentation {
        chapters,
        no_chapters: false,
    })
}

fn push_chapter(chapters: &mut Vec<Chapter>, title: String, content: &str, opened_by_heading: bool) {
    let index = chapters.len();
    chapters.push(Chapter {
        title,
        content: content.to_string(),
        index,
        opened_by_heading,
    });
}

fn verify_spans(text: &str, chapters: &[Chapter]) -> Result<(), SegmentError> {
    let mut pos = 0;
    for chapter in chapters {
        if !text[pos..].starts_with(chapter.content.as_str()) {
            return Err(SegmentError::BrokenSpans { offset: pos });
        }
        pos += chapter.content.len();
    }
    if pos != text.len() {
        return Err(SegmentError::BrokenSpans { offset: pos });
    }
    Ok(())
}
