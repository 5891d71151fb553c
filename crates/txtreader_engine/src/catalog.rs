//! Chapter-list discovery from a web table of contents.
use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::decode::decode_html;
use crate::fetch::{Fetcher, ProgressSink};
use crate::{CatalogEntry, EngineEvent, JobId, JobProgress, Stage};

pub const MAX_CATALOG_PAGES: usize = 50;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Containers that usually hold the chapter list, probed in order.
const CONTAINER_SELECTORS: &[&str] = &[
    "#list",
    ".list",
    ".catalog",
    ".chapter-list",
    ".book_list",
    ".directory",
    ".box_con",
    "#chapterlist",
];
/// A bare `div` must hold more links than this to count as the list.
const MIN_DIV_LINKS: usize = 20;
const FULL_CATALOG_MARKERS: &[&str] = &["查看更多", "全部章节", "完整目录"];
const NEXT_PAGE_MARKER: &str = "下一页";
const NAVIGATION_KEYWORDS: &[&str] = &[
    "首页", "登录", "注册", "上一页", "下一页", "返回", "加入书架", "投票", "留言", "下载", "更多",
    "直达", "底部",
];
const CHAPTER_LINK_PATTERNS: &[&str] = &[
    r"第[0-9一二三四五六七八九十百千]+[章回节]",
    r"^\d+[\.\s、]",
    r"^\d+$",
];

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub max_pages: usize,
    /// Pause after every visited page.
    pub page_delay: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            max_pages: MAX_CATALOG_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// What one table-of-contents page contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub next_page: Option<String>,
    pub full_catalog: Option<String>,
}

/// Crawl a table of contents breadth-first, following "next page" links.
/// Pages that fail to load are skipped; a failing start page yields nothing.
pub async fn crawl_catalog(
    fetcher: &dyn Fetcher,
    job_id: JobId,
    start_url: &str,
    settings: &CatalogSettings,
    sink: &dyn ProgressSink,
) -> Vec<CatalogEntry> {
    let Some((first_url, first_html)) = fetch_html(fetcher, job_id, start_url, sink).await else {
        return Vec::new();
    };
    let first_page = parse_catalog_page(&first_html, &first_url);

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    match first_page.full_catalog {
        Some(full) if full != start_url => {
            engine_info!("Following full catalog link {}", full);
            visited.insert(start_url.to_string());
            queue.push_back(full);
        }
        _ => queue.push_back(start_url.to_string()),
    }

    let mut entries: Vec<CatalogEntry> = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut pages = 0;
    while pages < settings.max_pages {
        let Some(url) = queue.pop_front() else {
            break;
        };
        if !visited.insert(url.clone()) {
            continue;
        }
        pages += 1;

        // The start page is already in hand.
        let fetched = if url == start_url {
            Some((first_url.clone(), first_html.clone()))
        } else {
            fetch_html(fetcher, job_id, &url, sink).await
        };
        let Some((page_url, html)) = fetched else {
            continue;
        };

        sink.emit(EngineEvent::Progress(JobProgress {
            url: Some(url.clone()),
            ..JobProgress::new(job_id, Stage::Parsing)
        }));
        let page = parse_catalog_page(&html, &page_url);
        let before = entries.len();
        for entry in page.entries {
            if seen_urls.insert(entry.url.clone()) {
                entries.push(entry);
            }
        }
        engine_debug!(
            "Catalog page {} ({}) added {} chapters",
            pages,
            url,
            entries.len() - before
        );
        sink.emit(EngineEvent::Progress(JobProgress {
            url: Some(url.clone()),
            entries: Some(entries.len()),
            ..JobProgress::new(job_id, Stage::Parsing)
        }));

        if let Some(next) = page.next_page {
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
        if !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }
    }

    engine_info!(
        "Catalog {} finished: {} chapters over {} pages",
        start_url,
        entries.len(),
        pages
    );
    sink.emit(EngineEvent::Progress(JobProgress {
        entries: Some(entries.len()),
        ..JobProgress::new(job_id, Stage::Done)
    }));
    entries
}

/// Returns the final URL and decoded page, or `None` after logging the failure.
async fn fetch_html(
    fetcher: &dyn Fetcher,
    job_id: JobId,
    url: &str,
    sink: &dyn ProgressSink,
) -> Option<(String, String)> {
    match fetcher.fetch(job_id, url, sink).await {
        Ok(output) => {
            let decoded = decode_html(&output.bytes, output.content_type.as_deref());
            engine_debug!("Fetched {} as {}", url, decoded.encoding_label);
            Some((output.final_url, decoded.text))
        }
        Err(err) => {
            engine_warn!("Skipping catalog page {}: {}", url, err);
            None
        }
    }
}

/// Extract chapter links plus the pagination and full-catalog links from one page.
pub fn parse_catalog_page(html: &str, page_url: &str) -> CatalogPage {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let Some(anchor) = selector("a") else {
        return CatalogPage::default();
    };

    let mut page = CatalogPage::default();
    for link in document.select(&anchor) {
        let text = link_text(link);
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if page.full_catalog.is_none()
            && FULL_CATALOG_MARKERS.iter().any(|marker| text.contains(marker))
        {
            page.full_catalog = resolve_url(href, base.as_ref());
        }
        if page.next_page.is_none() && text.contains(NEXT_PAGE_MARKER) {
            page.next_page = resolve_url(href, base.as_ref());
        }
    }

    let links: Vec<ElementRef> = match best_container(&document, &anchor) {
        Some(container) => container.select(&anchor).collect(),
        None => document.select(&anchor).collect(),
    };
    let mut seen = HashSet::new();
    for link in links {
        let text = link_text(link);
        if text.is_empty() || !is_chapter_link(&text) {
            continue;
        }
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_url(href, base.as_ref()))
        else {
            continue;
        };
        if seen.insert(url.clone()) {
            page.entries.push(CatalogEntry { title: text, url });
        }
    }
    page
}

fn best_container<'a>(document: &'a Html, anchor: &Selector) -> Option<ElementRef<'a>> {
    let mut best: Option<(ElementRef<'a>, usize)> = None;
    for css in CONTAINER_SELECTORS {
        let Some(sel) = selector(css) else {
            continue;
        };
        for container in document.select(&sel) {
            let count = container.select(anchor).count();
            if count > best.map_or(0, |(_, max)| max) {
                best = Some((container, count));
            }
        }
    }
    if best.is_none() {
        let div = selector("div")?;
        for container in document.select(&div) {
            let count = container.select(anchor).count();
            if count > MIN_DIV_LINKS && count > best.map_or(0, |(_, max)| max) {
                best = Some((container, count));
            }
        }
    }
    best.map(|(container, _)| container)
}

/// Navigation links are rejected; numbered titles are accepted; anything
/// else needs more than two characters.
pub fn is_chapter_link(text: &str) -> bool {
    if NAVIGATION_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        return false;
    }
    if chapter_link_patterns().iter().any(|re| re.is_match(text)) {
        return true;
    }
    text.chars().count() > 2
}

fn chapter_link_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CHAPTER_LINK_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn link_text(link: ElementRef) -> String {
    link.text().collect::<String>().trim().to_string()
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed == "#" {
        return None;
    }
    if trimmed.to_ascii_lowercase().starts_with("javascript") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::{is_chapter_link, resolve_url};
    use url::Url;

    #[test]
    fn chapter_link_heuristics() {
        assert!(is_chapter_link("第十二章 风起"));
        assert!(is_chapter_link("12、归来"));
        assert!(is_chapter_link("7"));
        assert!(is_chapter_link("天下大势"));
        assert!(!is_chapter_link("下一页"));
        assert!(!is_chapter_link("加入书架"));
        assert!(!is_chapter_link("序"));
    }

    #[test]
    fn script_and_fragment_links_are_not_followed() {
        let base = Url::parse("https://example.com/book/").ok();
        assert_eq!(resolve_url("javascript:void(0)", base.as_ref()), None);
        assert_eq!(resolve_url("#", base.as_ref()), None);
        assert_eq!(
            resolve_url("2.html", base.as_ref()),
            Some("https://example.com/book/2.html".to_string())
        );
    }
}
