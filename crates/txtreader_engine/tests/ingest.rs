use std::fs;
use std::num::NonZeroUsize;

use encoding_rs::GBK;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use txtreader_core::{HeadingRules, LoadFailure, PREFACE_TITLE};
use txtreader_engine::{load_book, read_file, DetectionSource, LoadError};

fn wpp(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn gbk_novel_loads_with_chapters() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("saga.txt");
    let text = "作者的话\n第一章 启程\n清晨出发。\n第二章 抵达\n夜里到了。\n";
    fs::write(&path, GBK.encode(text).0).unwrap();

    let loaded = load_book(&path, &HeadingRules::builtin(), wpp(2000)).unwrap();
    let book = &loaded.book;
    assert_eq!(loaded.detection, DetectionSource::Sample);
    assert_eq!(book.file_name(), "saga.txt");
    assert_eq!(book.encoding_label(), "GBK");
    assert_eq!(book.titles(), vec![PREFACE_TITLE, "第一章 启程", "第二章 抵达"]);
    assert_eq!(book.file_path(), Some(path.display().to_string().as_str()));
}

#[test]
fn headingless_text_loads_flat() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    fs::write(&path, "just some words without any heading at all").unwrap();

    let loaded = load_book(&path, &HeadingRules::builtin(), wpp(10)).unwrap();
    assert!(!loaded.book.has_chapters());
    assert_eq!(loaded.book.total_pages(), 5);
}

#[test]
fn missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("moved.txt");
    let err = load_book(&path, &HeadingRules::builtin(), wpp(2000)).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
    assert_eq!(err.to_failure(), LoadFailure::NotFound);
}

#[test]
fn directory_is_a_read_error() {
    let temp = TempDir::new().unwrap();
    let err = read_file(temp.path()).unwrap_err();
    assert!(matches!(err, LoadError::Read { .. }));
    assert!(matches!(err.to_failure(), LoadFailure::Unreadable(_)));
}
