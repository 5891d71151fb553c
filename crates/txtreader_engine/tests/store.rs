use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use txtreader_core::ProgressMap;
use txtreader_engine::{
    FsStateStore, MemoryStateStore, ReaderConfig, Repository, StateStore, StoreError, CONFIG_KEY,
    PROGRESS_KEY,
};

#[test]
fn fs_store_keeps_one_json_file_per_key() {
    let temp = TempDir::new().unwrap();
    let store = FsStateStore::new(temp.path());
    assert_eq!(store.get("history").unwrap(), None);

    store.set("history", "[]").unwrap();
    assert_eq!(store.get("history").unwrap().as_deref(), Some("[]"));
    assert!(temp.path().join("history.json").is_file());
}

#[test]
fn keys_cannot_escape_the_state_dir() {
    let temp = TempDir::new().unwrap();
    let store = FsStateStore::new(temp.path());
    assert!(matches!(
        store.set("../outside", "{}"),
        Err(StoreError::InvalidKey(_))
    ));
    assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
}

#[test]
fn missing_and_corrupt_documents_read_as_default() {
    engine_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let repo = Repository::new(FsStateStore::new(temp.path()));
    assert_eq!(repo.read::<ProgressMap>(PROGRESS_KEY), ProgressMap::new());

    fs::write(temp.path().join("progress.json"), "{ not json").unwrap();
    assert_eq!(repo.read::<ProgressMap>(PROGRESS_KEY), ProgressMap::new());

    let config: ReaderConfig = repo.read(CONFIG_KEY);
    assert_eq!(config, ReaderConfig::default());
    assert_eq!(config.words_per_page().get(), 2000);
    assert_eq!(config.extension, "txt");
}

#[test]
fn modify_replaces_garbage_but_not_mismatched_json() {
    engine_logging::initialize_for_tests();
    let store = MemoryStateStore::new();
    store.set(PROGRESS_KEY, "{ not json").unwrap();
    store.set("counters", r#"{"total": "many"}"#).unwrap();
    let repo = Repository::new(store);

    repo.modify(PROGRESS_KEY, |progress: &mut ProgressMap| progress.len())
        .unwrap();
    assert_eq!(repo.store().get(PROGRESS_KEY).unwrap().as_deref(), Some("{}"));

    let mut ran = false;
    let result = repo.modify("counters", |counts: &mut BTreeMap<String, u64>| {
        ran = true;
        counts.clear();
    });
    assert!(matches!(result, Err(StoreError::Incompatible { .. })));
    assert!(!ran);
    assert_eq!(
        repo.store().get("counters").unwrap().as_deref(),
        Some(r#"{"total": "many"}"#)
    );
    // Plain reads still fall back to the default.
    assert!(repo.read::<BTreeMap<String, u64>>("counters").is_empty());
}

#[test]
fn config_rewrite_keeps_foreign_fields() {
    let store = MemoryStateStore::new();
    store
        .set(
            CONFIG_KEY,
            &json!({
                "searchPaths": ["/books"],
                "wordsPerPage": 0,
                "theme": {"name": "sepia", "fontSize": 18},
                "windowBounds": {"width": 800}
            })
            .to_string(),
        )
        .unwrap();
    let repo = Repository::new(store);

    repo.modify(CONFIG_KEY, |config: &mut ReaderConfig| {
        config.search_paths.push("/more".to_string());
    })
    .unwrap();

    let raw = repo.store().get(CONFIG_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["searchPaths"], json!(["/books", "/more"]));
    assert_eq!(value["theme"], json!({"name": "sepia", "fontSize": 18}));
    assert_eq!(value["windowBounds"], json!({"width": 800}));

    // Zero is not a usable page size.
    let config: ReaderConfig = repo.read(CONFIG_KEY);
    assert_eq!(config.words_per_page().get(), 2000);
}

#[test]
fn custom_heading_patterns_replace_the_builtin_rules() {
    let config = ReaderConfig {
        heading_patterns: vec![r"^Part \d+$".to_string()],
        ..ReaderConfig::default()
    };
    let rules = config.heading_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert!(rules.is_heading("Part 3"));
    assert!(!rules.is_heading("第三章 风起"));

    let broken = ReaderConfig {
        heading_patterns: vec!["(".to_string()],
        ..ReaderConfig::default()
    };
    assert!(broken.heading_rules().is_err());
}

#[test]
fn concurrent_modify_loses_no_updates() {
    let repo = Arc::new(Repository::new(MemoryStateStore::new()));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let repo = repo.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    repo.modify("counters", |counts: &mut BTreeMap<String, u64>| {
                        *counts.entry(format!("w{worker}")).or_default() += 1;
                        *counts.entry("total".to_string()).or_default() += 1;
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let counts: BTreeMap<String, u64> = repo.read("counters");
    assert_eq!(counts["total"], 400);
    assert_eq!(counts["w3"], 50);
}
