use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use txtreader_core::SamplerBook;
use txtreader_engine::{
    MemoryStateStore, RandomSampler, Repository, ResetScope, ScanOptions, SAMPLER_KEY,
};

fn shelf(names: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for name in names {
        fs::write(temp.path().join(name), "text").unwrap();
    }
    temp
}

fn sampler() -> (Arc<Repository<MemoryStateStore>>, RandomSampler<MemoryStateStore>) {
    let repo = Arc::new(Repository::new(MemoryStateStore::new()));
    let sampler = RandomSampler::new(repo.clone(), ScanOptions::default());
    (repo, sampler)
}

#[test]
fn draws_every_book_once_before_repeating() {
    let temp = shelf(&["a.txt", "b.txt", "c.txt"]);
    let (repo, sampler) = sampler();

    let picks: BTreeSet<PathBuf> = (0..3)
        .map(|i| sampler.draw(temp.path(), i).unwrap().unwrap())
        .collect();
    assert_eq!(picks.len(), 3);

    let book: SamplerBook = repo.read(SAMPLER_KEY);
    let state = &book[&temp.path().to_string_lossy().into_owned()];
    assert_eq!(state.drawn.len(), 3);
    assert_eq!(state.timestamp, 2);

    // Exhausted: the next draw starts a fresh round.
    assert!(sampler.draw(temp.path(), 3).unwrap().is_some());
    let book: SamplerBook = repo.read(SAMPLER_KEY);
    assert_eq!(book.values().next().unwrap().drawn.len(), 1);
}

#[test]
fn new_file_resets_the_round() {
    let temp = shelf(&["a.txt", "b.txt"]);
    let (repo, sampler) = sampler();
    sampler.draw(temp.path(), 1).unwrap();

    fs::write(temp.path().join("c.txt"), "text").unwrap();
    sampler.draw(temp.path(), 2).unwrap();

    let book: SamplerBook = repo.read(SAMPLER_KEY);
    let state = book.values().next().unwrap();
    assert_eq!(state.all_known.len(), 3);
    assert_eq!(state.drawn.len(), 1);
}

#[test]
fn empty_directory_draws_nothing() {
    let temp = shelf(&["readme.md"]);
    let (_, sampler) = sampler();
    assert_eq!(sampler.draw(temp.path(), 1).unwrap(), None);
}

#[test]
fn reset_clears_one_directory_or_all() {
    let first = shelf(&["a.txt", "b.txt"]);
    let second = shelf(&["c.txt", "d.txt"]);
    let (repo, sampler) = sampler();
    sampler.draw(first.path(), 1).unwrap();
    sampler.draw(second.path(), 2).unwrap();

    sampler
        .reset(&ResetScope::Directory(first.path().to_path_buf()))
        .unwrap();
    let book: SamplerBook = repo.read(SAMPLER_KEY);
    let drawn: Vec<usize> = [first.path(), second.path()]
        .iter()
        .map(|dir| book[&dir.to_string_lossy().into_owned()].drawn.len())
        .collect();
    assert_eq!(drawn, vec![0, 1]);

    sampler.reset(&ResetScope::All).unwrap();
    let book: SamplerBook = repo.read(SAMPLER_KEY);
    assert!(book.values().all(|state| state.drawn.is_empty()));
    assert!(book.values().all(|state| state.all_known.len() == 2));
}
