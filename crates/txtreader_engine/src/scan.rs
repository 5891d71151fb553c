use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DEFAULT_EXTENSION;

/// Directories nested deeper than this below the root are not visited.
pub const MAX_SCAN_DEPTH: usize = 10;

pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".idea",
    ".vscode",
    "$RECYCLE.BIN",
    "System Volume Information",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Compared case-insensitively, without the leading dot.
    pub extension: String,
    pub ignored_dirs: Vec<String>,
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::for_extension(DEFAULT_EXTENSION)
    }
}

impl ScanOptions {
    pub fn for_extension(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            ignored_dirs: IGNORED_DIRS.iter().map(|dir| dir.to_string()).collect(),
            max_depth: MAX_SCAN_DEPTH,
        }
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.ignored_dirs.iter().any(|dir| dir == name))
    }
}

/// Every matching file under `directory`, sorted. Unreadable entries are
/// skipped with a warning.
pub fn list_files(directory: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(directory)
        .max_depth(options.max_depth)
        .into_iter()
        .filter_entry(|entry| !options.is_ignored(entry));
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && options.wants(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => {
                let at = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| directory.display().to_string());
                engine_warn!("Skipping {}: {}", at, err);
            }
        }
    }
    files.sort();
    engine_debug!("Found {} files under {}", files.len(), directory.display());
    files
}

/// First file named `file_name` under any of `search_paths`, in order.
pub fn locate_book<P: AsRef<Path>>(
    file_name: &str,
    search_paths: &[P],
    options: &ScanOptions,
) -> Option<PathBuf> {
    search_paths.iter().find_map(|root| {
        WalkDir::new(root.as_ref())
            .max_depth(options.max_depth)
            .into_iter()
            .filter_entry(|entry| !options.is_ignored(entry))
            .filter_map(Result::ok)
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(DirEntry::into_path)
    })
}
