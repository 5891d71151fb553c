//! Named JSON documents over a pluggable `{get, set}` backend.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use engine_logging::{engine_debug, engine_warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

pub const CONFIG_KEY: &str = "config";
pub const PROGRESS_KEY: &str = "progress";
pub const HISTORY_KEY: &str = "history";
pub const DELETED_KEY: &str = "deleted";
pub const SAMPLER_KEY: &str = "sampler";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid state key {0:?}")]
    InvalidKey(String),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// Well-formed JSON that does not fit the expected shape; left untouched.
    #[error("refusing to overwrite {key}: {source}")]
    Incompatible {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw storage for named documents.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, contents: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per document, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FsStateStore {
    files: AtomicFileWriter,
}

impl FsStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            files: AtomicFileWriter::new(dir.into()),
        }
    }

    pub fn dir(&self) -> &std::path::Path {
        self.files.dir()
    }

    fn file_name(key: &str) -> Result<String, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(format!("{key}.json"))
        } else {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }
}

impl StateStore for FsStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.files.read(&Self::file_name(key)?)?)
    }

    fn set(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        self.files.write(&Self::file_name(key)?, contents)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    docs: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(key).cloned())
    }

    fn set(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

/// Typed access to a [`StateStore`]. Read-modify-write cycles on the same key
/// are serialized within the process.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: StateStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Missing, unreadable or corrupt documents read as `T::default()`.
    pub fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load(key)
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save(key, value)
    }

    /// Read, mutate and write back `key` while holding its lock.
    ///
    /// Unparseable text is replaced by `T::default()`. A document that parses
    /// as JSON but not as `T` is never overwritten: the call fails with
    /// [`StoreError::Incompatible`] and `f` does not run.
    pub fn modify<T, R, F>(&self, key: &str, f: F) -> Result<R, StoreError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut value: T = self.load_for_update(key)?;
        let result = f(&mut value);
        self.save(key, &value)?;
        Ok(result)
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                engine_warn!("Failed to read state {}: {}", key, err);
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                engine_warn!("Ignoring corrupt state {}: {}", key, err);
                T::default()
            }
        }
    }

    fn load_for_update<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StoreError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) if err.is_data() => {
                engine_warn!("State {} has an unexpected shape, not rewriting it: {}", key, err);
                Err(StoreError::Incompatible {
                    key: key.to_string(),
                    source: err,
                })
            }
            Err(err) => {
                engine_warn!("Replacing corrupt state {}: {}", key, err);
                Ok(T::default())
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &contents)?;
        engine_debug!("Saved state {} ({} bytes)", key, contents.len());
        Ok(())
    }
}
