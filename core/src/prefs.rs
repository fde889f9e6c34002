//! Locally persisted user preferences.
//!
//! # Design
//! `PreferenceStore` owns the in-memory copy of the author name reused
//! across anonymous posts and mirrors it into an injected `Storage` under
//! the `authorName` key. Storage is a capability: where none exists
//! (`UnavailableStorage`) the store keeps working in memory and only logs.
//! None of the three operations ever returns an error.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Persistent key of the saved author name.
pub const AUTHOR_NAME_KEY: &str = "authorName";

/// String key-value persistence.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Clones share the same map, so a second store built
/// over a clone behaves like a new session over the same persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> R,
    ) -> Result<R, StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("memory storage lock poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

/// Storage for execution contexts without persistence; every call fails
/// with `StorageError::Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// Storage in a JSON object file. A missing file reads as empty; writes go
/// through a temporary file in the same directory renamed over the target,
/// so the file is never left half-written.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(raw.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[cfg(feature = "web")]
pub use self::web::LocalStorage;

#[cfg(feature = "web")]
mod web {
    use super::Storage;
    use crate::error::StorageError;

    /// `window.localStorage`. Reports `Unavailable` outside a browser window
    /// or when the user agent denies access.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStorage;

    impl LocalStorage {
        fn storage() -> Result<web_sys::Storage, StorageError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or(StorageError::Unavailable)
        }
    }

    fn js_error(err: wasm_bindgen::JsValue) -> StorageError {
        StorageError::Backend(format!("{err:?}"))
    }

    impl Storage for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::storage()?.get_item(key).map_err(js_error)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::storage()?.set_item(key, value).map_err(js_error)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::storage()?.remove_item(key).map_err(js_error)
        }
    }
}

/// The saved author name, kept in step with `Storage`.
#[derive(Debug, Clone)]
pub struct PreferenceStore<S> {
    storage: S,
    saved_author_name: String,
}

impl<S: Storage> PreferenceStore<S> {
    /// Starts empty; call `load` to pick up a persisted name.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            saved_author_name: String::new(),
        }
    }

    pub fn author_name(&self) -> &str {
        &self.saved_author_name
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads the persisted name. A missing key yields `""`; a storage failure
    /// leaves the current value untouched.
    pub fn load(&mut self) {
        match self.storage.get(AUTHOR_NAME_KEY) {
            Ok(value) => self.saved_author_name = value.unwrap_or_default(),
            Err(e) => log_storage_failure("load", &e),
        }
    }

    pub fn save(&mut self, name: impl Into<String>) {
        self.saved_author_name = name.into();
        if let Err(e) = self.storage.set(AUTHOR_NAME_KEY, &self.saved_author_name) {
            log_storage_failure("save", &e);
        }
    }

    pub fn clear(&mut self) {
        self.saved_author_name.clear();
        if let Err(e) = self.storage.remove(AUTHOR_NAME_KEY) {
            log_storage_failure("clear", &e);
        }
    }
}

fn log_storage_failure(op: &str, err: &StorageError) {
    match err {
        StorageError::Unavailable => debug!(op, "preference storage unavailable"),
        other => warn!(op, error = %other, "preference storage failed"),
    }
}
