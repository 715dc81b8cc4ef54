//! Recent files, favorites and preferences
//!
//! [`AppStore`] keeps the state in memory and writes the affected key
//! through its [`KeyValueStore`] after every mutation. A failed write is
//! logged and the in-memory change stands.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::ClientError;

pub const MAX_RECENT_FILES: usize = 20;

pub const RECENT_FILES_KEY: &str = "recentFiles";
pub const FAVORITES_KEY: &str = "favorites";
pub const DARK_MODE_KEY: &str = "darkMode";

/// String key/value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&mut self, key: &str) -> Result<(), ClientError>;
}

/// One JSON file per key in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the old value
    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        self.values.remove(key);
        Ok(())
    }
}

/// A file produced by an operation, as listed on the recent-files screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub operation: String,
}

impl RecentFile {
    /// A new entry with a fresh id, created now
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        size: u64,
        file_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            uri: uri.into(),
            size,
            file_type: file_type.into(),
            created_at: Utc::now(),
            operation: operation.into(),
        }
    }
}

pub struct AppStore<S: KeyValueStore> {
    backend: S,
    recent_files: Vec<RecentFile>,
    favorites: Vec<String>,
    dark_mode: bool,
    online: bool,
}

impl<S: KeyValueStore> AppStore<S> {
    /// Empty state over `backend`, without reading it
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            recent_files: Vec::new(),
            favorites: Vec::new(),
            dark_mode: false,
            online: true,
        }
    }

    /// Read every persisted key once
    ///
    /// Missing keys keep their defaults. An unreadable or corrupt value is
    /// logged and ignored.
    pub fn load(backend: S) -> Self {
        let mut store = Self::new(backend);
        if let Some(mut recent) = store.read::<Vec<RecentFile>>(RECENT_FILES_KEY) {
            recent.truncate(MAX_RECENT_FILES);
            store.recent_files = recent;
        }
        if let Some(favorites) = store.read(FAVORITES_KEY) {
            store.favorites = favorites;
        }
        if let Some(dark_mode) = store.read(DARK_MODE_KEY) {
            store.dark_mode = dark_mode;
        }
        debug!(
            "Loaded {} recent files, {} favorites",
            store.recent_files.len(),
            store.favorites.len()
        );
        store
    }

    pub fn recent_files(&self) -> &[RecentFile] {
        &self.recent_files
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f == id)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Put `file` first, replacing any entry with the same id, and keep at most 20
    pub fn add_recent_file(&mut self, file: RecentFile) {
        self.recent_files.retain(|f| f.id != file.id);
        self.recent_files.insert(0, file);
        self.recent_files.truncate(MAX_RECENT_FILES);
        persist(&mut self.backend, RECENT_FILES_KEY, &self.recent_files);
    }

    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
        if let Err(e) = self.backend.remove(RECENT_FILES_KEY) {
            error!("Failed to clear {}: {}", RECENT_FILES_KEY, e);
        }
    }

    /// Flip `id` in the favorites; returns whether it is now a favorite
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let now_favorite = match self.favorites.iter().position(|f| f == id) {
            Some(index) => {
                self.favorites.remove(index);
                false
            }
            None => {
                self.favorites.push(id.to_string());
                true
            }
        };
        persist(&mut self.backend, FAVORITES_KEY, &self.favorites);
        now_favorite
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        persist(&mut self.backend, DARK_MODE_KEY, &self.dark_mode);
        self.dark_mode
    }

    /// Connectivity is session state and is not persisted
    pub fn set_online_status(&mut self, online: bool) {
        self.online = online;
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt value for {}: {}", key, e);
                None
            }
        }
    }
}

fn persist<S: KeyValueStore, T: Serialize + ?Sized>(backend: &mut S, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(ClientError::from)
        .and_then(|json| backend.set(key, &json));
    if let Err(e) = result {
        error!("Failed to persist {}: {}", key, e);
    }
}
