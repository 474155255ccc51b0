//! Locally persisted user identity.
//!
//! The signed-in user's id lives in a small key-value store under
//! `userId`. Before any user exists the client still has to address the
//! backend, so a missing id resolves to `UserIdentity::Default`, whose id is
//! `DEFAULT_USER_ID`.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::types::UserId;

pub const USER_ID_KEY: &str = "userId";
pub const DEFAULT_USER_ID: &str = "1";

/// String key-value persistence, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Who the client is acting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    Stored(UserId),
    /// No id stored yet.
    Default,
}

impl UserIdentity {
    pub fn id(&self) -> UserId {
        match self {
            UserIdentity::Stored(id) => id.clone(),
            UserIdentity::Default => UserId::new(DEFAULT_USER_ID),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, UserIdentity::Default)
    }
}

/// Read the stored identity. Never fails: an absent or blank value is
/// `UserIdentity::Default`.
pub fn current_user_id(store: &dyn KeyValueStore) -> UserIdentity {
    match store.get(USER_ID_KEY) {
        Some(id) if !id.trim().is_empty() => UserIdentity::Stored(UserId::new(id)),
        _ => UserIdentity::Default,
    }
}

pub fn set_current_user_id(store: &dyn KeyValueStore, id: &UserId) -> Result<(), StoreError> {
    store.set(USER_ID_KEY, id.as_str())
}

pub fn clear_current_user_id(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(USER_ID_KEY)
}

/// In-process store. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object in a single file.
///
/// Reads go to disk every time so values written by another process are
/// seen. A missing or unreadable file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/daybook/storage.json`, or `./daybook-storage.json` when
    /// the platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("daybook").join("storage.json"))
            .unwrap_or_else(|| PathBuf::from("daybook-storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read local storage");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "local storage is corrupt, ignoring");
            BTreeMap::new()
        })
    }

    /// Replace the file atomically: a crash mid-write leaves the previous
    /// contents in place.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(entries)?;
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(json.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
