/*
 * This module owns the canonical record collections. Two named collections,
 * `ipo-applications` and `ipo-names`, are kept as JSON arrays in a key-value
 * medium abstracted by `KeyValueStorage`. On top of that medium,
 * `IpoStoreOperations` offers bulk get/save plus add and delete-by-id for each
 * collection; every add/delete is a full read-modify-write of the collection.
 *
 * Reads never fail: a missing medium, a missing key, or data that no longer
 * parses is reported as an empty collection (with a warning for the latter).
 * Writes replace the whole collection and surface failures as `StoreError`.
 *
 * Two media are provided: `FileKeyValueStorage` (one `<key>.json` file per
 * collection in the user's data directory) and, for tests,
 * `InMemoryKeyValueStorage`.
 */
use super::models::{IpoApplication, IpoName, NewIpoApplication};
use super::path_utils;
use serde::Serialize;
use serde::de::DeserializeOwned;
#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

pub const APPLICATIONS_KEY: &str = "ipo-applications";
pub const IPO_NAMES_KEY: &str = "ipo-names";
pub const STORAGE_FILE_EXTENSION: &str = "json";
const TEMP_FILE_SUFFIX: &str = "tmp";

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoStorageDirectory,
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Storage I/O error: {e}"),
            StoreError::Serde(e) => write!(f, "Storage serialization error: {e}"),
            StoreError::NoStorageDirectory => {
                write!(f, "Could not determine a storage directory for records")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serde(e) => Some(e),
            StoreError::NoStorageDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/*
 * The durable key-value medium under the store. `read` returns `None` both for
 * an absent key and for a medium that is not reachable; `write` replaces the
 * value for `key` as a whole.
 */
pub trait KeyValueStorage: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/*
 * Stores each key as `<dir>/<key>.json`. A storage without a directory behaves
 * like an environment with no storage access: reads are empty, writes fail.
 */
pub struct FileKeyValueStorage {
    dir: Option<PathBuf>,
}

impl FileKeyValueStorage {
    pub fn new(dir: Option<PathBuf>) -> Self {
        FileKeyValueStorage { dir }
    }

    /// Storage rooted in the platform's local data directory for `app_name`.
    pub fn for_app(app_name: &str) -> Self {
        Self::new(path_utils::get_base_app_data_local_dir(app_name))
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn file_path_for_key(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{key}.{STORAGE_FILE_EXTENSION}"))
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn read(&self, key: &str) -> Option<String> {
        let Some(dir) = self.dir.as_deref() else {
            log::debug!("FileKeyValueStorage: No storage directory, '{key}' reads as absent.");
            return None;
        };
        let file_path = Self::file_path_for_key(dir, key);
        if !file_path.exists() {
            log::trace!("FileKeyValueStorage: {file_path:?} does not exist yet.");
            return None;
        }
        match fs::read_to_string(&file_path) {
            Ok(contents) => {
                log::trace!(
                    "FileKeyValueStorage: Read {} bytes from {file_path:?}.",
                    contents.len()
                );
                Some(contents)
            }
            Err(e) => {
                log::error!("FileKeyValueStorage: Failed to read {file_path:?}: {e}");
                None
            }
        }
    }

    /*
     * Writes to a sibling temp file first and renames it over the target, so a
     * concurrent reader sees either the old collection or the new one.
     */
    fn write(&self, key: &str, value: &str) -> Result<()> {
        let dir = self
            .dir
            .as_deref()
            .and_then(path_utils::ensure_dir)
            .ok_or(StoreError::NoStorageDirectory)?;
        let file_path = Self::file_path_for_key(&dir, key);
        let temp_path = file_path.with_extension(format!(
            "{STORAGE_FILE_EXTENSION}.{TEMP_FILE_SUFFIX}"
        ));

        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        log::debug!(
            "FileKeyValueStorage: Wrote {} bytes to {file_path:?}.",
            value.len()
        );
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryKeyValueStorage {
    entries: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl InMemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStorage for InMemoryKeyValueStorage {
    fn read(&self, key: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub trait IpoStoreOperations: Send + Sync {
    fn get_applications(&self) -> Vec<IpoApplication>;
    fn save_applications(&self, applications: &[IpoApplication]) -> Result<()>;
    fn add_application(&self, new_application: NewIpoApplication) -> Result<IpoApplication>;
    fn delete_application(&self, id: &str) -> Result<()>;

    fn get_ipo_names(&self) -> Vec<IpoName>;
    fn save_ipo_names(&self, names: &[IpoName]) -> Result<()>;
    fn add_ipo_name(&self, name: &str) -> Result<IpoName>;
    fn delete_ipo_name(&self, id: &str) -> Result<()>;
}

pub struct CoreIpoStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> CoreIpoStore<S> {
    pub fn new(storage: S) -> Self {
        CoreIpoStore { storage }
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    // Millisecond precision, matching ISO-8601 timestamps produced elsewhere.
    fn now() -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        now.replace_millisecond(now.millisecond()).unwrap_or(now)
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.storage.read(key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                log::trace!("CoreIpoStore: Loaded {} entries from '{key}'.", items.len());
                items
            }
            Err(e) => {
                log::warn!(
                    "CoreIpoStore: Stored data for '{key}' is unreadable, treating it as empty: {e}"
                );
                Vec::new()
            }
        }
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.storage.write(key, &raw).inspect_err(|e| {
            log::error!("CoreIpoStore: Failed to persist '{key}': {e}");
        })?;
        log::debug!("CoreIpoStore: Persisted {} entries to '{key}'.", items.len());
        Ok(())
    }

    /*
     * Removes the first entry whose id matches. Returns whether anything was
     * removed; when nothing matched the stored collection is left untouched.
     */
    fn delete_from_collection<T, F>(&self, key: &str, id: &str, id_of: F) -> Result<bool>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> &str,
    {
        let mut items: Vec<T> = self.read_collection(key);
        let Some(position) = items.iter().position(|item| id_of(item) == id) else {
            log::debug!("CoreIpoStore: No entry with id '{id}' in '{key}', nothing to delete.");
            return Ok(false);
        };
        items.remove(position);
        self.write_collection(key, &items)?;
        Ok(true)
    }
}

impl<S: KeyValueStorage> IpoStoreOperations for CoreIpoStore<S> {
    fn get_applications(&self) -> Vec<IpoApplication> {
        self.read_collection(APPLICATIONS_KEY)
    }

    fn save_applications(&self, applications: &[IpoApplication]) -> Result<()> {
        self.write_collection(APPLICATIONS_KEY, applications)
    }

    fn add_application(&self, new_application: NewIpoApplication) -> Result<IpoApplication> {
        let application = IpoApplication::from_new(new_application, Self::new_id(), Self::now());
        let mut applications = self.get_applications();
        applications.push(application.clone());
        self.save_applications(&applications)?;
        log::info!(
            "CoreIpoStore: Added application '{}' for IPO '{}'.",
            application.id,
            application.ipo_name
        );
        Ok(application)
    }

    fn delete_application(&self, id: &str) -> Result<()> {
        if self.delete_from_collection(APPLICATIONS_KEY, id, |a: &IpoApplication| a.id.as_str())? {
            log::info!("CoreIpoStore: Deleted application '{id}'.");
        }
        Ok(())
    }

    fn get_ipo_names(&self) -> Vec<IpoName> {
        self.read_collection(IPO_NAMES_KEY)
    }

    fn save_ipo_names(&self, names: &[IpoName]) -> Result<()> {
        self.write_collection(IPO_NAMES_KEY, names)
    }

    fn add_ipo_name(&self, name: &str) -> Result<IpoName> {
        let ipo_name = IpoName {
            id: Self::new_id(),
            name: name.trim().to_string(),
            created_at: Self::now(),
        };
        let mut names = self.get_ipo_names();
        names.push(ipo_name.clone());
        self.save_ipo_names(&names)?;
        log::info!("CoreIpoStore: Added IPO name '{}'.", ipo_name.name);
        Ok(ipo_name)
    }

    fn delete_ipo_name(&self, id: &str) -> Result<()> {
        if self.delete_from_collection(IPO_NAMES_KEY, id, |n: &IpoName| n.id.as_str())? {
            log::info!("CoreIpoStore: Deleted IPO name '{id}'.");
        }
        Ok(())
    }
}
