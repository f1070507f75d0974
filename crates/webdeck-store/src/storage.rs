//! Swappable persistence backends for the snapshot.
//!
//! Writes are last-writer-wins; concurrent writers (two sessions over
//! the same file) are not coordinated.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use webdeck_common::StorageError;

/// Key-value persistence for snapshot strings.
pub trait StorageBackend: Send {
    /// Read the stored value for `key`, `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend. Used as the silent fallback when durable storage
/// is unavailable, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed storage: each key is a JSON file under a base directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at the platform data directory.
    pub fn new() -> Result<Self, StorageError> {
        let dir = dirs::data_dir().ok_or(StorageError::NoPath)?.join("webdeck");
        Self::at(dir)
    }

    /// Storage rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Write via a sibling temp file so a crash mid-write cannot
        // leave a truncated snapshot behind.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }
}

/// Open the durable file store, silently degrading to memory-only when
/// it is unavailable. The session keeps working for the lifetime of the
/// process either way.
pub fn open_default_storage() -> Box<dyn StorageBackend> {
    match FileStorage::new() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            warn!(error = %e, "durable storage unavailable, using memory store");
            Box::new(MemoryStorage::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let mut store = MemoryStorage::new();
        assert_eq!(store.load("web-os").unwrap(), None);
        store.save("web-os", "{\"v\":1}").unwrap();
        assert_eq!(store.load("web-os").unwrap().as_deref(), Some("{\"v\":1}"));
    }

    #[test]
    fn memory_overwrites() {
        let mut store = MemoryStorage::new();
        store.save("k", "one").unwrap();
        store.save("k", "two").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::at(dir.path()).unwrap();
        assert_eq!(store.load("web-os").unwrap(), None);
        store.save("web-os", "payload").unwrap();
        assert_eq!(store.load("web-os").unwrap().as_deref(), Some("payload"));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStorage::at(dir.path()).unwrap();
            store.save("web-os", "persisted").unwrap();
        }
        let store = FileStorage::at(dir.path()).unwrap();
        assert_eq!(store.load("web-os").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn file_storage_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::at(dir.path()).unwrap();
        store.save("web-os", "x").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["web-os.json"]);
    }
}
