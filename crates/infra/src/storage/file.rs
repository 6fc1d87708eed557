//! File-backed session storage
//!
//! All keys live in one JSON object. Every write goes to a sibling temp file
//! which is then renamed over the original, so a crash never leaves a
//! half-written record. Reads always go to disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use taxdesk_core::{StorageBackend, StorageError};
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open storage at `path`, creating missing parent directories
    ///
    /// The file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "Opened file session storage");
        Ok(Self { path, write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> io::Result<Option<Entries>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(Entries::new())),
            Err(e) => return Err(e),
        };

        if raw.trim().is_empty() {
            return Ok(Some(Entries::new()));
        }
        Ok(serde_json::from_str(&raw).ok())
    }

    fn write_entries(&self, entries: &Entries) -> io::Result<()> {
        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");

        let mut file = fs::File::create(&tmp)?;
        file.write_all(&encoded)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)
    }

    /// Load entries for a modification; an unreadable record is replaced
    fn entries_for_update(&self, key: &str) -> Result<Entries, StorageError> {
        match self.read_entries() {
            Ok(Some(entries)) => Ok(entries),
            Ok(None) => {
                warn!(path = %self.path.display(), "Replacing malformed session file");
                Ok(Entries::new())
            }
            Err(e) => Err(StorageError::Write { key: key.to_string(), message: e.to_string() }),
        }
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.read_entries() {
            Ok(Some(mut entries)) => Ok(entries.remove(key)),
            Ok(None) => Err(StorageError::Read {
                key: key.to_string(),
                message: format!("{} is not a JSON object of strings", self.path.display()),
            }),
            Err(e) => Err(StorageError::Read { key: key.to_string(), message: e.to_string() }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.entries_for_update(key)?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
            .map_err(|e| StorageError::Write { key: key.to_string(), message: e.to_string() })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.entries_for_update(key)?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
            .map_err(|e| StorageError::Write { key: key.to_string(), message: e.to_string() })
    }
}
