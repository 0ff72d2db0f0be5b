//! Key-value persistence areas. Values are opaque strings; the note store
//! keeps a JSON array under a single key.

use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::Result;
use crate::specific_fail;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// One `<key>.json` file per key inside a folder.
#[derive(Debug, Clone)]
pub struct FileStore {
    folder: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(folder: P) -> FileStore {
        FileStore { folder: folder.as_ref().to_path_buf() }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(|c: char| c == '/' || c == '\\' || c == '.') {
            return specific_fail!(format!("invalid storage key '{}'", key));
        }
        Ok(self.folder.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(ref e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if !self.folder.is_dir() {
            log::info!("creating storage folder {}", self.folder.display());
            create_dir_all(&self.folder)?;
        }
        // write next to the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(&self.folder)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process area, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return specific_fail!(format!("storage quota exceeded writing '{}'", key));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn file_store_round_trip() {
        let dir = Builder::new().prefix("quill").tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("notesAppData").unwrap(), None);

        store.set("notesAppData", "[]").unwrap();
        assert_eq!(store.get("notesAppData").unwrap().as_deref(), Some("[]"));

        store.set("notesAppData", "[1]").unwrap();
        assert_eq!(store.get("notesAppData").unwrap().as_deref(), Some("[1]"));

        store.remove("notesAppData").unwrap();
        assert_eq!(store.get("notesAppData").unwrap(), None);
        store.remove("notesAppData").unwrap();
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = Builder::new().prefix("quill").tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn memory_store_can_refuse_writes() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        assert!(store.set("k", "v").is_err());
        assert_eq!(store.get("k").unwrap(), None);
    }
}
