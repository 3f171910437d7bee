//! Model snapshot persistence
//!
//! Snapshots are stored as opaque blobs keyed by a model id. The only hard
//! requirement is atomicity: a reader must never observe a partially
//! written blob, so the file store writes to a temp file and renames it
//! into place.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use crate::error::{Error, Result};

/// Durable storage for fitted model snapshots
pub trait ModelStore: Send + Sync {
    /// Load the blob for a model id; `Ok(None)` when nothing is stored.
    fn load(&self, model_id: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace the blob for a model id.
    fn save(&self, model_id: &str, blob: &[u8]) -> Result<()>;
}

/// File-per-model store under a single directory
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    /// Create the store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!("Created model store directory: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, model_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", model_id))
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(model_id)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, model_id: &str, blob: &[u8]) -> Result<()> {
        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob)?;
        tmp.persist(self.blob_path(model_id))
            .map_err(|e| Error::Store(format!("failed to persist {}: {}", model_id, e)))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for MemoryStore {
    fn load(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(blobs.get(model_id).cloned())
    }

    fn save(&self, model_id: &str, blob: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        blobs.insert(model_id.to_string(), blob.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileModelStore::new(dir.path().join("models")).unwrap();
        assert_eq!(store.load("m1").unwrap(), None);

        store.save("m1", b"hello").unwrap();
        assert_eq!(store.load("m1").unwrap().unwrap(), b"hello");

        // overwrite replaces the blob whole
        store.save("m1", b"goodbye").unwrap();
        assert_eq!(store.load("m1").unwrap().unwrap(), b"goodbye");
    }

    #[test]
    fn test_file_store_ids_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        store.save("a", b"1").unwrap();
        store.save("b", b"2").unwrap();
        assert_eq!(store.load("a").unwrap().unwrap(), b"1");
        assert_eq!(store.load("b").unwrap().unwrap(), b"2");
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load("m").unwrap(), None);
        store.save("m", b"blob").unwrap();
        assert_eq!(store.load("m").unwrap().unwrap(), b"blob");
    }
}
