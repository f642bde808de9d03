//! Opaque named blobs for saving learned tables between matches

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ahash::AHashMap;

use crate::core::error::Result;

/// Storage for one serialized blob per agent id
pub trait BlobStore {
    /// Best-effort load; any failure reads as "nothing stored"
    fn load(&self, id: &str) -> Option<Vec<u8>>;

    fn save(&mut self, id: &str, blob: &[u8]) -> Result<()>;
}

/// In-process store, mostly for tests and single-run training
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: AHashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blobs.contains_key(id)
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, id: &str) -> Option<Vec<u8>> {
        self.blobs.get(id).cloned()
    }

    fn save(&mut self, id: &str, blob: &[u8]) -> Result<()> {
        self.blobs.insert(id.to_string(), blob.to_vec());
        Ok(())
    }
}

/// One file per agent: `<dir>/<id>.qtable.json`
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.qtable.json", id))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, id: &str) -> Option<Vec<u8>> {
        let path = self.path_for(id);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }

    fn save(&mut self, id: &str, blob: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Temp file first, renamed into place
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryBlobStore::new();
        assert!(store.load("hero").is_none());
        store.save("hero", b"{}").unwrap();
        assert_eq!(store.load("hero").as_deref(), Some(&b"{}"[..]));
        assert!(!store.contains("knight"));
    }

    #[test]
    fn test_file_store_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path());
        assert!(store.load("knight").is_none());
    }

    #[test]
    fn test_file_store_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBlobStore::new(dir.path().join("nested/tables"));
        store.save("knight", b"data").unwrap();
        assert_eq!(store.load("knight").as_deref(), Some(&b"data"[..]));
        assert!(dir.path().join("nested/tables/knight.qtable.json").exists());
    }
}
