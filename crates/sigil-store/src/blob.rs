//! Byte-blob stores
//!
//! The durable tier does not prescribe an on-disk layout; it writes one
//! opaque blob per identifier through [`BlobStore`]. Two implementations
//! ship here: a directory of files and an in-memory map for tests and
//! ephemeral snapshots.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Keyed byte storage consumed by the file-backed cache tier.
///
/// `load` answers `None` for an unknown identifier; `store` replaces the
/// blob wholesale. No locking or versioning: concurrent writers are
/// last-writer-wins.
pub trait BlobStore {
    /// Read the blob stored under `id`, or `None` if there is none.
    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace the blob stored under `id`.
    fn store(&mut self, id: &str, bytes: &[u8]) -> io::Result<()>;
}

/// One file per identifier under a root directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crashed writer never leaves a half-written blob behind.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under `~/.sigil/cache`.
    ///
    /// # Returns
    /// * `Ok(DirBlobStore)` - Store rooted in the user's home directory
    /// * `Err(io::Error)` - Home directory could not be determined
    pub fn in_home() -> io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine home directory",
            )
        })?;
        Ok(Self::new(home.join(".sigil").join("cache")))
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

impl BlobStore for DirBlobStore {
    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.blob_path(id);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path).map(Some)
    }

    fn store(&mut self, id: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;

        // Write to a temporary file first, then move into place.
        let tmp_path = self.root.join(format!("{id}.tmp"));
        let mut tmp_file = fs::File::create(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, self.blob_path(id))
    }
}

/// Map-backed store. Clones share the same blobs, so a "fresh process" can
/// be simulated by building a second cache over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob exists under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.blobs.lock().map(|b| b.contains_key(id)).unwrap_or(false)
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&mut self, id: &str) -> io::Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "blob store poisoned"))?;
        Ok(blobs.get(id).cloned())
    }

    fn store(&mut self, id: &str, bytes: &[u8]) -> io::Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "blob store poisoned"))?;
        blobs.insert(id.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dir_store_round_trips_bytes() {
        let dir = TempDir::new().unwrap();
        let mut store = DirBlobStore::new(dir.path());

        assert!(store.load("signatures").unwrap().is_none());

        store.store("signatures", b"payload").unwrap();
        assert_eq!(store.load("signatures").unwrap().as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn dir_store_replaces_blobs_wholesale() {
        let dir = TempDir::new().unwrap();
        let mut store = DirBlobStore::new(dir.path());

        store.store("signatures", b"first").unwrap();
        store.store("signatures", b"second").unwrap();
        assert_eq!(store.load("signatures").unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn dir_store_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = DirBlobStore::new(dir.path());
        store.store("signatures", b"payload").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["signatures.json"]);
    }

    #[test]
    fn memory_store_clones_share_blobs() {
        let mut writer = MemoryBlobStore::new();
        let mut reader = writer.clone();

        writer.store("signatures", b"shared").unwrap();
        assert_eq!(reader.load("signatures").unwrap().as_deref(), Some(&b"shared"[..]));
        assert!(reader.contains("signatures"));
    }
}
