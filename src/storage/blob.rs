//! Blob storage for contestant photos
//!
//! The voting core treats a photo as an opaque key; everything that knows
//! about bytes and directories lives behind `BlobStore`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Opaque blob storage keyed by `photo_ref` strings.
pub trait BlobStore: Send + Sync {
    /// Persists `bytes` under `key`, overwriting any previous content.
    fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Removes the blob. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> io::Result<()>;

    /// Whether a blob exists under `key`.
    fn exists(&self, key: &str) -> bool;
}

/// Filesystem-backed blob store: one file per key inside a flat directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Opens (creating if needed) the store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Full path of the blob file for `key`.
    ///
    /// Keys are generated by this application (see `photo_key`), never taken
    /// from user input, so plain joining is enough.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.path_for(key), bytes)
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }
}

/// Builds a unique photo key: uploader id + unix timestamp + extension.
pub fn photo_key(uploader_id: i64, extension: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    format!("{uploader_id}_{timestamp}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_exists_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().join("photos")).unwrap();

        assert!(!store.exists("p.jpg"));
        store.store("p.jpg", b"bytes").unwrap();
        assert!(store.exists("p.jpg"));

        store.delete("p.jpg").unwrap();
        assert!(!store.exists("p.jpg"));
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();

        assert!(store.delete("never-existed.jpg").is_ok());
    }

    #[test]
    fn photo_keys_carry_uploader_and_extension() {
        let key = photo_key(42, "jpg");
        assert!(key.starts_with("42_"));
        assert!(key.ends_with(".jpg"));
    }
}
