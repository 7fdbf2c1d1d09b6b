//! Blob map storage
//!
//! A trust configuration is persisted as a named blob map. In a cluster that
//! is a secret; here the seam is the [`BlobStore`] trait with two
//! implementations:
//!
//! - [`MemoryStore`]: in-process, for tests and embedding
//! - [`DirectoryStore`]: one directory per blob map and one file per key,
//!   which is exactly what the log server sees once the secret is mounted

use crate::error::{Error, Result};
use crate::transcoder::BlobMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Storage for named blob maps
pub trait BlobStore: Send + Sync {
    /// Get a blob map by name
    ///
    /// Returns `Ok(None)` if no blob map with that name exists.
    fn get(&self, name: &str) -> Result<Option<BlobMap>>;

    /// Create or replace a blob map
    ///
    /// Keys absent from `blobs` are removed from the stored map.
    fn put(&self, name: &str, blobs: &BlobMap) -> Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn get(&self, name: &str) -> Result<Option<BlobMap>> {
        (**self).get(name)
    }

    fn put(&self, name: &str, blobs: &BlobMap) -> Result<()> {
        (**self).put(name, blobs)
    }
}

impl BlobStore for Box<dyn BlobStore> {
    fn get(&self, name: &str) -> Result<Option<BlobMap>> {
        (**self).get(name)
    }

    fn put(&self, name: &str, blobs: &BlobMap) -> Result<()> {
        (**self).put(name, blobs)
    }
}

/// In-memory blob store
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    maps: Arc<RwLock<HashMap<String, BlobMap>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<BlobMap>> {
        let maps = self
            .maps
            .read()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(maps.get(name).cloned())
    }

    fn put(&self, name: &str, blobs: &BlobMap) -> Result<()> {
        let mut maps = self
            .maps
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        maps.insert(name.to_string(), blobs.clone());
        Ok(())
    }
}

/// File system blob store
///
/// # Directory Structure
///
/// ```text
/// root/
/// └── ctlog-config/
///     ├── config
///     ├── private
///     ├── public
///     ├── fulcio-0
///     └── ...
/// ```
///
/// Names and keys follow the Kubernetes secret key rules: ASCII letters,
/// digits, `-`, `_` and `.`. Entries starting with `.` are never read, so
/// the hidden bookkeeping of a mounted volume is left alone.
///
/// Each file is replaced atomically, but a `put` across several keys is not:
/// an I/O error part way through leaves some keys new and some old.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at `root`
    ///
    /// The directory will be created if it doesn't exist when writing.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn map_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKeyName(name.to_string()))
    }
}

/// Write then rename so readers never see a torn file
fn write_file(dir: &Path, key: &str, value: &[u8]) -> Result<()> {
    let tmp = dir.join(format!(".{}.tmp", key));
    let written = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, dir.join(key)));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            tracing::debug!("Could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

impl BlobStore for DirectoryStore {
    fn get(&self, name: &str) -> Result<Option<BlobMap>> {
        let dir = self.map_dir(name)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut blobs = BlobMap::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            if is_hidden(&file_name) {
                continue;
            }
            // Mounted secrets are symlinks into a hidden data directory
            if !fs::metadata(entry.path())?.is_file() {
                tracing::debug!("Skipping non-file entry {}", entry.path().display());
                continue;
            }
            let key = file_name.to_string_lossy().into_owned();
            blobs.insert(key, fs::read(entry.path())?);
        }
        Ok(Some(blobs))
    }

    fn put(&self, name: &str, blobs: &BlobMap) -> Result<()> {
        for key in blobs.keys() {
            validate_name(key)?;
        }
        let dir = self.map_dir(name)?;
        fs::create_dir_all(&dir)?;

        for (key, value) in blobs {
            write_file(&dir, key, value)?;
        }

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            if is_hidden(&file_name) {
                continue;
            }
            let key = file_name.to_string_lossy();
            if !blobs.contains_key(&*key) && entry.file_type()?.is_file() {
                tracing::debug!("Removing stale blob {}/{}", name, key);
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
