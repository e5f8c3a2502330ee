//! # Flat content-addressed filesystem layout
//!
//! Lays out two directory trees beneath a root (`spec.md` §6.2):
//!
//! ```text
//! <root>/
//!   ir/<hash[0:2]>/<hash>.bin         — raw IR bytes, keyed by content hash
//!   mat/<encoding>/<hash>.tok         — cached token IDs for (hash, encoding)
//! ```
//!
//! Writers never mutate a file that already exists: both trees are
//! content-addressed, so a path collision implies identical content. Writes
//! go to a temp file in the destination directory and are atomically renamed
//! into place, so a concurrent reader only ever sees the old absence or the
//! complete final bytes (`spec.md` §5).

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Directory layout rooted at a single path on disk.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let layout = Self { root };
        fs::create_dir_all(layout.ir_dir()).map_err(|source| io_err(layout.ir_dir(), source))?;
        fs::create_dir_all(layout.mat_dir()).map_err(|source| io_err(layout.mat_dir(), source))?;
        Ok(layout)
    }

    fn ir_dir(&self) -> PathBuf {
        self.root.join("ir")
    }

    fn mat_dir(&self) -> PathBuf {
        self.root.join("mat")
    }

    /// Path to the raw-bytes file for an IR hash.
    pub fn ir_path(&self, hash: &str) -> PathBuf {
        let shard = &hash[..hash.len().min(2)];
        self.ir_dir().join(shard).join(format!("{hash}.bin"))
    }

    /// Path to the cached-token file for a (hash, encoding) pair.
    pub fn mat_path(&self, hash: &str, encoding: &str) -> PathBuf {
        self.mat_dir().join(encoding).join(format!("{hash}.tok"))
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> StoreError {
    StoreError::StorageIo {
        path: path.as_ref().display().to_string(),
        source,
    }
}

/// Writes `bytes` to `path` iff `path` does not already exist, via
/// temp-file-plus-rename. Returns `true` if this call created the file,
/// `false` if another writer won the race or the file was already present.
pub fn write_if_absent(path: &Path, bytes: &[u8]) -> Result<bool, StoreError> {
    if path.exists() {
        return Ok(false);
    }
    let dir = path.parent().expect("path always has a parent under the layout root");
    fs::create_dir_all(dir).map_err(|source| io_err(dir, source))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| io_err(dir, source))?;
    tmp.write_all(bytes).map_err(|source| io_err(dir, source))?;
    tmp.flush().map_err(|source| io_err(dir, source))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(io_err(path, err.error)),
    }
}

/// Writes `bytes` to `path` unconditionally via temp-file-plus-rename,
/// replacing any existing content. Used only to rebuild a stale
/// materialization-cache entry (`spec.md` §4.7 version-mismatch rebuild).
pub fn write_overwrite(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().expect("path always has a parent under the layout root");
    fs::create_dir_all(dir).map_err(|source| io_err(dir, source))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| io_err(dir, source))?;
    tmp.write_all(bytes).map_err(|source| io_err(dir, source))?;
    tmp.flush().map_err(|source| io_err(dir, source))?;
    tmp.persist(path).map_err(|err| io_err(path, err.error))?;
    Ok(())
}

/// Reads the full contents of `path`, if present.
pub fn read(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_if_absent_rejects_second_writer() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path()).unwrap();
        let path = layout.ir_path("deadbeef");

        assert!(write_if_absent(&path, b"first").unwrap());
        assert!(!write_if_absent(&path, b"second").unwrap());
        assert_eq!(read(&path).unwrap().unwrap(), b"first");
    }

    #[test]
    fn ir_path_shards_by_hash_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path()).unwrap();
        let path = layout.ir_path("ab12ef");
        assert!(path.starts_with(dir.path().join("ir").join("ab")));
    }
}
