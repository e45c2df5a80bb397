//! Keyed JSON file cache.
//!
//! Reads are served from memory while the entry is younger than the TTL and
//! the file's modification time is unchanged; anything else reads through.
//! Writes go to disk first and then replace the cached value.
//!
//! # Thread Safety
//!
//! [`FileCache`] is `Sync`. Writes and deletes to the same path are
//! serialized by a per-path mutex, and across processes by an exclusive
//! `fs2` lock on one `.lock` file per directory. Files are replaced by
//! rename, so a concurrent reader sees either the old or the new content.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::StoreError;

/// How long a cached value is trusted before the file is checked again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Name of the per-directory file holding the cross-process lock.
pub const LOCK_FILE_NAME: &str = ".lock";

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    mtime: Option<SystemTime>,
    cached_at: Instant,
}

/// In-memory cache of parsed JSON files, keyed by path.
#[derive(Debug)]
pub struct FileCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, CacheEntry<T>>>,
    write_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<T> Default for FileCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FileCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the parsed contents of `path`.
    ///
    /// A missing file is `None`. An unreadable or unparseable file is logged
    /// and also `None`.
    pub fn read(&self, path: &Path) -> Option<T> {
        let mtime = modified(path);
        if let Some(value) = self.fresh(path, mtime) {
            tracing::trace!(path = ?path, "cache hit");
            return Some(value);
        }

        let Some(mtime) = mtime else {
            self.invalidate(path);
            return None;
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = ?path, error = %err, "failed to read file");
                return None;
            }
        };

        let value: T = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(path = ?path, error = %err, "failed to parse JSON file");
                return None;
            }
        };

        self.lock_entries().insert(
            path.to_path_buf(),
            CacheEntry {
                value: value.clone(),
                mtime: Some(mtime),
                cached_at: Instant::now(),
            },
        );
        Some(value)
    }

    /// Writes `value` to `path` as pretty JSON and refreshes the cache.
    pub fn write(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let key_lock = self.key_lock(path);
        let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        let _file_lock = lock_exclusive(path)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, path))
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        self.lock_entries().insert(
            path.to_path_buf(),
            CacheEntry {
                value: value.clone(),
                mtime: modified(path),
                cached_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Deletes `path` and its cache entry. Returns whether a file was removed.
    pub fn remove(&self, path: &Path) -> Result<bool, StoreError> {
        let key_lock = self.key_lock(path);
        let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.invalidate(path);
        if !path.exists() {
            return Ok(false);
        }

        let _file_lock = lock_exclusive(path)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Drops the cached value for `path`.
    pub fn invalidate(&self, path: &Path) {
        self.lock_entries().remove(path);
    }

    /// Drops every cached value.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    fn fresh(&self, path: &Path, mtime: Option<SystemTime>) -> Option<T> {
        let entries = self.lock_entries();
        let entry = entries.get(path)?;
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        if mtime.is_none() || entry.mtime != mtime {
            return None;
        }
        Some(entry.value.clone())
    }

    fn key_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<PathBuf, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Takes the cross-process lock guarding `path`'s directory, released when
/// dropped. The directory must exist.
fn lock_exclusive(path: &Path) -> Result<File, StoreError> {
    let lock_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(LOCK_FILE_NAME);
    let lock_file = File::create(&lock_path).map_err(|source| StoreError::Lock {
        path: lock_path.clone(),
        source,
    })?;
    lock_file
        .lock_exclusive()
        .map_err(|source| StoreError::Lock {
            path: lock_path,
            source,
        })?;
    Ok(lock_file)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
