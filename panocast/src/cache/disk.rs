//! Disk store with atomic write-through.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::path::{cache_path, namespace_directory};
use crate::cache::types::{CacheError, CacheKey};
use crate::cache::{CacheStats, CacheStatsSnapshot};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content-addressed file store for one cache namespace.
///
/// Entries are written to a uniquely named temporary file in the same
/// directory and renamed into place, so a reader observes either the full
/// file or nothing. Two concurrent writers of the same key both succeed and
/// leave identical content behind.
pub struct DiskStore<K: CacheKey> {
    cache_dir: PathBuf,
    stats: Arc<CacheStats>,
    _key: PhantomData<fn(&K)>,
}

impl<K: CacheKey> DiskStore<K> {
    /// Create a store rooted at `cache_dir`. Directories are created lazily.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            stats: Arc::new(CacheStats::new()),
            _key: PhantomData,
        }
    }

    /// Directory holding this store's files.
    pub fn directory(&self) -> PathBuf {
        namespace_directory(&self.cache_dir, K::NAMESPACE)
    }

    /// Path an entry for `key` is stored at.
    pub fn path_for(&self, key: &K) -> PathBuf {
        cache_path(&self.cache_dir, key)
    }

    /// Whether an entry exists for `key`.
    pub async fn contains(&self, key: &K) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }

    /// Read the entry for `key`, `Ok(None)` if absent.
    pub async fn get(&self, key: &K) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                trace!(path = %path.display(), bytes = data.len(), "cache hit");
                self.stats.record_hit();
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.stats.record_miss();
                Ok(None)
            }
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Write `data` for `key` atomically.
    pub async fn put(&self, key: &K, data: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.path_for(key);
        let dir = self.directory();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(&dir, e))?;

        let temp = temp_path(&path);
        if let Err(e) = tokio::fs::write(&temp, data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(CacheError::io(&temp, e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(CacheError::io(&path, e));
        }

        debug!(path = %path.display(), bytes = data.len(), "cache write");
        self.stats.record_write(data.len());
        Ok(path)
    }

    /// Remove the entry for `key`. Removing a missing entry is not an error.
    pub async fn remove(&self, key: &K) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.{}.part", std::process::id(), n));
    path.with_file_name(name)
}
