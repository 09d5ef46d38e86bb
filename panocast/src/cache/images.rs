//! Final-image cache.

use std::path::PathBuf;

use crate::cache::{CacheError, CacheStatsSnapshot, DiskStore, ImageKey};
use crate::coord::{Coordinate, Heading};

/// Persistent store of rendered perspective images keyed by
/// coordinate, rounded heading, and dimensions.
pub struct ImageCache {
    store: DiskStore<ImageKey>,
}

impl ImageCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: DiskStore::new(cache_dir),
        }
    }

    /// Build the key for an image request.
    pub fn key(coord: &Coordinate, heading: Heading, width: u32, height: u32) -> ImageKey {
        ImageKey::new(coord, heading, width, height)
    }

    pub async fn lookup(&self, key: &ImageKey) -> Result<Option<Vec<u8>>, CacheError> {
        self.store.get(key).await
    }

    pub async fn contains(&self, key: &ImageKey) -> bool {
        self.store.contains(key).await
    }

    /// Store encoded image bytes, returning the file they were written to.
    pub async fn store(&self, key: &ImageKey, data: &[u8]) -> Result<PathBuf, CacheError> {
        self.store.put(key, data).await
    }

    pub fn path_for(&self, key: &ImageKey) -> PathBuf {
        self.store.path_for(key)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.store.stats()
    }
}
