//! Cache path construction.

use super::types::{CacheKey, CacheNamespace};
use std::path::{Path, PathBuf};

/// Directory holding one cache namespace.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use panocast::cache::{namespace_directory, CacheNamespace};
///
/// let dir = namespace_directory(Path::new("/cache"), CacheNamespace::Tiles);
/// assert_eq!(dir, PathBuf::from("/cache/tiles"));
/// ```
pub fn namespace_directory(cache_dir: &Path, namespace: CacheNamespace) -> PathBuf {
    cache_dir.join(namespace.dir_name())
}

/// Full path of the cache file for `key`.
///
/// ```text
/// <cache_dir>/<namespace>/<file_name>
/// ```
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use panocast::cache::{cache_path, PanoramaKey};
/// use panocast::provider::PanoramaId;
///
/// let key = PanoramaKey::new(PanoramaId::parse("abc").unwrap(), 3);
/// assert_eq!(
///     cache_path(Path::new("/cache"), &key),
///     PathBuf::from("/cache/panoramas/abc_full_z3.jpg")
/// );
/// ```
pub fn cache_path<K: CacheKey>(cache_dir: &Path, key: &K) -> PathBuf {
    namespace_directory(cache_dir, K::NAMESPACE).join(key.file_name())
}
