//! Content-addressed disk caches.
//!
//! Three namespaces share one root directory:
//!
//! ```text
//! <cache_dir>/
//! ├── tiles/       {pano}_z{zoom}_x{x}_y{y}.jpg
//! ├── panoramas/   {pano}_full_z{zoom}.jpg
//! └── images/      highres_{lat}_{lng}_h{heading}_{w}x{h}.jpg
//! ```
//!
//! Every file name is a pure function of its key, so a file's existence is
//! the cache lookup. There is no eviction.

mod disk;
mod images;
mod path;
mod stats;
mod types;

pub use disk::DiskStore;
pub use images::ImageCache;
pub use path::{cache_path, namespace_directory};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use types::{CacheError, CacheKey, CacheNamespace, ImageKey, PanoramaKey, TileKey};
