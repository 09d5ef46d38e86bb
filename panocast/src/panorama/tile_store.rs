//! Write-through tile cache.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheStatsSnapshot, DiskStore, TileKey};
use crate::error::{InvalidTile, TileRejection};
use crate::provider::{AsyncHttpClient, Endpoints, HttpResponse};

/// Default minimum tile payload. Provider placeholder tiles are smaller.
pub const DEFAULT_MIN_TILE_BYTES: usize = 1000;

/// Check a tile response for status, content type and size.
///
/// Returns the body when it looks like a real tile.
pub fn validate_tile(response: HttpResponse, min_bytes: usize) -> Result<Vec<u8>, TileRejection> {
    if !response.is_success() {
        return Err(TileRejection::Status(response.status));
    }

    let content_type = response.content_type.as_deref().unwrap_or("");
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(TileRejection::ContentType(content_type.to_string()));
    }

    if response.body.len() < min_bytes {
        return Err(TileRejection::TooSmall {
            size: response.body.len(),
            min: min_bytes,
        });
    }

    Ok(response.body)
}

/// Content-addressed store of panorama tiles, fetching on miss.
///
/// Only validated tiles are written to disk; a rejected tile leaves no
/// trace so the next request goes back to the network.
pub struct TileStore<C: AsyncHttpClient> {
    http_client: C,
    endpoints: Arc<Endpoints>,
    store: DiskStore<TileKey>,
    min_tile_bytes: usize,
}

impl<C: AsyncHttpClient> TileStore<C> {
    pub fn new(
        http_client: C,
        endpoints: Arc<Endpoints>,
        cache_dir: impl Into<PathBuf>,
        min_tile_bytes: usize,
    ) -> Self {
        Self {
            http_client,
            endpoints,
            store: DiskStore::new(cache_dir),
            min_tile_bytes,
        }
    }

    /// Tile bytes for `key`, from cache or the tile endpoint.
    pub async fn get(&self, key: &TileKey) -> Result<Vec<u8>, InvalidTile> {
        match self.store.get(key).await {
            Ok(Some(data)) => return Ok(data),
            Ok(None) => {}
            Err(e) => warn!(tile = %key, error = %e, "Tile cache unreadable, refetching"),
        }

        let url = self
            .endpoints
            .tile(&key.pano_id, key.zoom, key.x, key.y);
        let rejection = |reason: TileRejection| InvalidTile {
            tile: key.clone(),
            reason,
        };

        let response = self
            .http_client
            .get(&url)
            .await
            .map_err(|e| rejection(TileRejection::Transport(e.to_string())))?;
        let data = validate_tile(response, self.min_tile_bytes).map_err(rejection)?;

        debug!(
            pano_id = %key.pano_id,
            zoom = key.zoom,
            x = key.x,
            y = key.y,
            bytes = data.len(),
            "Fetched tile"
        );

        if let Err(e) = self.store.put(key, &data).await {
            warn!(tile = %key, error = %e, "Failed to cache tile");
        }
        Ok(data)
    }

    /// Drop a cached tile, e.g. after it turned out to be undecodable.
    pub async fn evict(&self, key: &TileKey) {
        if let Err(e) = self.store.remove(key).await {
            warn!(tile = %key, error = %e, "Failed to evict tile");
        }
    }

    pub async fn contains(&self, key: &TileKey) -> bool {
        self.store.contains(key).await
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.store.stats()
    }
}
