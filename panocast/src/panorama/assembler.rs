//! Equirectangular panorama assembly from a tile grid.
//!
//! A panorama at zoom `z` is a grid of `2^z` columns by `2^(z-1)` rows of
//! square tiles. Tiles are fetched in row-major order and pasted into one
//! raster. Assembly is all-or-nothing: the first failing tile aborts the
//! build and nothing is written to the panorama cache.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, RgbImage};
use tracing::{debug, info, warn};

use crate::cache::{CacheStatsSnapshot, DiskStore, PanoramaKey, TileKey};
use crate::error::{AcquisitionError, InvalidTile, TileRejection};
use crate::panorama::TileStore;
use crate::provider::{AsyncHttpClient, PanoramaId};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Default zoom level.
pub const DEFAULT_ZOOM: u8 = 3;

/// Default JPEG quality for cached panoramas.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Tile grid dimensions `(columns, rows)` at `zoom`. Zoom must be at least 1.
pub fn grid_size(zoom: u8) -> (u32, u32) {
    debug_assert!(zoom >= 1);
    (1u32 << zoom, 1u32 << zoom.saturating_sub(1))
}

/// Assembly tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblerSettings {
    pub tile_size: u32,
    pub jpeg_quality: u8,
    /// Lowest zoom to fall back to when assembly fails. `None` disables
    /// fallback.
    pub fallback_min_zoom: Option<u8>,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fallback_min_zoom: None,
        }
    }
}

/// A fully assembled equirectangular panorama.
#[derive(Debug, Clone)]
pub struct Panorama {
    pub pano_id: PanoramaId,
    pub zoom: u8,
    pub raster: RgbImage,
}

impl Panorama {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// Builds panoramas from tiles, caching the result per `(pano_id, zoom)`.
pub struct PanoramaAssembler<C: AsyncHttpClient> {
    tiles: TileStore<C>,
    store: DiskStore<PanoramaKey>,
    settings: AssemblerSettings,
    fills: DashMap<PanoramaKey, Arc<tokio::sync::Mutex<()>>>,
}

impl<C: AsyncHttpClient> PanoramaAssembler<C> {
    pub fn new(
        tiles: TileStore<C>,
        cache_dir: impl Into<PathBuf>,
        settings: AssemblerSettings,
    ) -> Self {
        Self {
            tiles,
            store: DiskStore::new(cache_dir),
            settings,
            fills: DashMap::new(),
        }
    }

    /// Assemble the panorama at `zoom`, falling back to lower zooms when
    /// configured.
    pub async fn assemble(
        &self,
        pano_id: &PanoramaId,
        zoom: u8,
    ) -> Result<Panorama, AcquisitionError> {
        let min_zoom = self
            .settings
            .fallback_min_zoom
            .map(|z| z.clamp(1, zoom.max(1)))
            .unwrap_or(zoom);

        let mut current = zoom;
        loop {
            match self.assemble_at(pano_id, current).await {
                Ok(panorama) => return Ok(panorama),
                Err(e) if current > min_zoom => {
                    warn!(
                        pano_id = %pano_id,
                        zoom = current,
                        error = %e,
                        "Assembly failed, retrying at lower zoom"
                    );
                    current -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Assemble the panorama at exactly `zoom`.
    pub async fn assemble_at(
        &self,
        pano_id: &PanoramaId,
        zoom: u8,
    ) -> Result<Panorama, AcquisitionError> {
        if zoom == 0 {
            return Err(AcquisitionError::Configuration(
                "panorama zoom must be at least 1".to_string(),
            ));
        }
        let key = PanoramaKey::new(pano_id.clone(), zoom);

        let fill_lock = self
            .fills
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let result = {
            let _guard = fill_lock.lock().await;
            self.load_or_build(&key).await
        };
        drop(fill_lock);
        self.fills.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result.map(|raster| Panorama {
            pano_id: pano_id.clone(),
            zoom,
            raster,
        })
    }

    async fn load_or_build(&self, key: &PanoramaKey) -> Result<RgbImage, AcquisitionError> {
        match self.store.get(key).await {
            Ok(Some(data)) => match decode_blocking(data).await? {
                Ok(raster) => {
                    debug!(panorama = %key, "Panorama cache hit");
                    return Ok(raster);
                }
                Err(reason) => {
                    warn!(
                        panorama = %key,
                        reason = %reason,
                        "Cached panorama unreadable, rebuilding"
                    );
                    self.store.remove(key).await?;
                }
            },
            Ok(None) => {}
            Err(e) => warn!(panorama = %key, error = %e, "Panorama cache unreadable, rebuilding"),
        }

        let raster = self.build(key).await?;

        let quality = self.settings.jpeg_quality;
        let encoded = {
            let raster = raster.clone();
            tokio::task::spawn_blocking(move || encode_jpeg(&raster, quality)).await??
        };
        self.store.put(key, &encoded).await?;
        info!(
            panorama = %key,
            width = raster.width(),
            height = raster.height(),
            "Assembled panorama"
        );
        Ok(raster)
    }

    async fn build(&self, key: &PanoramaKey) -> Result<RgbImage, AcquisitionError> {
        let (cols, rows) = grid_size(key.zoom);

        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for y in 0..rows {
            for x in 0..cols {
                let tile = TileKey::new(key.pano_id.clone(), key.zoom, x, y);
                match self.tiles.get(&tile).await {
                    Ok(data) => tiles.push((tile, data)),
                    Err(invalid) => return Err(assembly_failed(invalid)),
                }
            }
        }

        let tile_size = self.settings.tile_size;
        let pasted =
            tokio::task::spawn_blocking(move || paste_tiles(tiles, cols, rows, tile_size)).await?;

        match pasted {
            Ok(raster) => Ok(raster),
            Err(invalid) => {
                self.tiles.evict(&invalid.tile).await;
                Err(assembly_failed(invalid))
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.store.stats()
    }

    pub fn tile_stats(&self) -> CacheStatsSnapshot {
        self.tiles.stats()
    }
}

fn assembly_failed(invalid: InvalidTile) -> AcquisitionError {
    warn!(
        pano_id = %invalid.tile.pano_id,
        zoom = invalid.tile.zoom,
        x = invalid.tile.x,
        y = invalid.tile.y,
        reason = %invalid.reason,
        "Tile failed, aborting panorama assembly"
    );
    AcquisitionError::AssemblyFailed {
        pano_id: invalid.tile.pano_id.clone(),
        zoom: invalid.tile.zoom,
        x: invalid.tile.x,
        y: invalid.tile.y,
        source: invalid,
    }
}

fn paste_tiles(
    tiles: Vec<(TileKey, Vec<u8>)>,
    cols: u32,
    rows: u32,
    tile_size: u32,
) -> Result<RgbImage, InvalidTile> {
    let mut canvas = RgbImage::new(cols * tile_size, rows * tile_size);

    for (key, data) in tiles {
        let tile = decode(&data).map_err(|reason| InvalidTile {
            tile: key.clone(),
            reason: TileRejection::Undecodable(reason),
        })?;
        let x = i64::from(key.x) * i64::from(tile_size);
        let y = i64::from(key.y) * i64::from(tile_size);
        image::imageops::replace(&mut canvas, &tile, x, y);
    }

    Ok(canvas)
}

fn decode(data: &[u8]) -> Result<RgbImage, String> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Format error: {}", e))?
        .decode()
        .map(|img| img.to_rgb8())
        .map_err(|e| e.to_string())
}

async fn decode_blocking(data: Vec<u8>) -> Result<Result<RgbImage, String>, AcquisitionError> {
    Ok(tokio::task::spawn_blocking(move || decode(&data)).await?)
}

/// Encode an RGB raster as JPEG.
pub fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, AcquisitionError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    raster.write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}
