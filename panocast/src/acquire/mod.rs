//! Single-location acquisition pipeline.
//!
//! ```text
//! (coord, aim) ──► bearing ──► ImageCache? ──hit──► bytes
//!                                  │ miss
//!                                  ▼
//!     PanoramaResolver ──► HeadingCalibrator ──► PanoramaAssembler
//!                                                      │
//!                    ImageCache ◄── JPEG ◄── PerspectiveProjector
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cache::{CacheStatsSnapshot, ImageCache, ImageKey};
use crate::coord::{bearing, Coordinate, Heading};
use crate::error::AcquisitionError;
use crate::panorama::{
    encode_jpeg, AssemblerSettings, PanoramaAssembler, TileStore, DEFAULT_JPEG_QUALITY,
    DEFAULT_MIN_TILE_BYTES, DEFAULT_TILE_SIZE, DEFAULT_ZOOM,
};
use crate::projection::{
    PerspectiveProjector, ViewParams, DEFAULT_FOV, DEFAULT_HEIGHT, DEFAULT_PITCH, DEFAULT_WIDTH,
};
use crate::provider::{AsyncHttpClient, Endpoints, HeadingCalibrator, PanoramaResolver};

/// Everything the pipeline needs besides the HTTP client and credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquireSettings {
    /// Root of the tile, panorama and image caches.
    pub cache_dir: PathBuf,
    pub zoom: u8,
    pub tile_size: u32,
    pub min_tile_bytes: usize,
    pub fallback_min_zoom: Option<u8>,
    pub width: u32,
    pub height: u32,
    pub fov: f64,
    pub pitch: f64,
    pub jpeg_quality: u8,
}

impl AcquireSettings {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            zoom: DEFAULT_ZOOM,
            tile_size: DEFAULT_TILE_SIZE,
            min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
            fallback_min_zoom: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fov: DEFAULT_FOV,
            pitch: DEFAULT_PITCH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// One unit of work: a location, the point it faces, and where its image
/// lives.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionTask {
    pub coord: Coordinate,
    pub aim: Coordinate,
    /// World bearing from `coord` to `aim`.
    pub heading: Heading,
    pub key: ImageKey,
    pub output: PathBuf,
}

/// Result of a successful acquisition.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// Served from the image cache without touching the network.
    pub from_cache: bool,
}

/// Hit/miss counters of the three cache namespaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheReport {
    pub tiles: CacheStatsSnapshot,
    pub panoramas: CacheStatsSnapshot,
    pub images: CacheStatsSnapshot,
}

/// Runs the acquisition pipeline for individual tasks.
///
/// Shared by all batch workers; every component is safe to use
/// concurrently.
pub struct Acquirer<C: AsyncHttpClient + Clone> {
    resolver: PanoramaResolver<C>,
    calibrator: HeadingCalibrator<C>,
    assembler: PanoramaAssembler<C>,
    projector: PerspectiveProjector,
    images: ImageCache,
    settings: AcquireSettings,
}

impl<C: AsyncHttpClient + Clone> Acquirer<C> {
    pub fn new(
        http_client: C,
        endpoints: Endpoints,
        api_key: impl Into<String>,
        settings: AcquireSettings,
    ) -> Self {
        let endpoints = Arc::new(endpoints);
        let tiles = TileStore::new(
            http_client.clone(),
            Arc::clone(&endpoints),
            settings.cache_dir.clone(),
            settings.min_tile_bytes,
        );
        let assembler = PanoramaAssembler::new(
            tiles,
            settings.cache_dir.clone(),
            AssemblerSettings {
                tile_size: settings.tile_size,
                jpeg_quality: settings.jpeg_quality,
                fallback_min_zoom: settings.fallback_min_zoom,
            },
        );

        Self {
            resolver: PanoramaResolver::new(http_client.clone(), Arc::clone(&endpoints), api_key),
            calibrator: HeadingCalibrator::new(http_client, endpoints),
            assembler,
            projector: PerspectiveProjector::new(),
            images: ImageCache::new(settings.cache_dir.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &AcquireSettings {
        &self.settings
    }

    /// Build the task for a location facing `aim`.
    pub fn task_for(&self, coord: Coordinate, aim: Coordinate) -> AcquisitionTask {
        let heading = bearing(&coord, &aim);
        let key = ImageCache::key(&coord, heading, self.settings.width, self.settings.height);
        let output = self.images.path_for(&key);
        AcquisitionTask {
            coord,
            aim,
            heading,
            key,
            output,
        }
    }

    /// Acquire the image for `task`, serving it from the image cache when
    /// present.
    pub async fn acquire(&self, task: &AcquisitionTask) -> Result<Acquired, AcquisitionError> {
        self.acquire_with(task, false).await
    }

    /// Acquire the image for `task`. With `refresh`, the image cache is
    /// not consulted and the result overwrites any cached image.
    #[instrument(skip(self, task), fields(coord = %task.coord, heading = %task.heading))]
    pub async fn acquire_with(
        &self,
        task: &AcquisitionTask,
        refresh: bool,
    ) -> Result<Acquired, AcquisitionError> {
        if !refresh {
            if let Some(bytes) = self.images.lookup(&task.key).await? {
                debug!("Image cache hit");
                return Ok(Acquired {
                    path: task.output.clone(),
                    bytes,
                    from_cache: true,
                });
            }
        }

        let pano_id = self.resolver.resolve(&task.coord).await?;
        let offset = self.calibrator.offset_for(&pano_id).await;
        let panorama = self.assembler.assemble(&pano_id, self.settings.zoom).await?;

        let view = ViewParams::new(
            task.heading.minus(offset.degrees()),
            self.settings.width,
            self.settings.height,
        )
        .with_pitch(self.settings.pitch)
        .with_fov(self.settings.fov);

        let projector = self.projector;
        let quality = self.settings.jpeg_quality;
        let bytes = tokio::task::spawn_blocking(move || {
            let image = projector.project(&panorama.raster, &view);
            encode_jpeg(&image, quality)
        })
        .await??;

        let path = self.images.store(&task.key, &bytes).await?;
        info!(
            pano_id = %pano_id,
            offset = offset.degrees(),
            calibrated = offset.is_calibrated(),
            path = %path.display(),
            "Acquired image"
        );

        Ok(Acquired {
            path,
            bytes,
            from_cache: false,
        })
    }

    /// Whether the final image for `task` already exists.
    pub async fn is_cached(&self, task: &AcquisitionTask) -> bool {
        self.images.contains(&task.key).await
    }

    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            tiles: self.assembler.tile_stats(),
            panoramas: self.assembler.cache_stats(),
            images: self.images.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{HttpResponse, MockAsyncHttpClient, ProviderError};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn tile_jpeg() -> Vec<u8> {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 64]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    fn provider() -> MockAsyncHttpClient {
        let tile = tile_jpeg();
        MockAsyncHttpClient::new(move |url| {
            if url.contains("/metadata") {
                Ok(HttpResponse::ok(
                    br#"{"status":"OK","pano_id":"pano1","copyright":"(c) Google"}"#.to_vec(),
                ))
            } else if url.contains("photometa") {
                Ok(HttpResponse::status(500))
            } else {
                Ok(HttpResponse::ok(tile.clone()).with_content_type("image/jpeg"))
            }
        })
    }

    fn acquirer(mock: &MockAsyncHttpClient, temp: &TempDir) -> Acquirer<MockAsyncHttpClient> {
        let mut settings = AcquireSettings::new(temp.path());
        settings.zoom = 1;
        settings.tile_size = 16;
        settings.min_tile_bytes = 64;
        settings.width = 32;
        settings.height = 24;
        Acquirer::new(mock.clone(), Endpoints::default(), "key", settings)
    }

    fn task(acquirer: &Acquirer<MockAsyncHttpClient>) -> AcquisitionTask {
        acquirer.task_for(
            Coordinate::new(35.0, 139.0).unwrap(),
            Coordinate::new(35.001, 139.0).unwrap(),
        )
    }

    /// Tile `x` of a 4x2 grid of 16px tiles. A red band covers panorama
    /// columns 8..24, centred on W/4; everything else is blue.
    fn banded_tile(x: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(16, 16, |px, _| {
            let column = x * 16 + px;
            if (8..24).contains(&column) {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    /// Provider whose photometa answer is `photometa`.
    fn banded_provider(photometa: Result<HttpResponse, ProviderError>) -> MockAsyncHttpClient {
        let tiles: Vec<Vec<u8>> = (0..4).map(banded_tile).collect();
        MockAsyncHttpClient::new(move |url| {
            if url.contains("/metadata") {
                Ok(HttpResponse::ok(
                    br#"{"status":"OK","pano_id":"banded","copyright":"(c) Google"}"#.to_vec(),
                ))
            } else if url.contains("photometa") {
                photometa.clone()
            } else {
                let x = (0..4)
                    .find(|x| url.contains(&format!("&x={}&", x)))
                    .unwrap();
                Ok(HttpResponse::ok(tiles[x as usize].clone()).with_content_type("image/jpeg"))
            }
        })
    }

    async fn centre_pixel(mock: &MockAsyncHttpClient) -> Rgb<u8> {
        let temp = TempDir::new().unwrap();
        let mut settings = AcquireSettings::new(temp.path());
        settings.zoom = 2;
        settings.tile_size = 16;
        settings.min_tile_bytes = 64;
        settings.width = 32;
        settings.height = 24;
        let acquirer = Acquirer::new(mock.clone(), Endpoints::default(), "key", settings);

        // World heading 0.
        let task = acquirer.task_for(
            Coordinate::new(35.0, 139.0).unwrap(),
            Coordinate::new(35.001, 139.0).unwrap(),
        );
        assert_eq!(task.heading.rounded(), 0);

        let acquired = acquirer.acquire(&task).await.unwrap();
        let image = image::load_from_memory(&acquired.bytes).unwrap().to_rgb8();
        *image.get_pixel(16, 12)
    }

    #[tokio::test]
    async fn test_calibrated_offset_rotates_view() {
        // Offset 90 turns world heading 0 into panorama heading 270, which
        // looks at column W/4.
        let body = ")]}'\n[null,[[null,null,null,null,null,[[null,[null,null,[90,0.5,1.2]]]]]]]";
        let mock = banded_provider(Ok(HttpResponse::ok(body.as_bytes().to_vec())));

        let pixel = centre_pixel(&mock).await;

        assert_eq!(mock.count_matching("photometa"), 1);
        assert!(pixel[0] > 200 && pixel[2] < 60, "expected red band, got {:?}", pixel);
    }

    #[tokio::test]
    async fn test_uncalibrated_view_uses_world_heading() {
        let mock = banded_provider(Ok(HttpResponse::status(500)));

        let pixel = centre_pixel(&mock).await;

        assert!(pixel[2] > 200 && pixel[0] < 60, "expected blue, got {:?}", pixel);
    }

    #[test]
    fn test_task_heading_and_output() {
        let temp = TempDir::new().unwrap();
        let acquirer = acquirer(&provider(), &temp);
        let task = task(&acquirer);

        assert_eq!(task.heading.rounded(), 0);
        assert_eq!(
            task.output,
            temp.path()
                .join("images")
                .join("highres_35.000000_139.000000_h0_32x24.jpg")
        );
    }

    #[tokio::test]
    async fn test_acquire_produces_requested_size() {
        let temp = TempDir::new().unwrap();
        let mock = provider();
        let acquirer = acquirer(&mock, &temp);

        let acquired = acquirer.acquire(&task(&acquirer)).await.unwrap();

        assert!(!acquired.from_cache);
        assert!(acquired.path.exists());
        let decoded = image::load_from_memory(&acquired.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[tokio::test]
    async fn test_second_acquire_is_cache_hit() {
        let temp = TempDir::new().unwrap();
        let mock = provider();
        let acquirer = acquirer(&mock, &temp);
        let task = task(&acquirer);

        let first = acquirer.acquire(&task).await.unwrap();
        let requests = mock.requests().len();
        let second = acquirer.acquire(&task).await.unwrap();

        assert!(second.from_cache);
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(mock.requests().len(), requests);
        assert_eq!(acquirer.cache_report().images.hits, 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_image_cache_only() {
        let temp = TempDir::new().unwrap();
        let mock = provider();
        let acquirer = acquirer(&mock, &temp);
        let task = task(&acquirer);

        acquirer.acquire(&task).await.unwrap();
        let tile_requests = mock.count_matching("cb_client");
        let refreshed = acquirer.acquire_with(&task, true).await.unwrap();

        assert!(!refreshed.from_cache);
        assert_eq!(mock.count_matching("/metadata"), 2);
        assert_eq!(mock.count_matching("cb_client"), tile_requests);
    }

    #[tokio::test]
    async fn test_untrusted_source_stores_nothing() {
        let temp = TempDir::new().unwrap();
        let mock = MockAsyncHttpClient::fixed(Ok(HttpResponse::ok(
            br#"{"status":"OK","pano_id":"p","copyright":"(c) A Hiker"}"#.to_vec(),
        )));
        let acquirer = acquirer(&mock, &temp);
        let task = task(&acquirer);

        let err = acquirer.acquire(&task).await.unwrap_err();
        assert_eq!(err.kind(), "untrusted_source");
        assert!(!acquirer.is_cached(&task).await);
        assert_eq!(mock.requests().len(), 1);
    }
}
