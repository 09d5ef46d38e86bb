//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let api_key = config.provider.api_key.as_deref().unwrap_or("");
    let fallback_min_zoom = config
        .panorama
        .fallback_min_zoom
        .map(|z| z.to_string())
        .unwrap_or_default();
    let locations_file = config
        .sources
        .locations_file
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[provider]
; API key for the street-level metadata endpoint.
; The GOOGLE_MAPS_API_KEY environment variable takes precedence.
api_key = {}
; Per-request timeout in seconds (default: 30)
request_timeout = {}

[endpoints]
; Provider endpoints. Only change these to point at a proxy or mirror.
metadata_url = {}
photometa_url = {}
tile_url = {}
; Copyright substring that marks first-party imagery.
; Panoramas whose copyright lacks it are rejected as user-contributed.
trusted_publisher = {}
; Locale sent to the heading calibration endpoint
language = {}
region = {}

[cache]
; Root of the tiles/, panoramas/ and images/ caches
directory = {}

[panorama]
; Zoom level 1-7 (default: 3). The tile grid is 2^zoom x 2^(zoom-1).
zoom = {}
; Tile edge length in pixels (default: 512)
tile_size = {}
; Tiles smaller than this are treated as provider placeholders (default: 1000)
min_tile_bytes = {}
; Retry assembly at lower zooms down to this level. Empty disables fallback.
fallback_min_zoom = {}

[image]
; Output image size in pixels (default: 1280x960)
width = {}
height = {}
; Horizontal field of view in degrees (default: 90)
fov = {}
; Camera pitch in degrees, positive tilts toward the ground (default: 0)
pitch = {}
; JPEG quality 1-100 for panoramas and images (default: 90)
jpeg_quality = {}

[batch]
; Concurrent acquisitions (default: 8)
workers = {}
; Failures logged individually before the rest are summarized (default: 5)
failure_log_limit = {}

[sources]
; Directory of <region>/target.json route files
targets_dir = {}
; JSON export of location rows: [{{"lat": .., "lng": .., "label": ..}}]
locations_file = {}

[logging]
; Log file path
file = {}
"#,
        api_key,
        config.provider.request_timeout,
        config.endpoints.metadata_url,
        config.endpoints.photometa_url,
        config.endpoints.tile_url,
        config.endpoints.trusted_publisher,
        config.endpoints.language,
        config.endpoints.region,
        path_to_string(&config.cache.directory),
        config.panorama.zoom,
        config.panorama.tile_size,
        config.panorama.min_tile_bytes,
        fallback_min_zoom,
        config.image.width,
        config.image.height,
        config.image.fov,
        config.image.pitch,
        config.image.jpeg_quality,
        config.batch.workers,
        config.batch.failure_log_limit,
        path_to_string(&config.sources.targets_dir),
        locations_file,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
