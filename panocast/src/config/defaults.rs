//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::batch::{DEFAULT_FAILURE_LOG_LIMIT, DEFAULT_WORKERS};
use crate::panorama::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MIN_TILE_BYTES, DEFAULT_TILE_SIZE, DEFAULT_ZOOM,
};
use crate::projection::{DEFAULT_FOV, DEFAULT_HEIGHT, DEFAULT_PITCH, DEFAULT_WIDTH};
use crate::provider::{
    DEFAULT_METADATA_URL, DEFAULT_PHOTOMETA_URL, DEFAULT_TILE_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TRUSTED_PUBLISHER,
};

/// Environment variable that overrides `[provider] api_key`.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Highest supported zoom level.
pub const MAX_ZOOM: u8 = 7;

/// Default calibration language.
pub const DEFAULT_LANGUAGE: &str = "ja";

/// Default calibration region.
pub const DEFAULT_REGION: &str = "jp";

/// Name of the config directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".panocast";

/// Get the path to the config directory (~/.panocast).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.panocast/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            provider: ProviderSettings {
                api_key: None,
                request_timeout: DEFAULT_TIMEOUT_SECS,
            },
            endpoints: EndpointSettings {
                metadata_url: DEFAULT_METADATA_URL.to_string(),
                photometa_url: DEFAULT_PHOTOMETA_URL.to_string(),
                tile_url: DEFAULT_TILE_URL.to_string(),
                trusted_publisher: DEFAULT_TRUSTED_PUBLISHER.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
                region: DEFAULT_REGION.to_string(),
            },
            cache: CacheSettings {
                directory: config_dir.join("cache"),
            },
            panorama: PanoramaSettings {
                zoom: DEFAULT_ZOOM,
                tile_size: DEFAULT_TILE_SIZE,
                min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
                fallback_min_zoom: None,
            },
            image: ImageSettings {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                fov: DEFAULT_FOV,
                pitch: DEFAULT_PITCH,
                jpeg_quality: DEFAULT_JPEG_QUALITY,
            },
            batch: BatchFileSettings {
                workers: DEFAULT_WORKERS,
                failure_log_limit: DEFAULT_FAILURE_LOG_LIMIT,
            },
            sources: SourceSettings {
                targets_dir: config_dir.join("targets"),
                locations_file: None,
            },
            logging: LoggingSettings {
                file: config_dir.join("panocast.log"),
            },
        }
    }
}
