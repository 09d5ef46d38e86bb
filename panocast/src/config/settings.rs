//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Credentials and transport
    pub provider: ProviderSettings,
    /// Provider URLs and provenance
    pub endpoints: EndpointSettings,
    /// Cache root
    pub cache: CacheSettings,
    /// Tile grid and assembly
    pub panorama: PanoramaSettings,
    /// Output image geometry
    pub image: ImageSettings,
    /// Batch concurrency
    pub batch: BatchFileSettings,
    /// Coordinate sources
    pub sources: SourceSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Provider configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// API key for the metadata endpoint
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
}

/// Endpoint configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSettings {
    pub metadata_url: String,
    pub photometa_url: String,
    pub tile_url: String,
    /// Substring the copyright must contain for imagery to be accepted
    pub trusted_publisher: String,
    /// Language code sent to the calibration endpoint
    pub language: String,
    /// Region code sent to the calibration endpoint
    pub region: String,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Root directory; holds tiles/, panoramas/ and images/
    pub directory: PathBuf,
}

/// Panorama configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaSettings {
    /// Zoom level (grid is 2^zoom x 2^(zoom-1) tiles)
    pub zoom: u8,
    /// Tile edge length in pixels
    pub tile_size: u32,
    /// Smallest tile payload accepted as real imagery
    pub min_tile_bytes: usize,
    /// Lowest zoom to retry at when assembly fails; unset disables fallback
    pub fallback_min_zoom: Option<u8>,
}

/// Output image configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// Horizontal field of view in degrees
    pub fov: f64,
    /// Camera pitch in degrees
    pub pitch: f64,
    /// JPEG quality (1-100) for panoramas and images
    pub jpeg_quality: u8,
}

/// Batch configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFileSettings {
    /// Concurrent acquisitions
    pub workers: usize,
    /// Failures logged individually before suppression
    pub failure_log_limit: usize,
}

/// Coordinate source configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    /// Directory of `<region>/target.json` route files
    pub targets_dir: PathBuf,
    /// JSON export of location rows
    pub locations_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
