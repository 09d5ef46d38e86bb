//! Configuration for panocast.
//!
//! Settings are read from `~/.panocast/config.ini`. A missing file means
//! defaults; unknown keys are ignored and invalid values are reported with
//! their section and key.
//!
//! # Example
//!
//! ```
//! use panocast::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.panorama.zoom, 3);
//! assert_eq!(config.batch.workers, 8);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    config_directory, config_file_path, API_KEY_ENV, CONFIG_DIR_NAME, DEFAULT_LANGUAGE,
    DEFAULT_REGION, MAX_ZOOM,
};
pub use file::ConfigFileError;
pub use settings::{
    BatchFileSettings, CacheSettings, ConfigFile, EndpointSettings, ImageSettings,
    LoggingSettings, PanoramaSettings, ProviderSettings, SourceSettings,
};
