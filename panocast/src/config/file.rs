//! Configuration file handling for ~/.panocast/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{config_file_path, API_KEY_ENV};
use super::settings::ConfigFile;
use crate::acquire::AcquireSettings;
use crate::batch::BatchSettings;
use crate::provider::Endpoints;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// No API key in the environment or the config file
    #[error("No API key configured: set {env} or [provider] api_key")]
    MissingCredential { env: &'static str },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.panocast/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create a config file with defaults at `path` if it doesn't exist.
    ///
    /// Returns whether a file was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        Self::ensure_exists_at(&path)?;
        Ok(path)
    }

    /// The API key, preferring the `GOOGLE_MAPS_API_KEY` environment variable.
    pub fn api_key(&self) -> Result<String, ConfigFileError> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    /// The API key given an explicit environment value.
    pub fn api_key_with_env(&self, env_value: Option<String>) -> Result<String, ConfigFileError> {
        env_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| self.provider.api_key.clone())
            .ok_or(ConfigFileError::MissingCredential { env: API_KEY_ENV })
    }

    /// Provider endpoints from the `[endpoints]` section.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            metadata_url: self.endpoints.metadata_url.clone(),
            photometa_url: self.endpoints.photometa_url.clone(),
            tile_url: self.endpoints.tile_url.clone(),
            trusted_publisher: self.endpoints.trusted_publisher.clone(),
            language: self.endpoints.language.clone(),
            region: self.endpoints.region.clone(),
        }
    }

    /// Pipeline settings from the `[cache]`, `[panorama]` and `[image]` sections.
    pub fn acquire_settings(&self) -> AcquireSettings {
        AcquireSettings {
            cache_dir: self.cache.directory.clone(),
            zoom: self.panorama.zoom,
            tile_size: self.panorama.tile_size,
            min_tile_bytes: self.panorama.min_tile_bytes,
            fallback_min_zoom: self.panorama.fallback_min_zoom,
            width: self.image.width,
            height: self.image.height,
            fov: self.image.fov,
            pitch: self.image.pitch,
            jpeg_quality: self.image.jpeg_quality,
        }
    }

    /// Batch settings from the `[batch]` section.
    pub fn batch_settings(&self, refresh: bool) -> BatchSettings {
        BatchSettings {
            workers: self.batch.workers,
            failure_log_limit: self.batch.failure_log_limit,
            refresh,
        }
    }
}
