//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, runtime and
//! pipeline construction so command handlers stay small.

use crate::error::CliError;
use panocast::acquire::Acquirer;
use panocast::config::{config_file_path, ConfigFile};
use panocast::logging::{default_log_file, init_logging, LoggingGuard};
use panocast::provider::AsyncReqwestClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Path the configuration was loaded from
    config_path: PathBuf,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to use instead of ~/.panocast/config.ini
    /// * `quiet` - Log to the file only, not to stdout
    pub fn new(config_path: Option<PathBuf>, quiet: bool) -> Result<Self, CliError> {
        let config_path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, !quiet)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("panocast v{}", panocast::VERSION);
        info!(
            config = %self.config_path.display(),
            cache = %self.config.cache.directory.display(),
            "panocast CLI: {} command",
            command
        );
    }

    /// Build the async runtime for the pipeline.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("panocast-worker")
            .build()
            .map_err(|e| CliError::Setup(format!("failed to start async runtime: {}", e)))
    }

    /// Build the acquisition pipeline from the loaded configuration.
    ///
    /// Fails before any network access if no API key is configured.
    pub fn create_acquirer(&self) -> Result<Arc<Acquirer<AsyncReqwestClient>>, CliError> {
        let api_key = self.config.api_key()?;
        let client = AsyncReqwestClient::with_timeout(self.config.provider.request_timeout)?;

        info!(
            zoom = self.config.panorama.zoom,
            width = self.config.image.width,
            height = self.config.image.height,
            "Acquisition pipeline ready"
        );
        Ok(Arc::new(Acquirer::new(
            client,
            self.config.endpoints(),
            api_key,
            self.config.acquire_settings(),
        )))
    }
}
