//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes. Only setup failures end up here; a batch run
//! with failed tasks still exits successfully.

use panocast::config::ConfigFileError;
use panocast::provider::ProviderError;
use panocast::source::SourceError;
use panocast::AcquisitionError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to build the HTTP client or async runtime
    Setup(String),
    /// Route targets or location rows could not be read
    Source(SourceError),
    /// Single-location acquisition failed
    Acquisition(AcquisitionError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::MissingCredential { env }) => {
                eprintln!();
                eprintln!("An API key for the street-level metadata endpoint is required:");
                eprintln!("  1. export {}=<your key>", env);
                eprintln!("  2. or set api_key under [provider] in the config file");
                eprintln!("     (run 'panocast init' to create one)");
            }
            CliError::Acquisition(AcquisitionError::UntrustedSource { .. }) => {
                eprintln!();
                eprintln!("The nearest panorama is user-contributed and was not used.");
                eprintln!("Try a nearby coordinate on the road.");
            }
            CliError::Source(_) => {
                eprintln!();
                eprintln!("Check [sources] targets_dir and locations_file in the config file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Setup(msg) => write!(f, "Setup failed: {}", msg),
            CliError::Source(e) => write!(f, "Failed to read coordinates: {}", e),
            CliError::Acquisition(e) => write!(f, "Acquisition failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Source(e) => Some(e),
            CliError::Acquisition(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<AcquisitionError> for CliError {
    fn from(e: AcquisitionError) -> Self {
        CliError::Acquisition(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Setup(e.to_string())
    }
}
