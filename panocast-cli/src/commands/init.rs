//! Init command - write the default configuration file.

use std::path::PathBuf;

use panocast::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Leaves an existing file untouched. Runs before logging is set up, since
/// the log location comes from the file being created.
pub fn run(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    println!();
    println!("Set [provider] api_key or export {}.", panocast::config::API_KEY_ENV);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_then_keeps_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        run(Some(path.clone())).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[cache]\ndirectory = /tmp/custom\n").unwrap();
        run(Some(path.clone())).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("/tmp/custom"));
    }
}
