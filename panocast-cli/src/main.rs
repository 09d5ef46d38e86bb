//! panocast CLI - Command-line interface
//!
//! Acquires directional street-level images for road locations.
//!
//! # Commands
//!
//! - `download` - Acquire images for every indexed location
//! - `fetch` - Acquire the image for one location
//! - `init` - Write the default configuration file

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::download::DownloadArgs;
use commands::fetch::FetchArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "panocast")]
#[command(version, about = "Acquire directional street-level imagery", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.panocast/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log to the log file only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire images for route-target locations
    Download(DownloadArgs),
    /// Acquire the image for a single location
    Fetch(FetchArgs),
    /// Create the default configuration file
    Init,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        e.exit();
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init => commands::init::run(cli.config),
        Commands::Download(args) => {
            commands::download::run(CliRunner::new(cli.config, cli.quiet)?, args)
        }
        Commands::Fetch(args) => commands::fetch::run(CliRunner::new(cli.config, cli.quiet)?, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_flags() {
        let cli = Cli::try_parse_from([
            "panocast", "download", "--region", "09,07", "--region", "15", "--limit", "20",
            "--force", "--from-targets",
        ])
        .unwrap();
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.regions, vec!["09,07", "15"]);
                assert_eq!(args.limit, Some(20));
                assert!(args.force);
                assert!(args.from_targets);
                assert_eq!(args.workers, None);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_fetch_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "panocast", "--quiet", "fetch", "--lat", "-33.86", "--lng", "151.2", "--next-lat",
            "-33.85", "--next-lng", "151.2",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.lat, -33.86);
                assert_eq!(args.next_lat, -33.85);
                assert!(args.output.is_none());
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_fetch_requires_aim_point() {
        let result = Cli::try_parse_from(["panocast", "fetch", "--lat", "35.0", "--lng", "139.0"]);
        assert!(result.is_err());
    }
}
