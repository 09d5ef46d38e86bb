//! Fetch command - acquire the image for a single location.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use panocast::coord::Coordinate;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Latitude of the location
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the location
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Latitude of the point the image should face
    #[arg(long, allow_hyphen_values = true)]
    pub next_lat: f64,

    /// Longitude of the point the image should face
    #[arg(long, allow_hyphen_values = true)]
    pub next_lng: f64,

    /// Copy the image to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ignore a cached image and acquire again
    #[arg(long)]
    pub force: bool,
}

/// Run the fetch command.
pub fn run(runner: CliRunner, args: FetchArgs) -> Result<(), CliError> {
    runner.log_startup("fetch");

    let coord = coordinate(args.lat, args.lng)?;
    let aim = coordinate(args.next_lat, args.next_lng)?;

    let acquirer = runner.create_acquirer()?;
    let task = acquirer.task_for(coord, aim);
    println!("Location: {} facing {}", coord, task.heading);

    let runtime = runner.runtime()?;
    let acquired = runtime.block_on(acquirer.acquire_with(&task, args.force))?;

    let source = if acquired.from_cache { "cache" } else { "network" };
    println!("Image: {} (from {})", acquired.path.display(), source);

    if let Some(output) = args.output {
        fs::write(&output, &acquired.bytes).map_err(|error| CliError::FileWrite {
            path: output.clone(),
            error,
        })?;
        info!(path = %output.display(), bytes = acquired.bytes.len(), "Image copied");
        println!("Copied to: {}", output.display());
    }

    Ok(())
}

fn coordinate(lat: f64, lng: f64) -> Result<Coordinate, CliError> {
    Coordinate::new(lat, lng).map_err(|e| CliError::Setup(e.to_string()))
}
