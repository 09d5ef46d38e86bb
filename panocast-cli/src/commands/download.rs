//! Download command - batch acquisition over route targets.

use std::path::Path;

use clap::Args;
use panocast::batch::{plan_batch, rows_from_targets, BatchAcquirer, BatchSummary, PlanOptions};
use panocast::route::TargetIndex;
use panocast::source::{JsonLocationStore, LocationRow, LocationStore};
use tracing::{info, warn};

use super::common::parse_regions;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the download command.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Region codes to process (repeatable or comma-separated, default: all)
    #[arg(long = "region", value_name = "CODE", num_args = 1..)]
    pub regions: Vec<String>,

    /// Maximum number of locations to acquire
    #[arg(long)]
    pub limit: Option<usize>,

    /// Re-fetch images that already exist
    #[arg(long)]
    pub force: bool,

    /// Use the route targets' own check points instead of the locations file
    #[arg(long)]
    pub from_targets: bool,

    /// Concurrent acquisitions (overrides [batch] workers)
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Run the download command.
pub fn run(runner: CliRunner, args: DownloadArgs) -> Result<(), CliError> {
    runner.log_startup("download");
    let config = runner.config();

    let regions = parse_regions(&args.regions);
    let index = TargetIndex::load(&config.sources.targets_dir, regions.as_deref())?;
    if index.is_empty() {
        warn!(
            targets_dir = %config.sources.targets_dir.display(),
            "No route targets found"
        );
    }

    let rows = if args.from_targets {
        rows_from_targets(&index)
    } else {
        let Some(path) = config.sources.locations_file.as_deref() else {
            return Err(CliError::Setup(
                "no [sources] locations_file configured; pass --from-targets or set one"
                    .to_string(),
            ));
        };
        load_rows(path)?
    };

    let acquirer = runner.create_acquirer()?;
    let mut settings = config.batch_settings(args.force);
    if let Some(workers) = args.workers {
        settings.workers = workers.max(1);
    }
    let options = PlanOptions {
        force: args.force,
        limit: args.limit,
    };

    println!(
        "Processing {} locations across {} indexed check points",
        rows.len(),
        index.len()
    );

    let runtime = runner.runtime()?;
    let summary = runtime.block_on(async {
        let plan = plan_batch(&*acquirer, &index, rows, options).await;
        println!(
            "Acquiring {} images ({} skipped)",
            plan.tasks.len(),
            plan.skipped()
        );
        BatchAcquirer::new(acquirer.clone(), settings)
            .run_plan(plan)
            .await
    });

    print_summary(&summary);
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed(),
        "Download command finished"
    );
    Ok(())
}

fn load_rows(path: &Path) -> Result<Vec<LocationRow>, CliError> {
    let store = JsonLocationStore::new(path);
    let rows = store.fetch_locations()?;
    info!(path = %store.path().display(), rows = rows.len(), "Loaded location rows");
    Ok(rows)
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("Succeeded: {} ({} from cache)", summary.succeeded, summary.from_cache);
    println!("Skipped:   {}", summary.skipped);
    println!("Failed:    {}", summary.failed());
    for (kind, count) in summary.failure_kinds() {
        println!("  {:<18} {}", kind, count);
    }
}
