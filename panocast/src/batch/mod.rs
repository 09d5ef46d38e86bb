//! Bounded-concurrency batch acquisition.
//!
//! Tasks run on the tokio runtime with at most `workers` in flight. Every
//! task is spawned separately, so a failure or panic in one task is recorded
//! against that task and the rest of the batch carries on.

mod plan;

pub use plan::{plan_batch, rows_from_targets, BatchPlan, PlanOptions};

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::acquire::{Acquirer, AcquisitionTask};
use crate::coord::Coordinate;
use crate::error::AcquisitionError;
use crate::provider::AsyncHttpClient;

/// Default number of concurrent acquisitions.
pub const DEFAULT_WORKERS: usize = 8;

/// Default number of individually logged failures.
pub const DEFAULT_FAILURE_LOG_LIMIT: usize = 5;

/// Completed tasks between progress log lines.
const PROGRESS_INTERVAL: usize = 100;

/// Batch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub workers: usize,
    pub failure_log_limit: usize,
    /// Bypass the image cache and overwrite existing images.
    pub refresh: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            failure_log_limit: DEFAULT_FAILURE_LOG_LIMIT,
            refresh: false,
        }
    }
}

/// A task that did not produce an image.
#[derive(Debug)]
pub struct FailureRecord {
    pub coord: Coordinate,
    pub error: AcquisitionError,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// Successes served from the image cache.
    pub from_cache: usize,
    /// Tasks left out during planning.
    pub skipped: usize,
    pub failures: Vec<FailureRecord>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed()
    }

    /// Failure counts grouped by error kind, sorted by kind.
    pub fn failure_kinds(&self) -> Vec<(&'static str, usize)> {
        let mut kinds: Vec<(&'static str, usize)> = Vec::new();
        for failure in &self.failures {
            let kind = failure.error.kind();
            match kinds.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, count)) => *count += 1,
                None => kinds.push((kind, 1)),
            }
        }
        kinds.sort_by_key(|(k, _)| *k);
        kinds
    }
}

/// Drives many acquisition tasks through a shared [`Acquirer`].
pub struct BatchAcquirer<C: AsyncHttpClient + Clone + 'static> {
    acquirer: Arc<Acquirer<C>>,
    settings: BatchSettings,
}

impl<C: AsyncHttpClient + Clone + 'static> BatchAcquirer<C> {
    pub fn new(acquirer: Arc<Acquirer<C>>, settings: BatchSettings) -> Self {
        Self { acquirer, settings }
    }

    pub fn acquirer(&self) -> &Arc<Acquirer<C>> {
        &self.acquirer
    }

    /// Run every task in `plan` and fold the outcomes into a summary.
    pub async fn run_plan(&self, plan: BatchPlan) -> BatchSummary {
        let skipped = plan.skipped();
        let mut summary = self.run(plan.tasks).await;
        summary.skipped = skipped;
        summary
    }

    /// Run `tasks` with bounded concurrency. Never fails as a whole.
    pub async fn run(&self, tasks: Vec<AcquisitionTask>) -> BatchSummary {
        let total = tasks.len();
        let workers = self.settings.workers.max(1);
        let refresh = self.settings.refresh;
        info!(tasks = total, workers, "Starting batch");

        let mut outcomes = stream::iter(tasks)
            .map(|task| {
                let acquirer = Arc::clone(&self.acquirer);
                let coord = task.coord;
                let handle =
                    tokio::spawn(async move { acquirer.acquire_with(&task, refresh).await });
                async move {
                    let outcome = match handle.await {
                        Ok(result) => result,
                        Err(join_error) => Err(AcquisitionError::from(join_error)),
                    };
                    (coord, outcome)
                }
            })
            .buffer_unordered(workers);

        let mut summary = BatchSummary::default();
        let mut completed = 0usize;
        while let Some((coord, outcome)) = outcomes.next().await {
            completed += 1;
            match outcome {
                Ok(acquired) => {
                    summary.succeeded += 1;
                    if acquired.from_cache {
                        summary.from_cache += 1;
                    }
                }
                Err(error) => {
                    if summary.failures.len() < self.settings.failure_log_limit {
                        warn!(
                            coord = %coord,
                            kind = error.kind(),
                            error = %error,
                            "Acquisition failed"
                        );
                    }
                    summary.failures.push(FailureRecord { coord, error });
                }
            }
            if completed % PROGRESS_INTERVAL == 0 {
                info!(completed, total, failed = summary.failed(), "Batch progress");
            }
        }

        let suppressed = summary.failed().saturating_sub(self.settings.failure_log_limit);
        if suppressed > 0 {
            warn!(suppressed, "Further failures not logged individually");
        }

        let caches = self.acquirer.cache_report();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            from_cache = summary.from_cache,
            tile_hits = caches.tiles.hits,
            tile_misses = caches.tiles.misses,
            panorama_hits = caches.panoramas.hits,
            panorama_misses = caches.panoramas.misses,
            image_writes = caches.images.writes,
            "Batch complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::AcquireSettings;
    use crate::provider::{Endpoints, HttpResponse, MockAsyncHttpClient};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn tile_jpeg() -> Vec<u8> {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 200]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    /// Provider with imagery everywhere except at latitude `missing_lat`.
    fn provider(missing_lat: &'static str) -> MockAsyncHttpClient {
        let tile = tile_jpeg();
        MockAsyncHttpClient::new(move |url| {
            if url.contains("/metadata") {
                if url.contains(&format!("location={},", missing_lat)) {
                    return Ok(HttpResponse::ok(br#"{"status":"ZERO_RESULTS"}"#.to_vec()));
                }
                let lat = url
                    .split("location=")
                    .nth(1)
                    .and_then(|rest| rest.split(',').next())
                    .unwrap_or("0");
                let body = format!(
                    r#"{{"status":"OK","pano_id":"p{}","copyright":"Google"}}"#,
                    lat
                );
                Ok(HttpResponse::ok(body.into_bytes()))
            } else if url.contains("photometa") {
                Ok(HttpResponse::status(404))
            } else {
                Ok(HttpResponse::ok(tile.clone()).with_content_type("image/jpeg"))
            }
        })
    }

    fn acquirer(mock: &MockAsyncHttpClient, temp: &TempDir) -> Arc<Acquirer<MockAsyncHttpClient>> {
        let mut settings = AcquireSettings::new(temp.path());
        settings.zoom = 1;
        settings.tile_size = 16;
        settings.min_tile_bytes = 64;
        settings.width = 16;
        settings.height = 12;
        Arc::new(Acquirer::new(mock.clone(), Endpoints::default(), "key", settings))
    }

    fn tasks(acquirer: &Acquirer<MockAsyncHttpClient>) -> Vec<AcquisitionTask> {
        (0..10)
            .map(|i| {
                let lat = 30.0 + i as f64;
                acquirer.task_for(
                    Coordinate::new(lat, 139.0).unwrap(),
                    Coordinate::new(lat, 139.001).unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_one_failure_is_isolated() {
        let temp = TempDir::new().unwrap();
        let mock = provider("35");
        let acquirer = acquirer(&mock, &temp);
        let batch = BatchAcquirer::new(Arc::clone(&acquirer), BatchSettings::default());

        let summary = batch.run(tasks(&acquirer)).await;

        assert_eq!(summary.succeeded, 9);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures[0].coord, Coordinate::new(35.0, 139.0).unwrap());
        assert!(summary.failures[0].error.is_unavailable());
        assert_eq!(summary.failure_kinds(), vec![("unavailable", 1)]);
    }

    #[tokio::test]
    async fn test_rerun_serves_from_cache() {
        let temp = TempDir::new().unwrap();
        let mock = provider("none");
        let acquirer = acquirer(&mock, &temp);
        let batch = BatchAcquirer::new(Arc::clone(&acquirer), BatchSettings::default());

        batch.run(tasks(&acquirer)).await;
        let requests = mock.requests().len();
        let summary = batch.run(tasks(&acquirer)).await;

        assert_eq!(summary.succeeded, 10);
        assert_eq!(summary.from_cache, 10);
        assert_eq!(mock.requests().len(), requests);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let temp = TempDir::new().unwrap();
        let mock = MockAsyncHttpClient::new(|url| {
            if url.contains("location=31,") {
                panic!("provider blew up");
            }
            Ok(HttpResponse::ok(br#"{"status":"ZERO_RESULTS"}"#.to_vec()))
        });
        let acquirer = acquirer(&mock, &temp);
        let batch = BatchAcquirer::new(
            Arc::clone(&acquirer),
            BatchSettings {
                workers: 2,
                ..BatchSettings::default()
            },
        );

        let summary = batch.run(tasks(&acquirer)).await;

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed(), 10);
        assert_eq!(
            summary.failure_kinds(),
            vec![("unavailable", 9), ("worker", 1)]
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let temp = TempDir::new().unwrap();
        let mock = provider("none");
        let batch = BatchAcquirer::new(acquirer(&mock, &temp), BatchSettings::default());

        let summary = batch.run(Vec::new()).await;
        assert_eq!(summary.attempted(), 0);
    }
}
