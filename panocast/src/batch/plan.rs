//! Turning location rows into acquisition tasks.

use tracing::{debug, info};

use crate::acquire::{Acquirer, AcquisitionTask};
use crate::provider::AsyncHttpClient;
use crate::route::{next_waypoint, TargetIndex};
use crate::source::LocationRow;

/// Planning switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Keep tasks whose image already exists.
    pub force: bool,
    /// Maximum number of tasks, applied after existing images are skipped.
    pub limit: Option<usize>,
}

/// Tasks to run plus what was left out and why.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub tasks: Vec<AcquisitionTask>,
    /// Image already cached.
    pub skipped_existing: usize,
    /// Row not on any indexed route.
    pub without_route: usize,
    /// Row sits on the last vertex of its route.
    pub without_aim: usize,
    /// Dropped by the limit.
    pub over_limit: usize,
}

impl BatchPlan {
    /// Tasks left out for any reason.
    pub fn skipped(&self) -> usize {
        self.skipped_existing + self.without_route + self.without_aim + self.over_limit
    }
}

/// Rows built from the index's own check points, with unknown labels.
pub fn rows_from_targets(index: &TargetIndex) -> Vec<LocationRow> {
    index
        .check_points()
        .iter()
        .map(|coord| LocationRow {
            coord: *coord,
            label: None,
        })
        .collect()
}

/// Build the task list for `rows`.
///
/// Each row's aim point is the vertex after its nearest vertex on the
/// indexed route. Existence checks touch only the local image cache.
pub async fn plan_batch<C: AsyncHttpClient + Clone>(
    acquirer: &Acquirer<C>,
    index: &TargetIndex,
    rows: Vec<LocationRow>,
    options: PlanOptions,
) -> BatchPlan {
    let mut plan = BatchPlan::default();
    let total_rows = rows.len();

    for row in rows {
        let Some(route) = index.route_for(&row.coord) else {
            plan.without_route += 1;
            continue;
        };
        let Some(aim) = next_waypoint(&row.coord, route) else {
            debug!(coord = %row.coord, "No aim point, location is at the end of its route");
            plan.without_aim += 1;
            continue;
        };

        let task = acquirer.task_for(row.coord, aim);
        if !options.force && acquirer.is_cached(&task).await {
            plan.skipped_existing += 1;
            continue;
        }
        plan.tasks.push(task);
    }

    if let Some(limit) = options.limit {
        if plan.tasks.len() > limit {
            plan.over_limit = plan.tasks.len() - limit;
            plan.tasks.truncate(limit);
        }
    }

    info!(
        rows = total_rows,
        tasks = plan.tasks.len(),
        skipped_existing = plan.skipped_existing,
        without_route = plan.without_route,
        without_aim = plan.without_aim,
        over_limit = plan.over_limit,
        "Planned batch"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::AcquireSettings;
    use crate::coord::Coordinate;
    use crate::provider::{Endpoints, HttpResponse, MockAsyncHttpClient};
    use crate::route::TargetEntry;
    use tempfile::TempDir;

    fn index() -> TargetIndex {
        let mut index = TargetIndex::new();
        index.extend(vec![TargetEntry {
            geometry_list: vec![[35.0, 139.0], [35.1, 139.0], [35.2, 139.0], [35.3, 139.0]],
            geometry_check_list: vec![[35.0, 139.0], [35.1, 139.0], [35.2, 139.0], [35.3, 139.0]],
        }]);
        index
    }

    fn row(lat: f64, lng: f64) -> LocationRow {
        LocationRow {
            coord: Coordinate::new(lat, lng).unwrap(),
            label: Some(true),
        }
    }

    fn acquirer(temp: &TempDir) -> Acquirer<MockAsyncHttpClient> {
        let mock = MockAsyncHttpClient::fixed(Ok(HttpResponse::status(500)));
        Acquirer::new(mock, Endpoints::default(), "key", AcquireSettings::new(temp.path()))
    }

    #[tokio::test]
    async fn test_rows_off_route_are_dropped() {
        let temp = TempDir::new().unwrap();
        let plan = plan_batch(
            &acquirer(&temp),
            &index(),
            vec![row(35.1, 139.0), row(10.0, 10.0)],
            PlanOptions::default(),
        )
        .await;

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.without_route, 1);
        assert_eq!(plan.tasks[0].aim, Coordinate::new(35.2, 139.0).unwrap());
    }

    #[tokio::test]
    async fn test_existing_images_skipped_unless_forced() {
        let temp = TempDir::new().unwrap();
        let acquirer = acquirer(&temp);
        let rows = vec![row(35.1, 139.0), row(35.2, 139.0)];

        let existing = acquirer.task_for(
            Coordinate::new(35.1, 139.0).unwrap(),
            Coordinate::new(35.2, 139.0).unwrap(),
        );
        std::fs::create_dir_all(existing.output.parent().unwrap()).unwrap();
        std::fs::write(&existing.output, b"jpeg").unwrap();

        let plan = plan_batch(&acquirer, &index(), rows.clone(), PlanOptions::default()).await;
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.skipped_existing, 1);

        let forced = PlanOptions {
            force: true,
            limit: None,
        };
        let plan = plan_batch(&acquirer, &index(), rows, forced).await;
        assert_eq!(plan.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_limit_applies_after_skipping_existing() {
        let temp = TempDir::new().unwrap();
        let acquirer = acquirer(&temp);

        let first = acquirer.task_for(
            Coordinate::new(35.1, 139.0).unwrap(),
            Coordinate::new(35.2, 139.0).unwrap(),
        );
        std::fs::create_dir_all(first.output.parent().unwrap()).unwrap();
        std::fs::write(&first.output, b"jpeg").unwrap();

        let options = PlanOptions {
            force: false,
            limit: Some(1),
        };
        let plan = plan_batch(
            &acquirer,
            &index(),
            vec![row(35.1, 139.0), row(35.2, 139.0)],
            options,
        )
        .await;

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].coord, Coordinate::new(35.2, 139.0).unwrap());
        assert_eq!(plan.skipped(), 1);
    }

    #[tokio::test]
    async fn test_rows_from_targets_exclude_route_ends() {
        let temp = TempDir::new().unwrap();
        let index = index();
        let rows = rows_from_targets(&index);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.label.is_none()));

        let plan = plan_batch(&acquirer(&temp), &index, rows, PlanOptions::default()).await;
        assert_eq!(plan.tasks.len(), 2);
    }
}
