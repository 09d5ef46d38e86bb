//! Route-target index built from per-region `target.json` files.
//!
//! # Layout
//!
//! ```text
//! <targets_dir>/<region>/target.json
//! ```
//!
//! Each file is a JSON array of entries:
//!
//! ```text
//! [{ "geometry_list": [[lat, lng], ...], "geometry_check_list": [[lat, lng], ...] }, ...]
//! ```
//!
//! `geometry_list` is the route polyline. `geometry_check_list` holds the
//! coordinates that imagery is acquired for; its first and last elements are
//! the route endpoints and are never used as check points.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::RoutePolyline;
use crate::coord::Coordinate;
use crate::source::SourceError;

/// File name of the per-region target list.
pub const TARGET_FILE_NAME: &str = "target.json";

/// Minimum number of entries in a check list for it to contribute points.
const MIN_CHECK_POINTS: usize = 3;

/// One route entry as stored in `target.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetEntry {
    #[serde(default)]
    pub geometry_list: Vec<[f64; 2]>,
    #[serde(default)]
    pub geometry_check_list: Vec<[f64; 2]>,
}

/// Lookup from check-point coordinate to the route it lies on.
#[derive(Debug, Default)]
pub struct TargetIndex {
    /// Coordinate key -> polyline. First entry seen for a key wins.
    routes: HashMap<String, Arc<RoutePolyline>>,
    /// Check points in discovery order.
    points: Vec<Coordinate>,
}

impl TargetIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every selected region under `targets_dir`.
    ///
    /// With `regions == None`, every directory whose name is all digits is
    /// loaded. Missing or malformed files are skipped with a warning; a
    /// missing `targets_dir` yields an empty index.
    pub fn load(targets_dir: &Path, regions: Option<&[String]>) -> Result<Self, SourceError> {
        let mut index = Self::new();

        if !targets_dir.is_dir() {
            warn!(path = %targets_dir.display(), "Targets directory not found");
            return Ok(index);
        }

        let regions = match regions {
            Some(regions) => regions.to_vec(),
            None => discover_regions(targets_dir)?,
        };
        info!(regions = regions.len(), "Loading route targets");

        for region in &regions {
            let path = targets_dir.join(region).join(TARGET_FILE_NAME);
            if !path.exists() {
                debug!(region = %region, "No target file for region");
                continue;
            }

            let entries = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    serde_json::from_str::<Vec<TargetEntry>>(&text).map_err(|e| e.to_string())
                });

            match entries {
                Ok(entries) => index.extend(entries),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable target file");
                }
            }
        }

        info!(points = index.len(), "Route target index built");
        Ok(index)
    }

    /// Adds entries to the index.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = TargetEntry>) {
        for entry in entries {
            if entry.geometry_check_list.len() < MIN_CHECK_POINTS {
                continue;
            }

            let route: Option<RoutePolyline> = entry
                .geometry_list
                .iter()
                .map(|[lat, lng]| Coordinate::new(*lat, *lng).ok())
                .collect();
            let Some(route) = route else {
                debug!("Skipping target entry with invalid route vertex");
                continue;
            };
            let route = Arc::new(route);

            let inner = &entry.geometry_check_list[1..entry.geometry_check_list.len() - 1];
            for [lat, lng] in inner {
                let Ok(point) = Coordinate::new(*lat, *lng) else {
                    continue;
                };
                let key = point.key();
                if !self.routes.contains_key(&key) {
                    self.routes.insert(key, Arc::clone(&route));
                    self.points.push(point);
                }
            }
        }
    }

    /// The route the given coordinate was registered against.
    pub fn route_for(&self, point: &Coordinate) -> Option<&RoutePolyline> {
        self.routes.get(&point.key()).map(|r| r.as_ref())
    }

    /// Whether the coordinate is a known check point.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.routes.contains_key(&point.key())
    }

    /// All check points in discovery order.
    pub fn check_points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Number of distinct check points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index has no check points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lists all-digit subdirectory names, sorted.
fn discover_regions(targets_dir: &Path) -> Result<Vec<String>, SourceError> {
    let read_dir = fs::read_dir(targets_dir).map_err(|source| SourceError::Io {
        path: targets_dir.to_path_buf(),
        source,
    })?;

    let mut regions: Vec<String> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .collect();
    regions.sort();
    Ok(regions)
}
