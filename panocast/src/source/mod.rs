//! Location sources that feed the batch pipeline.
//!
//! Location rows normally live in a relational store owned by another
//! service. The engine only reads `(lat, lng, label)` rows, so the store is
//! modelled as the [`LocationStore`] trait. [`JsonLocationStore`] reads an
//! exported snapshot of that table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::coord::Coordinate;

/// Errors raised while reading location sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read a source file or directory
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not valid JSON of the expected shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A location record: a coordinate plus an optional ground-truth label.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub coord: Coordinate,
    pub label: Option<bool>,
}

/// Read-only access to stored location rows.
pub trait LocationStore: Send + Sync {
    /// Returns every row eligible for acquisition.
    fn fetch_locations(&self) -> Result<Vec<LocationRow>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct RawRow {
    lat: f64,
    lng: f64,
    #[serde(default)]
    label: Option<bool>,
}

/// [`LocationStore`] backed by a JSON array export:
/// `[{"lat": 35.1, "lng": 139.2, "label": true}, ...]`.
#[derive(Debug, Clone)]
pub struct JsonLocationStore {
    path: PathBuf,
}

impl JsonLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationStore for JsonLocationStore {
    fn fetch_locations(&self) -> Result<Vec<LocationRow>, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let raw: Vec<RawRow> = serde_json::from_str(&text).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let total = raw.len();
        let rows: Vec<LocationRow> = raw
            .into_iter()
            .filter_map(|row| {
                Coordinate::new(row.lat, row.lng)
                    .ok()
                    .map(|coord| LocationRow {
                        coord,
                        label: row.label,
                    })
            })
            .collect();

        if rows.len() < total {
            debug!(
                dropped = total - rows.len(),
                "Dropped location rows with invalid coordinates"
            );
        }
        Ok(rows)
    }
}
