//! Acquisition error taxonomy.
//!
//! Propagation rules:
//!
//! - [`InvalidTile`] aborts only the panorama assembly it occurs in, where it
//!   becomes [`AcquisitionError::AssemblyFailed`].
//! - `Unavailable`, `UntrustedSource` and `AssemblyFailed` reach the task
//!   level and are recorded by the batch acquirer as per-task failures.
//! - `Configuration` is raised before any task starts.
//! - Calibration problems never surface here; the calibrator logs them and
//!   falls back to a neutral offset.

use thiserror::Error;

use crate::cache::{CacheError, TileKey};
use crate::coord::Coordinate;
use crate::provider::PanoramaId;

/// Why a tile response was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileRejection {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response is not an image
    #[error("expected an image payload, got content type '{0}'")]
    ContentType(String),

    /// Response is smaller than a real tile can be (placeholder/blank)
    #[error("payload too small ({size} bytes, minimum {min})")]
    TooSmall { size: usize, min: usize },

    /// Bytes passed validation but are not a decodable image
    #[error("undecodable image: {0}")]
    Undecodable(String),
}

/// A single tile failed transport or content validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid tile {tile}: {reason}")]
pub struct InvalidTile {
    pub tile: TileKey,
    pub reason: TileRejection,
}

/// Errors that end an acquisition.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// No imagery exists at this location
    #[error("No street-level imagery at {coord}: {reason}")]
    Unavailable { coord: Coordinate, reason: String },

    /// Imagery exists but its copyright does not name the trusted publisher
    #[error("Imagery at {coord} is user-contributed ({copyright})")]
    UntrustedSource { coord: Coordinate, copyright: String },

    /// A tile outside of any assembly was invalid
    #[error(transparent)]
    InvalidTile(#[from] InvalidTile),

    /// A panorama could not be assembled because one of its tiles failed
    #[error("Assembly of panorama {pano_id} at zoom {zoom} failed at tile ({x}, {y})")]
    AssemblyFailed {
        pano_id: PanoramaId,
        zoom: u8,
        x: u32,
        y: u32,
        #[source]
        source: InvalidTile,
    },

    /// Fatal setup problem (missing credential, invalid settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cache read or write failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Image decoding, encoding or rasterization failed
    #[error("Image processing failed: {0}")]
    Image(String),

    /// A blocking worker job panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl AcquisitionError {
    /// Whether this error means "no usable imagery here" rather than a fault.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AcquisitionError::Unavailable { .. } | AcquisitionError::UntrustedSource { .. }
        )
    }

    /// Short machine-friendly kind label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AcquisitionError::Unavailable { .. } => "unavailable",
            AcquisitionError::UntrustedSource { .. } => "untrusted_source",
            AcquisitionError::InvalidTile(_) => "invalid_tile",
            AcquisitionError::AssemblyFailed { .. } => "assembly_failed",
            AcquisitionError::Configuration(_) => "configuration",
            AcquisitionError::Cache(_) => "cache",
            AcquisitionError::Image(_) => "image",
            AcquisitionError::Worker(_) => "worker",
        }
    }
}

impl From<image::ImageError> for AcquisitionError {
    fn from(err: image::ImageError) -> Self {
        AcquisitionError::Image(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AcquisitionError {
    fn from(err: tokio::task::JoinError) -> Self {
        AcquisitionError::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> TileKey {
        TileKey::new(PanoramaId::parse("pano").unwrap(), 2, 1, 0)
    }

    #[test]
    fn test_assembly_failed_names_tile() {
        let err = AcquisitionError::AssemblyFailed {
            pano_id: PanoramaId::parse("pano").unwrap(),
            zoom: 2,
            x: 1,
            y: 0,
            source: InvalidTile {
                tile: tile(),
                reason: TileRejection::Status(404),
            },
        };
        assert_eq!(
            err.to_string(),
            "Assembly of panorama pano at zoom 2 failed at tile (1, 0)"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("HTTP status 404"));
    }

    #[test]
    fn test_too_small_display() {
        let reason = TileRejection::TooSmall {
            size: 120,
            min: 1000,
        };
        assert_eq!(
            reason.to_string(),
            "payload too small (120 bytes, minimum 1000)"
        );
    }

    #[test]
    fn test_unavailable_kinds() {
        let coord = Coordinate::new(1.0, 2.0).unwrap();
        let unavailable = AcquisitionError::Unavailable {
            coord,
            reason: "ZERO_RESULTS".to_string(),
        };
        let untrusted = AcquisitionError::UntrustedSource {
            coord,
            copyright: "© Someone".to_string(),
        };
        assert!(unavailable.is_unavailable());
        assert!(untrusted.is_unavailable());
        assert_eq!(untrusted.kind(), "untrusted_source");
        assert!(!AcquisitionError::Worker("x".into()).is_unavailable());
    }

    #[test]
    fn test_error_trait() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<AcquisitionError>();
        assert_error::<InvalidTile>();
    }
}
