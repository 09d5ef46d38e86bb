//! Core types and traits for the cache system.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::{key_degrees, Coordinate, Heading};
use crate::provider::PanoramaId;

/// The three independent on-disk cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Individual panorama tiles
    Tiles,
    /// Fully assembled equirectangular panoramas
    Panoramas,
    /// Final perspective images
    Images,
}

impl CacheNamespace {
    /// Directory name under the cache root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            CacheNamespace::Tiles => "tiles",
            CacheNamespace::Panoramas => "panoramas",
            CacheNamespace::Images => "images",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A content-addressed cache key.
///
/// The file name must be a pure function of the key so that checking for the
/// file's existence is the same as a cache lookup.
pub trait CacheKey {
    /// Namespace the key belongs to.
    const NAMESPACE: CacheNamespace;

    /// Deterministic file name for this key.
    fn file_name(&self) -> String;
}

/// Key of a single tile: `(pano_id, zoom, x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub pano_id: PanoramaId,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(pano_id: PanoramaId, zoom: u8, x: u32, y: u32) -> Self {
        Self { pano_id, zoom, x, y }
    }
}

impl CacheKey for TileKey {
    const NAMESPACE: CacheNamespace = CacheNamespace::Tiles;

    fn file_name(&self) -> String {
        format!("{}_z{}_x{}_y{}.jpg", self.pano_id, self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} zoom={} x={} y={}",
            self.pano_id, self.zoom, self.x, self.y
        )
    }
}

/// Key of an assembled panorama: `(pano_id, zoom)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanoramaKey {
    pub pano_id: PanoramaId,
    pub zoom: u8,
}

impl PanoramaKey {
    pub fn new(pano_id: PanoramaId, zoom: u8) -> Self {
        Self { pano_id, zoom }
    }
}

impl CacheKey for PanoramaKey {
    const NAMESPACE: CacheNamespace = CacheNamespace::Panoramas;

    fn file_name(&self) -> String {
        format!("{}_full_z{}.jpg", self.pano_id, self.zoom)
    }
}

impl fmt::Display for PanoramaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} zoom={}", self.pano_id, self.zoom)
    }
}

/// Key of a final perspective image: coordinate (6 decimals), heading rounded
/// to a whole degree, and output dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    lat: String,
    lng: String,
    pub heading: u16,
    pub width: u32,
    pub height: u32,
}

impl ImageKey {
    pub fn new(coord: &Coordinate, heading: Heading, width: u32, height: u32) -> Self {
        Self {
            lat: key_degrees(coord.lat()),
            lng: key_degrees(coord.lng()),
            heading: heading.rounded(),
            width,
            height,
        }
    }
}

impl CacheKey for ImageKey {
    const NAMESPACE: CacheNamespace = CacheNamespace::Images;

    fn file_name(&self) -> String {
        format!(
            "highres_{}_{}_h{}_{}x{}.jpg",
            self.lat, self.lng, self.heading, self.width, self.height
        )
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) heading={} {}x{}",
            self.lat, self.lng, self.heading, self.width, self.height
        )
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pano() -> PanoramaId {
        PanoramaId::parse("Xk2_pano").unwrap()
    }

    #[test]
    fn test_tile_file_name() {
        let key = TileKey::new(pano(), 3, 7, 2);
        assert_eq!(key.file_name(), "Xk2_pano_z3_x7_y2.jpg");
    }

    #[test]
    fn test_panorama_file_name() {
        let key = PanoramaKey::new(pano(), 3);
        assert_eq!(key.file_name(), "Xk2_pano_full_z3.jpg");
    }

    #[test]
    fn test_image_file_name_rounds_inputs() {
        let coord = Coordinate::new(35.123_456_78, 139.5).unwrap();
        let key = ImageKey::new(&coord, Heading::new(89.6), 1280, 960);
        assert_eq!(key.file_name(), "highres_35.123457_139.500000_h90_1280x960.jpg");
    }

    #[test]
    fn test_image_keys_equal_for_nearby_headings() {
        let coord = Coordinate::new(35.0, 139.0).unwrap();
        let a = ImageKey::new(&coord, Heading::new(44.6), 640, 480);
        let b = ImageKey::new(&coord, Heading::new(45.4), 640, 480);
        assert_eq!(a, b);
    }

    #[test]
    fn test_image_keys_equal_on_either_side_of_zero() {
        let west = Coordinate::new(51.477_928, -0.000_000_2).unwrap();
        let east = Coordinate::new(51.477_928, 0.000_000_2).unwrap();
        let a = ImageKey::new(&west, Heading::NORTH, 640, 480);
        let b = ImageKey::new(&east, Heading::NORTH, 640, 480);
        assert_eq!(a, b);
        assert_eq!(a.file_name(), "highres_51.477928_0.000000_h0_640x480.jpg");
    }

    #[test]
    fn test_namespaces_are_distinct() {
        let dirs = [
            CacheNamespace::Tiles.dir_name(),
            CacheNamespace::Panoramas.dir_name(),
            CacheNamespace::Images.dir_name(),
        ];
        assert_eq!(dirs, ["tiles", "panoramas", "images"]);
    }
}
