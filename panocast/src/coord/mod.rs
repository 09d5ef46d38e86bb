//! Geographic coordinates and compass bearings.
//!
//! Provides the [`Coordinate`] value type used throughout the acquisition
//! pipeline and the great-circle [`bearing`] between two coordinates.

mod types;

pub use types::{
    key_degrees, normalize_degrees, CoordError, Coordinate, Heading, KEY_PRECISION, MAX_LAT,
    MAX_LON, MIN_LAT, MIN_LON,
};

/// Initial great-circle bearing from `from` towards `to`.
///
/// Uses the standard spherical formula `atan2(sin Δλ·cos φ2, cos φ1·sin φ2 −
/// sin φ1·cos φ2·cos Δλ)`, converted to degrees and wrapped into `[0, 360)`.
///
/// When both coordinates are identical the direction is undefined; this
/// returns [`Heading::NORTH`] (0°) rather than NaN.
pub fn bearing(from: &Coordinate, to: &Coordinate) -> Heading {
    if from == to {
        return Heading::NORTH;
    }

    let lat1 = from.lat().to_radians();
    let lat2 = to.lat().to_radians();
    let delta_lng = (to.lng() - from.lng()).to_radians();

    let x = delta_lng.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    Heading::new(x.atan2(y).to_degrees())
}
