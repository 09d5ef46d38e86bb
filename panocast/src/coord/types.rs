//! Coordinate type definitions

use std::fmt;

/// Valid latitude range (WGS84)
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range (WGS84)
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Fractional digits used when a coordinate is turned into a cache or lookup key.
///
/// Keys must not depend on float representation, so every key derived from a
/// coordinate goes through the same fixed rounding.
pub const KEY_PRECISION: usize = 6;

/// Errors that can occur when constructing coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is not finite or outside [-90, 90]
    InvalidLatitude(f64),
    /// Longitude is not finite or outside [-180, 180]
    InvalidLongitude(f64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lng) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lng, MIN_LON, MAX_LON
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}

/// A WGS84 position in decimal degrees.
///
/// Immutable once constructed. Equality is exact float equality; anything that
/// needs a stable identity (cache files, lookup maps) should use [`Coordinate::key`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(MIN_LON..=MAX_LON).contains(&lng) {
            return Err(CoordError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Deterministic `lat,lng` key rounded to [`KEY_PRECISION`] digits.
    pub fn key(&self) -> String {
        format!("{},{}", key_degrees(self.lat), key_degrees(self.lng))
    }

    /// `lat,lng` in the form the metadata endpoint expects.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Formats an angle with [`KEY_PRECISION`] decimals for use in keys.
///
/// Values that round to zero from below come out as `0.000000`, not
/// `-0.000000`.
pub fn key_degrees(value: f64) -> String {
    let text = format!("{:.prec$}", value, prec = KEY_PRECISION);
    match text.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0' || b == b'.') => digits.to_string(),
        _ => text,
    }
}

/// Wraps any angle into `[0, 360)`.
///
/// Non-finite input maps to 0 so a heading is never NaN.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Compass direction in degrees clockwise from true north, always in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Heading(f64);

impl Heading {
    /// Due north.
    pub const NORTH: Heading = Heading(0.0);

    /// Creates a heading, wrapping the value into `[0, 360)`.
    pub fn new(degrees: f64) -> Self {
        Self(normalize_degrees(degrees))
    }

    /// The heading in degrees.
    #[inline]
    pub fn degrees(&self) -> f64 {
        self.0
    }

    /// The heading in radians.
    #[inline]
    pub fn radians(&self) -> f64 {
        self.0.to_radians()
    }

    /// Heading rounded to the nearest whole degree, with 360 folded onto 0.
    pub fn rounded(&self) -> u16 {
        let rounded = self.0.round() as u16;
        if rounded >= 360 {
            0
        } else {
            rounded
        }
    }

    /// Rotates this heading counter-clockwise by `offset` degrees.
    ///
    /// Used to move a real-world heading into a panorama's own frame.
    pub fn minus(&self, offset: f64) -> Heading {
        Heading::new(self.0 - offset)
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}
