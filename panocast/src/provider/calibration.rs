//! Per-panorama heading calibration.
//!
//! Panorama pixel column zero does not point north. The photometa endpoint
//! reports the true-north heading of the panorama's centre column, which is
//! subtracted from a world heading to get the heading in panorama space.
//!
//! The response is JSON prefixed with a `)]}'` anti-hijacking line and the
//! offset lives deep in nested arrays at `[1][0][5][0][1][2][0]`. Any
//! deviation from that shape degrades to a neutral offset of 0.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::coord::normalize_degrees;
use crate::provider::{AsyncHttpClient, Endpoints, PanoramaId, DEFAULT_USER_AGENT};

/// Anti-hijacking prefix in front of the JSON body.
pub const RESPONSE_SENTINEL: &str = ")]}'";

/// Array indices from the document root to the heading triple.
const HEADING_PATH: [usize; 6] = [1, 0, 5, 0, 1, 2];

/// The calibration document did not have the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMismatch(pub String);

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected calibration document: {}", self.0)
    }
}

impl std::error::Error for ShapeMismatch {}

/// Extract the raw heading offset (degrees, unnormalized) from a photometa body.
pub fn decode_heading_offset(body: &str) -> Result<f64, ShapeMismatch> {
    let trimmed = body.trim_start();
    let json = trimmed
        .strip_prefix(RESPONSE_SENTINEL)
        .unwrap_or(trimmed)
        .trim_start();

    let root: Value =
        serde_json::from_str(json).map_err(|e| ShapeMismatch(format!("invalid JSON: {}", e)))?;

    let mut node = &root;
    for (depth, index) in HEADING_PATH.iter().enumerate() {
        node = node
            .as_array()
            .and_then(|items| items.get(*index))
            .ok_or_else(|| ShapeMismatch(format!("no element {} at depth {}", index, depth)))?;
    }

    node.as_array()
        .and_then(|triple| triple.first())
        .and_then(Value::as_f64)
        .filter(|degrees| degrees.is_finite())
        .ok_or_else(|| ShapeMismatch("heading is not a number".to_string()))
}

/// Heading offset of a panorama in degrees `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingOffset {
    degrees: f64,
    calibrated: bool,
}

impl HeadingOffset {
    /// An offset read from the calibration document.
    pub fn calibrated(raw: f64) -> Self {
        Self {
            degrees: normalize_degrees(raw),
            calibrated: true,
        }
    }

    /// The fallback used when calibration fails.
    pub fn neutral() -> Self {
        Self {
            degrees: 0.0,
            calibrated: false,
        }
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}

/// Fetches heading offsets, memoizing successful calibrations per panorama.
pub struct HeadingCalibrator<C: AsyncHttpClient> {
    http_client: C,
    endpoints: Arc<Endpoints>,
    memo: DashMap<PanoramaId, HeadingOffset>,
}

impl<C: AsyncHttpClient> HeadingCalibrator<C> {
    pub fn new(http_client: C, endpoints: Arc<Endpoints>) -> Self {
        Self {
            http_client,
            endpoints,
            memo: DashMap::new(),
        }
    }

    /// Heading offset for `pano_id`. Never fails.
    ///
    /// Transport errors, non-2xx responses and shape mismatches are logged as
    /// degraded calibration and yield [`HeadingOffset::neutral`]. Neutral
    /// results are not memoized so a later request can still calibrate.
    pub async fn offset_for(&self, pano_id: &PanoramaId) -> HeadingOffset {
        if let Some(offset) = self.memo.get(pano_id) {
            return *offset;
        }

        match self.fetch(pano_id).await {
            Ok(raw) => {
                let offset = HeadingOffset::calibrated(raw);
                debug!(
                    pano_id = %pano_id,
                    offset = offset.degrees(),
                    "Calibrated panorama heading"
                );
                self.memo.insert(pano_id.clone(), offset);
                offset
            }
            Err(reason) => {
                warn!(
                    pano_id = %pano_id,
                    reason = %reason,
                    "Calibration degraded, using neutral offset"
                );
                HeadingOffset::neutral()
            }
        }
    }

    async fn fetch(&self, pano_id: &PanoramaId) -> Result<f64, String> {
        let url = self.endpoints.photometa(pano_id);
        let response = self
            .http_client
            .get_with_headers(&url, &[("User-Agent", DEFAULT_USER_AGENT)])
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }

        decode_heading_offset(&response.text()).map_err(|e| e.to_string())
    }
}
