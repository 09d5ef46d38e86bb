//! Street-level imagery provider access.
//!
//! Three endpoints are involved, all behind the [`AsyncHttpClient`] seam so
//! tests can script responses:
//!
//! - metadata: coordinate to panorama id ([`PanoramaResolver`])
//! - photometa: panorama id to heading offset ([`HeadingCalibrator`])
//! - tiles: fetched by [`crate::panorama::TileStore`]

mod calibration;
mod endpoints;
mod http;
mod metadata;
mod types;

pub use calibration::{
    decode_heading_offset, HeadingCalibrator, HeadingOffset, ShapeMismatch, RESPONSE_SENTINEL,
};
pub use endpoints::{
    Endpoints, DEFAULT_METADATA_URL, DEFAULT_PHOTOMETA_URL, DEFAULT_TILE_URL,
    DEFAULT_TRUSTED_PUBLISHER,
};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use metadata::PanoramaResolver;
pub use types::{HttpResponse, PanoramaId, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
