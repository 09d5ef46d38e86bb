//! Panorama lookup by coordinate.
//!
//! The metadata endpoint answers with a small JSON document:
//!
//! ```json
//! { "status": "OK", "pano_id": "CAoSLEFG...", "copyright": "© Google" }
//! ```
//!
//! Anything other than `"OK"` with a usable `pano_id` means there is no
//! imagery at the location. A `copyright` that does not name the trusted
//! publisher marks user-contributed imagery, which is rejected.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::coord::Coordinate;
use crate::error::AcquisitionError;
use crate::provider::{AsyncHttpClient, Endpoints, PanoramaId};

const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    status: String,
    #[serde(default)]
    pano_id: Option<String>,
    #[serde(default)]
    copyright: Option<String>,
}

/// Resolves a coordinate to the nearest first-party outdoor panorama.
pub struct PanoramaResolver<C: AsyncHttpClient> {
    http_client: C,
    endpoints: Arc<Endpoints>,
    api_key: String,
}

impl<C: AsyncHttpClient> PanoramaResolver<C> {
    pub fn new(http_client: C, endpoints: Arc<Endpoints>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoints,
            api_key: api_key.into(),
        }
    }

    /// Look up the panorama nearest to `coord`.
    ///
    /// # Errors
    ///
    /// - [`AcquisitionError::Unavailable`] for transport failures, non-2xx
    ///   responses, unparseable bodies, non-OK statuses and missing ids.
    /// - [`AcquisitionError::UntrustedSource`] when the copyright is present
    ///   and non-blank but does not name the trusted publisher.
    pub async fn resolve(&self, coord: &Coordinate) -> Result<PanoramaId, AcquisitionError> {
        let unavailable = |reason: String| AcquisitionError::Unavailable {
            coord: *coord,
            reason,
        };

        let url = self.endpoints.metadata(coord, &self.api_key);
        let response = self
            .http_client
            .get(&url)
            .await
            .map_err(|e| unavailable(format!("metadata request failed: {}", e)))?;

        if !response.is_success() {
            return Err(unavailable(format!(
                "metadata request returned HTTP {}",
                response.status
            )));
        }

        let metadata: MetadataResponse = serde_json::from_slice(&response.body)
            .map_err(|e| unavailable(format!("malformed metadata: {}", e)))?;

        if metadata.status != STATUS_OK {
            debug!(coord = %coord, status = %metadata.status, "No panorama at location");
            return Err(unavailable(format!("metadata status {}", metadata.status)));
        }

        let pano_id = metadata
            .pano_id
            .as_deref()
            .and_then(PanoramaId::parse)
            .ok_or_else(|| unavailable("metadata has no usable pano_id".to_string()))?;

        if let Some(copyright) = metadata.copyright {
            let trusted = copyright.contains(&self.endpoints.trusted_publisher);
            if !copyright.trim().is_empty() && !trusted {
                warn!(
                    coord = %coord,
                    pano_id = %pano_id,
                    copyright = %copyright,
                    "Rejecting user-contributed panorama"
                );
                return Err(AcquisitionError::UntrustedSource {
                    coord: *coord,
                    copyright,
                });
            }
        }

        debug!(coord = %coord, pano_id = %pano_id, "Resolved panorama");
        Ok(pano_id)
    }
}
