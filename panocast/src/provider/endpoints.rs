//! Provider endpoint URLs.
//!
//! Three endpoints are used:
//!
//! - Metadata: `{metadata_url}?location={lat},{lng}&key={key}&source=outdoor`
//! - Photometa (heading calibration, undocumented): `{photometa_url}?...&pb=...{pano_id}...`
//! - Tiles: `{tile_url}?cb_client=maps_sv.tactile&panoid={id}&x={x}&y={y}&zoom={z}&nbt=1&fover=2`

use super::PanoramaId;
use crate::coord::Coordinate;

/// Default panorama metadata endpoint.
pub const DEFAULT_METADATA_URL: &str = "https://maps.googleapis.com/maps/api/streetview/metadata";

/// Default heading-calibration endpoint.
pub const DEFAULT_PHOTOMETA_URL: &str = "https://www.google.com/maps/photometa/v1";

/// Default panorama tile endpoint.
pub const DEFAULT_TILE_URL: &str = "https://streetviewpixels-pa.googleapis.com/v1/tile";

/// Copyright substring identifying first-party imagery.
pub const DEFAULT_TRUSTED_PUBLISHER: &str = "Google";

/// Client tag sent with tile and photometa requests.
const CLIENT_TAG: &str = "maps_sv.tactile";

/// Base URLs, locale and provenance settings for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub metadata_url: String,
    pub photometa_url: String,
    pub tile_url: String,
    /// Copyright substring that marks imagery as first-party
    pub trusted_publisher: String,
    /// Language code for the calibration endpoint (e.g. "ja")
    pub language: String,
    /// Region code for the calibration endpoint (e.g. "jp")
    pub region: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            photometa_url: DEFAULT_PHOTOMETA_URL.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            trusted_publisher: DEFAULT_TRUSTED_PUBLISHER.to_string(),
            language: "ja".to_string(),
            region: "jp".to_string(),
        }
    }
}

impl Endpoints {
    /// Metadata lookup URL for a coordinate, restricted to outdoor imagery.
    pub fn metadata(&self, coord: &Coordinate, api_key: &str) -> String {
        format!(
            "{}?location={}&key={}&source=outdoor",
            self.metadata_url,
            coord.to_query(),
            api_key
        )
    }

    /// Photometa URL for a panorama.
    ///
    /// The `pb` parameter is an opaque protobuf-in-URL request copied from the
    /// web client; only the locale and panorama id vary.
    pub fn photometa(&self, pano_id: &PanoramaId) -> String {
        let (hl, gl) = (&self.language, &self.region);
        format!(
            "{base}?authuser=0&hl={hl}&gl={gl}&pb=!1m4!1s{client}!11m2!2m1!1b1!2m2!1s{hl}!2s{gl}\
             !3m3!1m2!1e2!2s{id}!4m57!1e1!1e2!1e3!1e4!1e5!1e6!1e8!1e12!2m1!1e1!4m1!1i48!5m1!1e1\
             !5m1!1e2!6m1!1e1!6m1!1e2!9m36!1m3!1e2!2b1!3e2!1m3!1e2!2b0!3e3!1m3!1e3!2b1!3e2!1m3\
             !1e3!2b0!3e3!1m3!1e8!2b0!3e3!1m3!1e1!2b0!3e3!1m3!1e4!2b0!3e3!1m3!1e10!2b1!3e2!1m3\
             !1e10!2b0!3e3",
            base = self.photometa_url,
            client = CLIENT_TAG,
            id = pano_id,
        )
    }

    /// Tile URL for one cell of a panorama's tile grid.
    pub fn tile(&self, pano_id: &PanoramaId, zoom: u8, x: u32, y: u32) -> String {
        format!(
            "{}?cb_client={}&panoid={}&x={}&y={}&zoom={}&nbt=1&fover=2",
            self.tile_url, CLIENT_TAG, pano_id, x, y, zoom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pano() -> PanoramaId {
        PanoramaId::parse("abc_123").unwrap()
    }

    #[test]
    fn test_metadata_url() {
        let coord = Coordinate::new(35.5, 139.25).unwrap();
        let url = Endpoints::default().metadata(&coord, "KEY");
        assert_eq!(
            url,
            concat!(
                "https://maps.googleapis.com/maps/api/streetview/metadata",
                "?location=35.5,139.25&key=KEY&source=outdoor"
            )
        );
    }

    #[test]
    fn test_tile_url() {
        let url = Endpoints::default().tile(&pano(), 3, 5, 2);
        assert_eq!(
            url,
            concat!(
                "https://streetviewpixels-pa.googleapis.com/v1/tile",
                "?cb_client=maps_sv.tactile&panoid=abc_123&x=5&y=2&zoom=3&nbt=1&fover=2"
            )
        );
    }

    #[test]
    fn test_photometa_url_carries_locale_and_id() {
        let endpoints = Endpoints {
            language: "en".to_string(),
            region: "us".to_string(),
            ..Endpoints::default()
        };
        let url = endpoints.photometa(&pano());
        assert!(url.starts_with("https://www.google.com/maps/photometa/v1?authuser=0&hl=en&gl=us"));
        assert!(url.contains("!2m2!1sen!2sus!"));
        assert!(url.contains("!2sabc_123!4m57"));
        assert!(!url.contains(' '));
    }
}
