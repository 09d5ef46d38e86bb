//! HTTP client abstraction for testability

use super::types::{HttpResponse, ProviderError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Trait for asynchronous HTTP client operations.
///
/// Every provider component is generic over this trait so tests can swap in a
/// scripted client without touching the network.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// Returns the response whatever its status; only transport failures
    /// are errors.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;

    /// Performs an async HTTP GET request with custom headers.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `headers` - Slice of (header_name, header_value) tuples
    fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;
}

/// Default User-Agent string for HTTP requests.
/// The tile and photometa endpoints reject requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Query parameters whose values never reach the logs.
const SECRET_PARAMS: &[&str] = &["key"];

/// Masks credential query parameters in `url` for logging.
///
/// `https://host/metadata?location=1,2&key=abc` becomes
/// `https://host/metadata?location=1,2&key=REDACTED`.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SECRET_PARAMS.contains(&name) => format!("{}=REDACTED", name),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, query.join("&"))
}

/// Async HTTP client implementation using reqwest.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new AsyncReqwestClient with custom timeout.
    ///
    /// The timeout bounds each request individually; a stalled request only
    /// holds its own worker slot.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<HttpResponse, ProviderError> {
        let url = redact_url(url);
        let url = url.as_str();
        trace!(url = url, "HTTP GET request starting");

        let response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                let e = e.without_url();
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ProviderError::HttpError(format!("Request failed: {}", e)));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(HttpResponse {
                    status,
                    content_type,
                    body: bytes.to_vec(),
                })
            }
            Err(e) => {
                let e = e.without_url();
                warn!(url = url, error = %e, "Failed to read response body");
                Err(ProviderError::HttpError(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
        self.send(self.client.get(url), url).await
    }

    async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, ProviderError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(request, url).await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Responder = dyn Fn(&str) -> Result<HttpResponse, ProviderError> + Send + Sync;

    /// Scripted HTTP client for tests.
    ///
    /// Answers every request through a routing closure and records the URLs
    /// it was asked for, so tests can assert on network access.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        responder: Arc<Responder>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(
            responder: impl Fn(&str) -> Result<HttpResponse, ProviderError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Arc::new(responder),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// A client that answers every request with the same response.
        pub fn fixed(response: Result<HttpResponse, ProviderError>) -> Self {
            Self::new(move |_| response.clone())
        }

        /// All URLs requested so far.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        /// Number of requested URLs containing `fragment`.
        pub fn count_matching(&self, fragment: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.contains(fragment))
                .count()
        }

        fn answer(&self, url: &str) -> Result<HttpResponse, ProviderError> {
            self.requests.lock().unwrap().push(url.to_string());
            (self.responder)(url)
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
            self.answer(url)
        }

        async fn get_with_headers(
            &self,
            url: &str,
            _headers: &[(&str, &str)],
        ) -> Result<HttpResponse, ProviderError> {
            self.answer(url)
        }
    }

    #[tokio::test]
    async fn test_mock_async_client_success() {
        let mock = MockAsyncHttpClient::fixed(Ok(HttpResponse::ok(vec![1, 2, 3, 4])));

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap().body, vec![1, 2, 3, 4]);
        assert_eq!(mock.requests(), vec!["http://example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_async_client_error() {
        let mock =
            MockAsyncHttpClient::fixed(Err(ProviderError::HttpError("Test error".to_string())));

        let result = mock.get_with_headers("http://example.com", &[]).await;
        assert!(result.is_err());
        assert_eq!(mock.count_matching("example"), 1);
    }

    #[test]
    fn test_redact_url_masks_api_key() {
        let url = "https://maps.example/metadata?location=35.1,139.2&key=SECRET123&source=outdoor";
        let redacted = redact_url(url);
        assert!(!redacted.contains("SECRET123"));
        assert_eq!(
            redacted,
            "https://maps.example/metadata?location=35.1,139.2&key=REDACTED&source=outdoor"
        );
    }

    #[test]
    fn test_redact_url_leaves_other_urls_alone() {
        let tile = "https://tiles.example/v1/tile?panoid=abc&x=1&y=0&zoom=3";
        assert_eq!(redact_url(tile), tile);
        assert_eq!(redact_url("https://example.com/plain"), "https://example.com/plain");
        // Only an exact parameter name is masked.
        assert_eq!(
            redact_url("https://example.com/?monkey=1&key="),
            "https://example.com/?monkey=1&key=REDACTED"
        );
    }

    #[test]
    fn test_metadata_url_is_redacted() {
        use crate::coord::Coordinate;
        use crate::provider::Endpoints;

        let coord = Coordinate::new(35.0, 139.0).unwrap();
        let url = Endpoints::default().metadata(&coord, "my-api-key");
        let redacted = redact_url(&url);
        assert!(url.contains("my-api-key"));
        assert!(!redacted.contains("my-api-key"));
        assert!(redacted.contains("location=35,139"));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
