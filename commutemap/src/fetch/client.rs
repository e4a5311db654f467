//! Retrying client for the overlay aggregation API.

use std::time::Duration;

use geojson::FeatureCollection;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::error::{AttemptError, Endpoint, FetchError};
use super::http::{AsyncHttpClient, TransportError};
use super::retry::RetryPolicy;
use super::types::{HealthStatus, OverlayRequest, TileResponse};
use crate::coord::TileAddress;

/// Default base URL of the aggregation API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default per-call timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter carrying the administrative area filter.
const AREA_CODE_PARAM: &str = "administrative_area_code";

/// Connection settings for [`OverlayFetchClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: Url,
    /// Applied to every individual attempt
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Area filter applied when a request carries none
    pub area_code: Option<String>,
}

impl FetchConfig {
    /// Creates a config for `base_url` with default timeout and retries.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            area_code: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_area_code(mut self, area_code: Option<String>) -> Self {
        self.area_code = area_code;
        self
    }
}

/// Client for the overlay aggregation API.
///
/// Every call is bounded by [`FetchConfig::timeout`] and retried according
/// to [`FetchConfig::retry`]. Non-2xx statuses and undecodable bodies are
/// retried the same way as connection failures.
pub struct OverlayFetchClient<C: AsyncHttpClient> {
    http: C,
    config: FetchConfig,
}

impl<C: AsyncHttpClient> OverlayFetchClient<C> {
    pub fn new(http: C, config: FetchConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches the overlay collection for a tile or bounding box.
    pub async fn request(&self, request: &OverlayRequest) -> Result<FeatureCollection, FetchError> {
        let (endpoint, mut query) = match request {
            OverlayRequest::Tile { tile, .. } => (
                Endpoint::OverlayTile,
                vec![
                    ("z", tile.z.to_string()),
                    ("x", tile.x.to_string()),
                    ("y", tile.y.to_string()),
                    ("response_format", "geojson".to_string()),
                ],
            ),
            OverlayRequest::Bounds { bounds, zoom, .. } => (
                Endpoint::OverlayBounds,
                vec![
                    ("north", bounds.north.to_string()),
                    ("south", bounds.south.to_string()),
                    ("east", bounds.east.to_string()),
                    ("west", bounds.west.to_string()),
                    ("zoom", zoom.to_string()),
                ],
            ),
        };

        if let Some(code) = request.area_code().or(self.config.area_code.as_deref()) {
            query.push((AREA_CODE_PARAM, code.to_string()));
        }

        let url = self.endpoint_url(endpoint, &query)?;
        self.get_json(endpoint, &url).await
    }

    /// Asks the remote API which tile contains a point.
    pub async fn coords_to_tile(
        &self,
        lon: f64,
        lat: f64,
        z: u8,
    ) -> Result<TileAddress, FetchError> {
        let endpoint = Endpoint::CoordsToTile;
        let url = self.endpoint_url(
            endpoint,
            &[
                ("lon", lon.to_string()),
                ("lat", lat.to_string()),
                ("z", z.to_string()),
            ],
        )?;

        let tile: TileResponse = self.get_json(endpoint, &url).await?;
        TileAddress::new(tile.z, tile.x, tile.y).map_err(|e| FetchError::MalformedBody {
            endpoint,
            status: 200,
            message: e.to_string(),
            attempts: 1,
        })
    }

    /// Queries the service health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, FetchError> {
        let endpoint = Endpoint::Health;
        let url = self.endpoint_url(endpoint, &[])?;
        self.get_json(endpoint, &url).await
    }

    /// Builds `{base_url}/{endpoint}?{query}`, keeping any base path prefix.
    fn endpoint_url(
        &self,
        endpoint: Endpoint,
        query: &[(&str, String)],
    ) -> Result<Url, FetchError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(endpoint.path().split('/'));

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &Url,
    ) -> Result<T, FetchError> {
        let max_attempts = self.config.retry.max_attempts();
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            let err = match self.attempt(url).await {
                Ok(value) => {
                    debug!(
                        endpoint = %endpoint,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Overlay API request succeeded"
                    );
                    return Ok(value);
                }
                Err(err) => err,
            };

            match self.config.retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        endpoint = %endpoint,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Overlay API request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(
                        endpoint = %endpoint,
                        attempts = attempt,
                        error = %err,
                        "Overlay API request failed, giving up"
                    );
                    return Err(err.into_fetch_error(endpoint, attempt));
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &Url) -> Result<T, AttemptError> {
        let timeout = self.config.timeout;
        let response = match tokio::time::timeout(timeout, self.http.get(url.as_str())).await {
            Ok(Ok(response)) => response,
            Ok(Err(TransportError::Connection(message))) => {
                return Err(AttemptError::Network(message))
            }
            Ok(Err(TransportError::Timeout)) | Err(_) => return Err(AttemptError::Timeout(timeout)),
        };

        if !response.is_success() {
            return Err(AttemptError::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
                payload: serde_json::from_slice(&response.body).ok(),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| AttemptError::Malformed {
            status: response.status,
            message: e.to_string(),
        })
    }
}
