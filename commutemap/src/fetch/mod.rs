//! Access to the remote overlay aggregation API.
//!
//! [`OverlayFetchClient`] builds request URLs, applies a per-call timeout and
//! retries failures with exponential backoff before surfacing a typed
//! [`FetchError`]. The transport is injected through [`AsyncHttpClient`];
//! [`AsyncReqwestClient`] is the production implementation.

mod client;
mod error;
mod http;
mod retry;
mod types;

pub use client::{FetchConfig, OverlayFetchClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Endpoint, FetchError};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpResponse, TransportError};
pub use retry::{
    RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_SECS,
    DEFAULT_RETRY_COUNT,
};
pub use types::{HealthStatus, OverlayRequest};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
