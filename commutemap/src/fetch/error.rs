//! Fetch error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Remote API endpoints, used to tag errors with their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /overlay/tile`
    OverlayTile,
    /// `GET /overlay/bounds`
    OverlayBounds,
    /// `GET /coords/to-tile`
    CoordsToTile,
    /// `GET /overlay/health`
    Health,
}

impl Endpoint {
    /// Path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::OverlayTile => "overlay/tile",
            Self::OverlayBounds => "overlay/bounds",
            Self::CoordsToTile => "coords/to-tile",
            Self::Health => "overlay/health",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Errors surfaced by the overlay fetch client after retries are exhausted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Non-2xx response.
    #[error("{endpoint} returned HTTP {status} after {attempts} attempt(s)")]
    RemoteApi {
        endpoint: Endpoint,
        status: u16,
        /// Raw response body (lossy UTF-8)
        body: String,
        /// Parsed body when it was JSON
        payload: Option<serde_json::Value>,
        attempts: u32,
    },

    /// Connection-level failure.
    #[error("{endpoint} request failed after {attempts} attempt(s): {message}")]
    Network {
        endpoint: Endpoint,
        message: String,
        attempts: u32,
    },

    /// No response within the per-call timeout.
    #[error("{endpoint} timed out after {timeout:?} ({attempts} attempt(s))")]
    Timeout {
        endpoint: Endpoint,
        timeout: Duration,
        attempts: u32,
    },

    /// 2xx response whose body could not be decoded.
    #[error("{endpoint} returned a malformed body (HTTP {status}): {message}")]
    MalformedBody {
        endpoint: Endpoint,
        status: u16,
        message: String,
        attempts: u32,
    },

    /// The request URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Endpoint the failed request targeted.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::RemoteApi { endpoint, .. }
            | Self::Network { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::MalformedBody { endpoint, .. } => Some(*endpoint),
            Self::InvalidUrl(_) => None,
        }
    }

    /// HTTP status of the last response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } | Self::MalformedBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::RemoteApi { attempts, .. }
            | Self::Network { attempts, .. }
            | Self::Timeout { attempts, .. }
            | Self::MalformedBody { attempts, .. } => *attempts,
            Self::InvalidUrl(_) => 0,
        }
    }
}

/// Failure of a single attempt, before the attempt count is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttemptError {
    Status {
        status: u16,
        body: String,
        payload: Option<serde_json::Value>,
    },
    Network(String),
    Timeout(Duration),
    Malformed { status: u16, message: String },
}

impl AttemptError {
    pub(crate) fn into_fetch_error(self, endpoint: Endpoint, attempts: u32) -> FetchError {
        match self {
            Self::Status {
                status,
                body,
                payload,
            } => FetchError::RemoteApi {
                endpoint,
                status,
                body,
                payload,
                attempts,
            },
            Self::Network(message) => FetchError::Network {
                endpoint,
                message,
                attempts,
            },
            Self::Timeout(timeout) => FetchError::Timeout {
                endpoint,
                timeout,
                attempts,
            },
            Self::Malformed { status, message } => FetchError::MalformedBody {
                endpoint,
                status,
                message,
                attempts,
            },
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "HTTP {}", status),
            Self::Network(message) => write!(f, "network error: {}", message),
            Self::Timeout(timeout) => write!(f, "timed out after {:?}", timeout),
            Self::Malformed { message, .. } => write!(f, "malformed body: {}", message),
        }
    }
}
