//! Application error types.

use std::fmt;

use crate::config::ConfigError;
use crate::fetch::{FetchError, TransportError};

/// Errors that can occur while composing the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to load or validate configuration.
    Config(ConfigError),

    /// The configured API base URL is unusable.
    InvalidBaseUrl(FetchError),

    /// Failed to create the HTTP transport.
    HttpClient(TransportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::InvalidBaseUrl(e) => write!(f, "Invalid API base URL: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::InvalidBaseUrl(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::InvalidBaseUrl(e)
    }
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        AppError::HttpClient(e)
    }
}
