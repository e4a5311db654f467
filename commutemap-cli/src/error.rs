//! CLI error type.

use std::fmt;

use commutemap::app::AppError;
use commutemap::config::ConfigError;
use commutemap::coord::CoordError;
use commutemap::fetch::FetchError;
use commutemap::logging::LoggingError;
use commutemap::OverlayError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid usage or configuration, with a user-facing message.
    Config(String),
    ConfigFile(ConfigError),
    Logging(LoggingError),
    App(AppError),
    Coord(CoordError),
    Fetch(FetchError),
    Overlay(OverlayError),
    /// The replay script could not be read or parsed.
    Replay(String),
    /// The remote API reported itself unhealthy.
    Unhealthy(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Coord(e) => write!(f, "{}", e),
            CliError::Fetch(e) => write!(f, "{}", e),
            CliError::Overlay(e) => write!(f, "{}", e),
            CliError::Replay(msg) => write!(f, "Replay failed: {}", msg),
            CliError::Unhealthy(status) => write!(f, "Overlay API is unhealthy: {}", status),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Coord(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Overlay(e) => Some(e),
            CliError::Config(_) | CliError::Replay(_) | CliError::Unhealthy(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coord(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<OverlayError> for CliError {
    fn from(e: OverlayError) -> Self {
        CliError::Overlay(e)
    }
}
