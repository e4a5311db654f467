//! Shared setup for commands that talk to the overlay API.

use commutemap::app::{AppConfig, AppError};
use commutemap::config::{config_file_path, ConfigFile};
use commutemap::fetch::{AsyncReqwestClient, OverlayFetchClient};
use commutemap::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Loads configuration and installs logging for the lifetime of a command.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(Some(&config.logging.directory), &config.logging.level)?;
        Ok(Self {
            config,
            _logging: logging,
        })
    }

    /// Component configuration derived from the config file.
    pub fn app_config(&self) -> Result<AppConfig, CliError> {
        Ok(AppConfig::from_config_file(&self.config)?)
    }

    /// API client over the production HTTP transport.
    pub fn fetch_client(
        &self,
        config: &AppConfig,
    ) -> Result<OverlayFetchClient<AsyncReqwestClient>, CliError> {
        let http =
            AsyncReqwestClient::with_timeout(config.fetch.timeout).map_err(AppError::HttpClient)?;
        Ok(OverlayFetchClient::new(http, config.fetch.clone()))
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            config = %config_file_path().display(),
            base_url = %self.config.api.base_url,
            "CommuteMap starting"
        );
    }
}
