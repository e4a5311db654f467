//! Application configuration for `OverlayApp`.
//!
//! `AppConfig` gathers the settings of every component so they are built
//! consistently from one place.

use std::time::Duration;

use super::error::AppError;
use crate::cache::DEFAULT_TTL;
use crate::config::ConfigFile;
use crate::coord::ZoomRange;
use crate::fetch::{FetchConfig, RetryPolicy};
use crate::overlay::PropertySchema;
use crate::sync::SyncConfig;
use crate::viewport::DetectorConfig;

/// Application configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Remote API connection settings.
    pub fetch: FetchConfig,

    /// Time-to-live of cached overlay data.
    pub cache_ttl: Duration,

    /// Fields guaranteed after normalization.
    pub schema: PropertySchema,

    /// Controller settings.
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Create a config for `base_url` with every other setting at its default.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            fetch: FetchConfig::new(base_url)?,
            cache_ttl: DEFAULT_TTL,
            schema: PropertySchema::did(),
            sync: SyncConfig::default(),
        })
    }

    /// Create application config from the configuration file.
    ///
    /// Keeps the translation from file settings to component configs in
    /// one place rather than scattered in CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, AppError> {
        let api = &config.api;
        let overlay = &config.overlay;

        let fetch = FetchConfig::new(&api.base_url)?
            .with_timeout(Duration::from_secs(api.timeout_secs))
            .with_retry(RetryPolicy::with_retries(
                api.retry_count,
                Duration::from_millis(api.initial_backoff_ms),
            ))
            .with_area_code(api.area_code.clone());

        let sync = SyncConfig {
            zoom_range: ZoomRange::new(overlay.min_zoom, overlay.max_zoom),
            detector: DetectorConfig {
                zoom_threshold: overlay.zoom_threshold,
                bounds_threshold: overlay.bounds_threshold,
            },
            fetch_mode: overlay.fetch_mode,
            source_id: overlay.source_id.clone(),
            visible: overlay.visible,
            paint: overlay.paint.clone(),
        };

        Ok(Self {
            fetch,
            cache_ttl: Duration::from_secs(overlay.cache_ttl_secs),
            schema: PropertySchema::did(),
            sync,
        })
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the normalization schema.
    pub fn with_schema(mut self, schema: PropertySchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the controller config.
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }
}
