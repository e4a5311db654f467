//! Application bootstrap implementation.
//!
//! `OverlayApp` builds the fetch client, cache and controller as explicit
//! instances and wires them together. Nothing is global: tests and embedders
//! construct as many independent apps as they need.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::cache::OverlayDataCache;
use crate::fetch::{AsyncHttpClient, AsyncReqwestClient, OverlayFetchClient};
use crate::sync::{OverlayRenderer, OverlaySyncController};

/// A fully wired overlay stack.
///
/// # Example
///
/// ```ignore
/// use commutemap::app::{AppConfig, OverlayApp};
///
/// let config = AppConfig::new("http://localhost:8000")?;
/// let app = OverlayApp::start(config, renderer)?;
///
/// // Feed host viewport notifications
/// let outcome = app.controller().on_viewport_change(viewport).await;
/// ```
pub struct OverlayApp<C: AsyncHttpClient, R: OverlayRenderer> {
    fetch_client: Arc<OverlayFetchClient<C>>,
    cache: Arc<OverlayDataCache>,
    controller: OverlaySyncController<OverlayFetchClient<C>, R>,
    config: AppConfig,
}

impl<R: OverlayRenderer> OverlayApp<AsyncReqwestClient, R> {
    /// Start the application with the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn start(config: AppConfig, renderer: Arc<R>) -> Result<Self, AppError> {
        let http = AsyncReqwestClient::with_timeout(config.fetch.timeout)?;
        Ok(Self::with_http_client(config, http, renderer))
    }
}

impl<C: AsyncHttpClient, R: OverlayRenderer> OverlayApp<C, R> {
    /// Build the stack on an injected transport and initialize the renderer.
    pub fn with_http_client(config: AppConfig, http: C, renderer: Arc<R>) -> Self {
        let fetch_client = Arc::new(OverlayFetchClient::new(http, config.fetch.clone()));
        let cache = Arc::new(OverlayDataCache::new(config.cache_ttl, config.schema.clone()));
        let controller = OverlaySyncController::new(
            Arc::clone(&fetch_client),
            renderer,
            Arc::clone(&cache),
            config.sync.clone(),
        );
        controller.initialize();

        info!(
            base_url = %config.fetch.base_url,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            min_zoom = config.sync.zoom_range.min,
            max_zoom = config.sync.zoom_range.max,
            "Overlay app started"
        );

        Self {
            fetch_client,
            cache,
            controller,
            config,
        }
    }

    pub fn controller(&self) -> &OverlaySyncController<OverlayFetchClient<C>, R> {
        &self.controller
    }

    /// Direct access to the API client for one-off queries.
    pub fn fetch_client(&self) -> &Arc<OverlayFetchClient<C>> {
        &self.fetch_client
    }

    pub fn cache(&self) -> &Arc<OverlayDataCache> {
        &self.cache
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
