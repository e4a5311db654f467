//! CommuteMap - viewport-synchronized geospatial overlays
//!
//! This library keeps a map overlay (densely inhabited districts by default)
//! in step with the visible viewport. Viewport changes are filtered by a
//! change detector, translated to tile or bounds requests against the remote
//! overlay API, cached by view signature and pushed to a host renderer.
//!
//! # Layout
//!
//! - [`coord`] - Web Mercator tile math
//! - [`viewport`] - viewport signatures and change detection
//! - [`overlay`] - feature property normalization
//! - [`cache`] - TTL cache of normalized collections
//! - [`fetch`] - HTTP client for the overlay API
//! - [`sync`] - the controller tying everything to a renderer
//! - [`app`] - composition root
//! - [`config`] / [`logging`] - ambient setup

pub mod app;
pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod overlay;
pub mod sync;
pub mod viewport;

pub use error::OverlayError;
