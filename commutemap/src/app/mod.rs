//! Application composition root.
//!
//! `OverlayApp` builds every service from an `AppConfig` and wires them:
//!
//! ```text
//! AsyncHttpClient ──► OverlayFetchClient ──┐
//!                                          ├──► OverlaySyncController ──► OverlayRenderer
//!                     OverlayDataCache ────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::OverlayApp;
pub use config::AppConfig;
pub use error::AppError;
