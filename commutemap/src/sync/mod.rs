//! Overlay synchronization.
//!
//! [`OverlaySyncController`] consumes viewport-change notifications from
//! the host map, decides whether the overlay needs new data, drives the
//! [`OverlayDataCache`](crate::cache::OverlayDataCache) and an
//! [`OverlaySource`], and pushes results to an [`OverlayRenderer`].
//!
//! # Phases
//!
//! ```text
//! Idle -> Fetching -> Ready
//!                  -> Error
//! Ready | Error -> Fetching   (next qualifying viewport)
//! any -> Idle                 (overlay hidden)
//! ```

mod controller;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::OverlaySyncController;
pub use traits::{OverlayRenderer, OverlaySource};
pub use types::{
    FetchMode, PaintStyle, SyncConfig, SyncOutcome, SyncPhase, SyncStatus, DEFAULT_SOURCE_ID,
};
