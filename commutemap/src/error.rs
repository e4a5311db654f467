//! Controller-facing error type.

use thiserror::Error;

use crate::coord::CoordError;
use crate::fetch::FetchError;
use crate::overlay::NormalizeError;

/// Any failure that can interrupt an overlay refresh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    #[error("Coordinate error: {0}")]
    Coord(#[from] CoordError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),
}
