//! Request and response types for the overlay aggregation API.

use serde::{Deserialize, Serialize};

use crate::coord::{TileAddress, ViewportBounds};

/// What to fetch from the aggregation API.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayRequest {
    /// A single tile, `GET /overlay/tile`.
    Tile {
        tile: TileAddress,
        area_code: Option<String>,
    },
    /// Every tile covering a bounding box, `GET /overlay/bounds`.
    Bounds {
        bounds: ViewportBounds,
        zoom: u8,
        area_code: Option<String>,
    },
}

impl OverlayRequest {
    pub fn tile(tile: TileAddress) -> Self {
        Self::Tile {
            tile,
            area_code: None,
        }
    }

    pub fn bounds(bounds: ViewportBounds, zoom: u8) -> Self {
        Self::Bounds {
            bounds,
            zoom,
            area_code: None,
        }
    }

    /// Restricts the request to an administrative area.
    pub fn with_area_code(mut self, code: impl Into<String>) -> Self {
        match &mut self {
            Self::Tile { area_code, .. } | Self::Bounds { area_code, .. } => {
                *area_code = Some(code.into());
            }
        }
        self
    }

    pub fn area_code(&self) -> Option<&str> {
        match self {
            Self::Tile { area_code, .. } | Self::Bounds { area_code, .. } => area_code.as_deref(),
        }
    }

    pub fn zoom(&self) -> u8 {
        match self {
            Self::Tile { tile, .. } => tile.z,
            Self::Bounds { zoom, .. } => *zoom,
        }
    }
}

/// Body of `GET /overlay/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    /// Returns true when the service reports `ok` or `healthy`.
    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "ok" | "healthy"
        )
    }
}

/// Body of `GET /coords/to-tile`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct TileResponse {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}
