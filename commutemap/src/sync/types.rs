//! Controller configuration, status and outcome types.

use std::fmt;
use std::str::FromStr;

use crate::coord::ZoomRange;
use crate::error::OverlayError;
use crate::viewport::{DetectorConfig, ViewSignature};

/// Default renderer source identifier for the overlay.
pub const DEFAULT_SOURCE_ID: &str = "overlay-did";

/// Fill and stroke styling applied to the overlay source.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    pub fill_color: String,
    pub stroke_color: String,
    /// Fill opacity in `[0, 1]`
    pub opacity: f64,
    pub stroke_width: f64,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            fill_color: "#FF6B6B".to_string(),
            stroke_color: "#CC5555".to_string(),
            opacity: 0.6,
            stroke_width: 1.0,
        }
    }
}

impl PaintStyle {
    /// Returns the style with opacity clamped into `[0, 1]` and a
    /// non-negative stroke width. NaN opacity falls back to fully opaque.
    pub fn clamped(mut self) -> Self {
        self.opacity = if self.opacity.is_nan() {
            1.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        };
        self.stroke_width = self.stroke_width.max(0.0);
        self
    }
}

/// How the controller asks the remote API for data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Fetch the single tile containing the view center.
    #[default]
    Tile,
    /// Fetch everything intersecting the viewport bounds.
    Bounds,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tile => f.write_str("tile"),
            Self::Bounds => f.write_str("bounds"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tile" => Ok(Self::Tile),
            "bounds" => Ok(Self::Bounds),
            other => Err(format!("unknown fetch mode '{}', expected tile or bounds", other)),
        }
    }
}

/// Static configuration for [`OverlaySyncController`](super::OverlaySyncController).
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Zoom levels the remote API serves
    pub zoom_range: ZoomRange,
    pub detector: DetectorConfig,
    pub fetch_mode: FetchMode,
    /// Renderer source the overlay is drawn into
    pub source_id: String,
    /// Visibility applied by `initialize`
    pub visible: bool,
    pub paint: PaintStyle,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            zoom_range: ZoomRange::default(),
            detector: DetectorConfig::default(),
            fetch_mode: FetchMode::default(),
            source_id: DEFAULT_SOURCE_ID.to_string(),
            visible: true,
            paint: PaintStyle::default(),
        }
    }
}

/// Lifecycle phase of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Fetching,
    Ready,
    Error,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Observable snapshot of the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    /// Most recent failure; cleared by the next successful refresh
    pub last_error: Option<OverlayError>,
    /// Features currently rendered
    pub feature_count: usize,
}

/// Result of handling a single event.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The overlay is hidden; nothing was fetched.
    Hidden,
    /// The zoom is outside the supported range; the overlay was cleared.
    OutOfRange { zoom: f64 },
    /// The view did not change enough to refresh.
    Unchanged,
    /// New data was rendered.
    Applied {
        signature: ViewSignature,
        feature_count: usize,
    },
    /// A newer request superseded this one, or the overlay was hidden
    /// while it was in flight. The response was dropped.
    Discarded { signature: ViewSignature },
    /// The refresh failed; previously rendered data is kept.
    Failed(OverlayError),
}

impl SyncOutcome {
    /// Returns true if this outcome rendered new data.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
