//! Viewport snapshots, view signatures and change detection.
//!
//! A [`Viewport`] is what the renderer reports on move-end/zoom-end. The
//! [`ViewportChangeDetector`] compares two snapshots to decide whether the
//! overlay needs refreshing, and [`ViewSignature`] derives the deterministic
//! cache key for a view.

use std::fmt;

use crate::coord::{CoordError, LonLat, ViewportBounds};

/// Default minimum zoom change that forces a refresh.
pub const DEFAULT_ZOOM_THRESHOLD: f64 = 0.5;

/// Default minimum summed edge movement (degrees) that forces a refresh.
pub const DEFAULT_BOUNDS_THRESHOLD: f64 = 0.01;

/// Decimal places kept for the center coordinates in a signature.
const SIGNATURE_PRECISION: f64 = 10_000.0;

/// Snapshot of the visible map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: ViewportBounds,
    /// Fractional zoom as reported by the renderer
    pub zoom: f64,
    pub center: LonLat,
}

impl Viewport {
    pub fn new(bounds: ViewportBounds, zoom: f64, center: LonLat) -> Self {
        Self {
            bounds,
            zoom,
            center,
        }
    }

    /// Builds a viewport whose center is the middle of `bounds`.
    pub fn from_bounds(bounds: ViewportBounds, zoom: f64) -> Self {
        Self::new(bounds, zoom, bounds.center())
    }

    /// Signature of this view, used as the cache key.
    pub fn signature(&self) -> Result<ViewSignature, CoordError> {
        ViewSignature::new(self.center, self.zoom)
    }
}

/// Deterministic cache key for a view.
///
/// Format: `view_{lon}_{lat}_{zoom}` where lon/lat are the center rounded
/// to four decimals and zoom is floored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewSignature(String);

impl ViewSignature {
    /// Derives the signature for a center and fractional zoom.
    pub fn new(center: LonLat, zoom: f64) -> Result<Self, CoordError> {
        let lon = round_coordinate(finite("longitude", center.lon)?);
        let lat = round_coordinate(finite("latitude", center.lat)?);
        let zoom = finite("zoom", zoom)?.floor() as i64;
        Ok(Self(format!("view_{}_{}_{}", lon, lat, zoom)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, CoordError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordError::NonFinite { field, value })
    }
}

/// Rounds to the signature precision; `+ 0.0` folds `-0.0` into `0.0`.
fn round_coordinate(value: f64) -> f64 {
    (value * SIGNATURE_PRECISION).round() / SIGNATURE_PRECISION + 0.0
}

/// Thresholds for [`ViewportChangeDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Zoom change at or above which a refresh is needed.
    pub zoom_threshold: f64,
    /// Summed edge movement at or above which a refresh is needed.
    pub bounds_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            zoom_threshold: DEFAULT_ZOOM_THRESHOLD,
            bounds_threshold: DEFAULT_BOUNDS_THRESHOLD,
        }
    }
}

/// Decides whether a viewport change warrants refetching overlay data.
#[derive(Debug, Clone, Default)]
pub struct ViewportChangeDetector {
    config: DetectorConfig,
}

impl ViewportChangeDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns true when `current` differs enough from `previous`.
    ///
    /// With no previous viewport a refresh is always needed. Otherwise the
    /// refresh is skipped only when both the zoom delta and the summed edge
    /// delta are strictly below their thresholds.
    pub fn should_refresh(&self, previous: Option<&Viewport>, current: &Viewport) -> bool {
        let Some(previous) = previous else {
            return true;
        };

        let zoom_delta = (current.zoom - previous.zoom).abs();
        let bounds_delta = current.bounds.edge_delta(&previous.bounds);

        let skip = zoom_delta < self.config.zoom_threshold
            && bounds_delta < self.config.bounds_threshold;

        tracing::trace!(
            zoom_delta,
            bounds_delta,
            refresh = !skip,
            "Viewport change evaluated"
        );

        !skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(lon: f64, lat: f64, zoom: f64) -> Viewport {
        let half = 0.01;
        let bounds = ViewportBounds::new(lat + half, lat - half, lon + half, lon - half).unwrap();
        Viewport::new(bounds, zoom, LonLat::new(lon, lat))
    }

    #[test]
    fn test_first_viewport_always_refreshes() {
        let detector = ViewportChangeDetector::default();
        assert!(detector.should_refresh(None, &viewport(139.767, 35.681, 15.0)));
    }

    #[test]
    fn test_identical_viewport_does_not_refresh() {
        let detector = ViewportChangeDetector::default();
        let view = viewport(139.767, 35.681, 15.0);

        assert!(detector.should_refresh(None, &view));
        assert!(!detector.should_refresh(Some(&view), &view));
    }

    #[test]
    fn test_zoom_delta_of_exactly_half_refreshes() {
        let detector = ViewportChangeDetector::default();
        let before = viewport(139.767, 35.681, 12.0);
        let after = Viewport {
            zoom: 12.5,
            ..before
        };
        assert!(detector.should_refresh(Some(&before), &after));
    }

    #[test]
    fn test_small_zoom_change_does_not_refresh() {
        let detector = ViewportChangeDetector::default();
        let before = viewport(139.767, 35.681, 12.0);
        let after = Viewport {
            zoom: 12.3,
            ..before
        };
        assert!(!detector.should_refresh(Some(&before), &after));
    }

    #[test]
    fn test_small_pan_does_not_refresh() {
        let detector = ViewportChangeDetector::default();
        let before = viewport(139.767, 35.681, 15.0);
        // each edge moves 0.001°, summed delta 0.004°
        let after = viewport(139.768, 35.682, 15.0);
        assert!(!detector.should_refresh(Some(&before), &after));
    }

    #[test]
    fn test_large_pan_refreshes() {
        let detector = ViewportChangeDetector::default();
        let before = viewport(139.767, 35.681, 15.0);
        let after = viewport(139.777, 35.681, 15.0);
        assert!(detector.should_refresh(Some(&before), &after));
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = ViewportChangeDetector::new(DetectorConfig {
            zoom_threshold: 2.0,
            bounds_threshold: 1.0,
        });
        let before = viewport(139.767, 35.681, 12.0);
        let after = viewport(139.867, 35.681, 13.0);
        assert!(!detector.should_refresh(Some(&before), &after));
    }

    #[test]
    fn test_signature_format() {
        let sig = ViewSignature::new(LonLat::new(139.767, 35.681), 15.7).unwrap();
        assert_eq!(sig.as_str(), "view_139.767_35.681_15");
    }

    #[test]
    fn test_signature_rounds_to_four_decimals() {
        let a = ViewSignature::new(LonLat::new(139.76701, 35.68099), 13.2).unwrap();
        let b = ViewSignature::new(LonLat::new(139.76704, 35.68102), 13.9).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "view_139.767_35.681_13");
    }

    #[test]
    fn test_signature_negative_zero_folds() {
        let sig = ViewSignature::new(LonLat::new(-0.00001, 0.0), 3.0).unwrap();
        assert_eq!(sig.as_str(), "view_0_0_3");
    }

    #[test]
    fn test_signature_rejects_non_finite() {
        assert!(ViewSignature::new(LonLat::new(f64::NAN, 0.0), 3.0).is_err());
        assert!(ViewSignature::new(LonLat::new(0.0, 0.0), f64::INFINITY).is_err());
    }
}
