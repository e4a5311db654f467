//! Coordinate types for Web Mercator tiling.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator (degrees).
///
/// Equals `atan(sinh(π))`, the latitude of the top edge of tile row 0.
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by the tile math.
///
/// Tile indices are `u32`; 24 keeps `2^z` comfortably inside that range and
/// covers every zoom a slippy-map renderer produces.
pub const MAX_ZOOM: u8 = 24;

/// Largest tile set [`enumerate_viewport_tiles`](super::enumerate_viewport_tiles)
/// will return.
///
/// A 4K display at any zoom covers well under 1,000 tiles; the whole world
/// at zoom 8 is exactly this many.
pub const MAX_VIEWPORT_TILES: u64 = 65_536;

/// Errors produced by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// A required coordinate was NaN or infinite.
    #[error("Non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Latitude outside the projectable range.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Zoom level outside `MIN_ZOOM..=MAX_ZOOM`.
    #[error("Invalid zoom level: {0}")]
    InvalidZoom(i64),

    /// The projected tile index falls outside `[0, 2^z)`.
    #[error("Tile index out of range at zoom {z}: x={x}, y={y}")]
    TileOutOfRange { z: u8, x: i64, y: i64 },

    /// Viewport bounds with `north < south`.
    #[error("Inverted bounds: north {north} < south {south}")]
    InvertedBounds { north: f64, south: f64 },

    /// Viewport enumeration would exceed [`MAX_VIEWPORT_TILES`].
    #[error("Viewport covers {count} tiles at zoom {z}, limit is {limit}")]
    TooManyTiles { z: u8, count: u64, limit: u64 },
}

/// Rejects NaN and infinities.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, CoordError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordError::NonFinite { field, value })
    }
}

/// Web Mercator tile address.
///
/// Invariant: `x < 2^z` and `y < 2^z`. Constructed through
/// [`TileAddress::new`] or the conversion functions in [`crate::coord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    /// Zoom level
    pub z: u8,
    /// Column, west to east
    pub x: u32,
    /// Row, north to south
    pub y: u32,
}

impl TileAddress {
    /// Creates a tile address, validating the zoom and index range.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z as i64));
        }
        let n = tiles_per_axis(z);
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(CoordError::TileOutOfRange {
                z,
                x: x as i64,
                y: y as i64,
            });
        }
        Ok(Self { z, x, y })
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom.
#[inline]
pub(crate) fn tiles_per_axis(z: u8) -> u64 {
    1u64 << z
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geographic rectangle currently visible on the map.
///
/// `east < west` means the rectangle crosses the antimeridian; this is a
/// valid state, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl ViewportBounds {
    /// Creates bounds, rejecting non-finite edges and `north < south`.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, CoordError> {
        let bounds = Self {
            north,
            south,
            east,
            west,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks the bounds invariants.
    pub fn validate(&self) -> Result<(), CoordError> {
        ensure_finite("north", self.north)?;
        ensure_finite("south", self.south)?;
        ensure_finite("east", self.east)?;
        ensure_finite("west", self.west)?;
        if self.north < self.south {
            return Err(CoordError::InvertedBounds {
                north: self.north,
                south: self.south,
            });
        }
        Ok(())
    }

    /// Returns true if the bounds wrap across the 180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.east < self.west
    }

    /// Center of the rectangle, honouring antimeridian crossing.
    pub fn center(&self) -> LonLat {
        let east = if self.crosses_antimeridian() {
            self.east + 360.0
        } else {
            self.east
        };
        let lon = super::normalize_lon((self.west + east) / 2.0);
        LonLat::new(lon, (self.north + self.south) / 2.0)
    }

    /// Sum of absolute edge differences against another rectangle.
    pub fn edge_delta(&self, other: &ViewportBounds) -> f64 {
        (self.north - other.north).abs()
            + (self.south - other.south).abs()
            + (self.east - other.east).abs()
            + (self.west - other.west).abs()
    }
}

/// Inclusive range of integer zoom levels supported by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    /// Creates a range, swapping the ends if given in reverse.
    pub fn new(min: u8, max: u8) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Returns true if the fractional `zoom` lies inside `[min, max]`.
    ///
    /// A zoom of 15.5 is outside `9..=15` even though it floors to 15.
    pub fn contains(&self, zoom: f64) -> bool {
        zoom.is_finite() && zoom >= f64::from(self.min) && zoom <= f64::from(self.max)
    }

    /// Floors `zoom` and clamps it into the range.
    pub fn clamp(&self, zoom: f64) -> Result<u8, CoordError> {
        super::clamp_zoom_to_range(zoom, self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 9, max: 15 }
    }
}
