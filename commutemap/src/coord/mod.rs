//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile addresses, tile bounding boxes, and enumeration of
//! the tiles covering a viewport (including viewports that cross the
//! antimeridian).

mod types;

pub use types::{
    CoordError, LonLat, TileAddress, ViewportBounds, ZoomRange, MAX_LAT, MAX_LON,
    MAX_VIEWPORT_TILES, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

use types::{ensure_finite, tiles_per_axis};

/// Wraps a longitude into `[-180, 180)`.
#[inline]
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Fractional tile column for a longitude at `n` tiles per axis.
#[inline]
fn project_x(lon: f64, n: f64) -> f64 {
    (lon + 180.0) / 360.0 * n
}

/// Fractional tile row for a latitude at `n` tiles per axis.
#[inline]
fn project_y(lat: f64, n: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n
}

/// Inverse projection of a (possibly fractional) tile position.
#[inline]
fn unproject(x: f64, y: f64, n: f64) -> LonLat {
    let lon = x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    LonLat::new(lon, lat_rad.to_degrees())
}

fn check_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom as i64));
    }
    Ok(())
}

/// Converts geographic coordinates to a tile address.
///
/// Standard Web Mercator projection. No clamping is performed: a latitude
/// beyond the Mercator limit or a longitude outside `[-180, 180)` projects
/// to an index outside `[0, 2^z)` and is reported as
/// [`CoordError::TileOutOfRange`].
///
/// # Arguments
///
/// * `lon` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `zoom` - Zoom level (0 to 24)
#[inline]
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<TileAddress, CoordError> {
    ensure_finite("longitude", lon)?;
    ensure_finite("latitude", lat)?;
    check_zoom(zoom)?;
    if lat.abs() >= 90.0 {
        return Err(CoordError::InvalidLatitude(lat));
    }

    let n = tiles_per_axis(zoom);
    let x = project_x(lon, n as f64).floor() as i64;
    let y = project_y(lat, n as f64).floor() as i64;

    let n = n as i64;
    if !(0..n).contains(&x) || !(0..n).contains(&y) {
        return Err(CoordError::TileOutOfRange { z: zoom, x, y });
    }

    Ok(TileAddress {
        z: zoom,
        x: x as u32,
        y: y as u32,
    })
}

/// Returns the longitude/latitude of the tile's northwest corner.
#[inline]
pub fn tile_top_left(tile: &TileAddress) -> LonLat {
    let n = tiles_per_axis(tile.z) as f64;
    unproject(tile.x as f64, tile.y as f64, n)
}

/// Returns the longitude/latitude of the tile's center.
#[inline]
pub fn tile_center(tile: &TileAddress) -> LonLat {
    let n = tiles_per_axis(tile.z) as f64;
    unproject(tile.x as f64 + 0.5, tile.y as f64 + 0.5, n)
}

/// Returns the tile's bounding box as `[west, south, east, north]`.
///
/// Derived from the tile's top-left corner and the top-left corner of tile
/// `(x + 1, y + 1)`.
pub fn tile_bounding_box(tile: &TileAddress) -> [f64; 4] {
    let n = tiles_per_axis(tile.z) as f64;
    let north_west = unproject(tile.x as f64, tile.y as f64, n);
    let south_east = unproject(tile.x as f64 + 1.0, tile.y as f64 + 1.0, n);
    [north_west.lon, south_east.lat, south_east.lon, north_west.lat]
}

/// Enumerates the tiles covering a viewport at the given zoom.
///
/// The result is the full rectangle `[min_x..=max_x] × [min_y..=max_y]`,
/// ordered column by column. When `east < west` the viewport crosses the
/// antimeridian: east is shifted by +360 before projection and every column
/// index is wrapped modulo `2^z`. No tile appears twice.
///
/// Latitudes beyond the Mercator limit are clamped to it, and an east or
/// south edge lying exactly on a tile boundary does not pull in the
/// neighbouring tile.
///
/// Fails with [`CoordError::TooManyTiles`] before allocating if the result
/// would hold more than [`MAX_VIEWPORT_TILES`] tiles.
pub fn enumerate_viewport_tiles(
    bounds: &ViewportBounds,
    zoom: u8,
) -> Result<Vec<TileAddress>, CoordError> {
    bounds.validate()?;
    check_zoom(zoom)?;

    let n = tiles_per_axis(zoom) as i64;
    let nf = n as f64;

    let mut east = bounds.east;
    if bounds.crosses_antimeridian() {
        east += 360.0;
    }
    let width = east - bounds.west;
    let west = normalize_lon(bounds.west);
    let east = west + width;

    let min_x = project_x(west, nf).floor() as i64;
    let max_x = (project_x(east, nf).ceil() as i64 - 1).max(min_x);

    let north = bounds.north.clamp(MIN_LAT, MAX_LAT);
    let south = bounds.south.clamp(MIN_LAT, MAX_LAT);
    let min_y = (project_y(north, nf).floor() as i64).clamp(0, n - 1);
    let max_y = (project_y(south, nf).ceil() as i64 - 1).clamp(min_y, n - 1);

    let whole_world = max_x - min_x + 1 >= n;
    let column_count = if whole_world { n } else { max_x - min_x + 1 };
    let count = column_count as u64 * (max_y - min_y + 1) as u64;
    if count > MAX_VIEWPORT_TILES {
        return Err(CoordError::TooManyTiles {
            z: zoom,
            count,
            limit: MAX_VIEWPORT_TILES,
        });
    }

    let columns: Vec<u32> = if whole_world {
        (0..n).map(|x| x as u32).collect()
    } else {
        (min_x..=max_x).map(|x| x.rem_euclid(n) as u32).collect()
    };

    let mut tiles = Vec::with_capacity(count as usize);
    for x in columns {
        for y in min_y..=max_y {
            tiles.push(TileAddress {
                z: zoom,
                x,
                y: y as u32,
            });
        }
    }

    Ok(tiles)
}

/// Floors `zoom` and clamps it into the inclusive range `[min_zoom, max_zoom]`.
///
/// The supported range is supplied by the caller; the ends are swapped if
/// given in reverse order.
pub fn clamp_zoom_to_range(zoom: f64, min_zoom: u8, max_zoom: u8) -> Result<u8, CoordError> {
    let zoom = ensure_finite("zoom", zoom)?;
    let (lo, hi) = if min_zoom <= max_zoom {
        (min_zoom, max_zoom)
    } else {
        (max_zoom, min_zoom)
    };
    Ok(zoom.floor().clamp(f64::from(lo), f64::from(hi)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let tile = lon_lat_to_tile(-74.0060, 40.7128, 16).unwrap();
        assert_eq!(tile, TileAddress { z: 16, x: 19295, y: 24640 });
    }

    #[test]
    fn test_tokyo_station_at_zoom_13() {
        let tile = lon_lat_to_tile(139.767, 35.681, 13).unwrap();
        assert_eq!(tile, TileAddress { z: 13, x: 7276, y: 3225 });
    }

    #[test]
    fn test_non_finite_input_fails_fast() {
        assert!(matches!(
            lon_lat_to_tile(f64::NAN, 35.0, 10),
            Err(CoordError::NonFinite { field: "longitude", .. })
        ));
        assert!(matches!(
            lon_lat_to_tile(139.0, f64::INFINITY, 10),
            Err(CoordError::NonFinite { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        assert!(matches!(
            lon_lat_to_tile(0.0, 0.0, MAX_ZOOM + 1),
            Err(CoordError::InvalidZoom(_))
        ));
    }

    #[test]
    fn test_polar_latitude_is_not_clamped() {
        // Beyond the Mercator limit the projected row leaves the grid.
        let result = lon_lat_to_tile(0.0, 89.0, 10);
        assert!(matches!(
            result,
            Err(CoordError::TileOutOfRange { z: 10, y, .. }) if y < 0
        ));
        assert!(matches!(
            lon_lat_to_tile(0.0, 90.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_tile_top_left_at_origin() {
        let corner = tile_top_left(&TileAddress { z: 0, x: 0, y: 0 });
        assert_eq!(corner.lon, -180.0);
        assert!((corner.lat - MAX_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_tile_center_at_equator() {
        let center = tile_center(&TileAddress { z: 1, x: 1, y: 1 });
        assert!((center.lon - 90.0).abs() < 1e-9);
        assert!(center.lat < 0.0);
    }

    #[test]
    fn test_tile_bounding_box_ordering() {
        let tile = lon_lat_to_tile(139.767, 35.681, 13).unwrap();
        let [west, south, east, north] = tile_bounding_box(&tile);
        assert!(west < east);
        assert!(south < north);
        assert!(west <= 139.767 && 139.767 < east);
        assert!(south < 35.681 && 35.681 <= north);
    }

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(0.0), 0.0);
        assert_eq!(normalize_lon(181.0), -179.0);
        assert_eq!(normalize_lon(-181.0), 179.0);
        assert_eq!(normalize_lon(180.0), -180.0);
        assert_eq!(normalize_lon(540.0), -180.0);
    }

    #[test]
    fn test_enumerate_simple_viewport() {
        let bounds = ViewportBounds::new(35.70, 35.66, 139.80, 139.74).unwrap();
        let tiles = enumerate_viewport_tiles(&bounds, 13).unwrap();

        let xs: std::collections::BTreeSet<u32> = tiles.iter().map(|t| t.x).collect();
        let ys: std::collections::BTreeSet<u32> = tiles.iter().map(|t| t.y).collect();
        assert_eq!(tiles.len(), xs.len() * ys.len(), "Result must be rectangular");
        assert!(tiles.contains(&TileAddress { z: 13, x: 7276, y: 3225 }));
    }

    #[test]
    fn test_enumerate_antimeridian_crossing_wraps_columns() {
        let bounds = ViewportBounds::new(10.0, -10.0, -179.0, 179.0).unwrap();
        let tiles = enumerate_viewport_tiles(&bounds, 5).unwrap();

        assert!(!tiles.is_empty());
        for tile in &tiles {
            assert!(tile.x < 32, "column {} escaped the grid", tile.x);
        }
        let xs: std::collections::BTreeSet<u32> = tiles.iter().map(|t| t.x).collect();
        assert_eq!(xs.into_iter().collect::<Vec<_>>(), vec![0, 31]);
    }

    #[test]
    fn test_enumerate_whole_world_has_no_duplicates() {
        let bounds = ViewportBounds::new(85.0, -85.0, 180.0, -180.0).unwrap();
        let tiles = enumerate_viewport_tiles(&bounds, 2).unwrap();
        let unique: std::collections::HashSet<_> = tiles.iter().collect();
        assert_eq!(unique.len(), tiles.len());
        assert_eq!(tiles.len(), 16);
    }

    #[test]
    fn test_enumerate_wide_crossing_collapses_to_every_column() {
        // 350° wide viewport crossing the antimeridian at zoom 1
        let bounds = ViewportBounds::new(40.0, -40.0, 0.0, 10.0).unwrap();
        assert!(bounds.crosses_antimeridian());
        let tiles = enumerate_viewport_tiles(&bounds, 1).unwrap();
        let unique: std::collections::HashSet<_> = tiles.iter().collect();
        assert_eq!(unique.len(), tiles.len());
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_enumerate_rejects_oversized_viewport() {
        let bounds = ViewportBounds::new(85.0, -85.0, 180.0, -180.0).unwrap();

        // 256 × 256 at zoom 8 is exactly the limit
        assert_eq!(
            enumerate_viewport_tiles(&bounds, 8).unwrap().len() as u64,
            MAX_VIEWPORT_TILES
        );

        // 65536 columns × 65322 rows; must fail without allocating
        let err = enumerate_viewport_tiles(&bounds, 16).unwrap_err();
        assert_eq!(
            err,
            CoordError::TooManyTiles {
                z: 16,
                count: 65_536 * 65_322,
                limit: MAX_VIEWPORT_TILES
            }
        );
        assert!(matches!(
            enumerate_viewport_tiles(&bounds, 9),
            Err(CoordError::TooManyTiles { z: 9, .. })
        ));
    }

    #[test]
    fn test_enumerate_clamps_polar_bounds() {
        let bounds = ViewportBounds::new(89.0, -89.0, 10.0, -10.0).unwrap();
        let tiles = enumerate_viewport_tiles(&bounds, 3).unwrap();
        assert!(tiles.iter().all(|t| t.y < 8));
        assert!(tiles.iter().any(|t| t.y == 0));
        assert!(tiles.iter().any(|t| t.y == 7));
    }

    #[test]
    fn test_clamp_zoom_to_range() {
        assert_eq!(clamp_zoom_to_range(12.7, 9, 15).unwrap(), 12);
        assert_eq!(clamp_zoom_to_range(3.2, 9, 15).unwrap(), 9);
        assert_eq!(clamp_zoom_to_range(18.0, 9, 15).unwrap(), 15);
        assert_eq!(clamp_zoom_to_range(18.0, 15, 9).unwrap(), 15);
        assert!(clamp_zoom_to_range(f64::NAN, 9, 15).is_err());
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_top_left_roundtrip(
                x_raw in 0u32..u32::MAX,
                y_raw in 0u32..u32::MAX,
                zoom in 0u8..=18
            ) {
                let n = 1u32 << zoom;
                let tile = TileAddress { z: zoom, x: x_raw % n, y: y_raw % n };
                let corner = tile_top_left(&tile);

                // Nudge inward so floating-point error at the exact tile
                // boundary cannot push the point into the neighbour.
                let back = lon_lat_to_tile(corner.lon + 1e-9, corner.lat - 1e-9, zoom)?;
                prop_assert_eq!(back, tile);
            }

            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=MAX_ZOOM
            ) {
                let tile = lon_lat_to_tile(lon, lat, zoom)?;
                let n = 1u64 << zoom;
                prop_assert!(u64::from(tile.x) < n);
                prop_assert!(u64::from(tile.y) < n);
                prop_assert_eq!(tile.z, zoom);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let tile1 = lon_lat_to_tile(lon1, lat, zoom)?;
                let tile2 = lon_lat_to_tile(lon2, lat, zoom)?;
                prop_assert!(tile1.x < tile2.x);
            }

            #[test]
            fn test_enumeration_covers_bounds(
                south in -80.0..79.0_f64,
                height in 0.001..1.0_f64,
                west in -179.0..178.0_f64,
                width in 0.001..1.0_f64,
                zoom in 0u8..=14
            ) {
                let bounds = ViewportBounds::new(south + height, south, west + width, west)?;
                let tiles = enumerate_viewport_tiles(&bounds, zoom)?;

                let mut union = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
                for tile in &tiles {
                    let [w, s, e, n] = tile_bounding_box(tile);
                    union[0] = union[0].min(w);
                    union[1] = union[1].min(s);
                    union[2] = union[2].max(e);
                    union[3] = union[3].max(n);
                }
                let eps = 1e-9;
                prop_assert!(union[0] <= bounds.west + eps);
                prop_assert!(union[1] <= bounds.south + eps);
                prop_assert!(union[2] >= bounds.east - eps);
                prop_assert!(union[3] >= bounds.north - eps);
            }

            #[test]
            fn test_crossing_enumeration_stays_in_grid(
                west in 170.0..179.9_f64,
                east in -179.9..-170.0_f64,
                zoom in 0u8..=12
            ) {
                let bounds = ViewportBounds::new(5.0, -5.0, east, west)?;
                let tiles = enumerate_viewport_tiles(&bounds, zoom)?;
                let n = 1u32 << zoom;
                let unique: std::collections::HashSet<_> = tiles.iter().collect();

                prop_assert_eq!(unique.len(), tiles.len());
                for tile in &tiles {
                    prop_assert!(tile.x < n);
                }
            }
        }
    }
}
