//! Tile math commands: `tile` and `tiles`.

use commutemap::coord::{
    enumerate_viewport_tiles, lon_lat_to_tile, normalize_lon, tile_bounding_box, TileAddress,
    ViewportBounds,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tile command.
pub struct TileArgs {
    pub lon: f64,
    pub lat: f64,
    pub zoom: u8,
    pub remote: bool,
}

/// Print the tile containing a point, computed locally or by the API.
pub async fn run_tile(args: TileArgs) -> Result<(), CliError> {
    let tile = if args.remote {
        let runner = CliRunner::new()?;
        runner.log_startup("tile");
        let config = runner.app_config()?;
        let client = runner.fetch_client(&config)?;
        client.coords_to_tile(args.lon, args.lat, args.zoom).await?
    } else {
        lon_lat_to_tile(normalize_lon(args.lon), args.lat, args.zoom)?
    };

    print_tile(&tile);
    Ok(())
}

/// Print every tile covering a viewport.
pub fn run_tiles(bounds: ViewportBounds, zoom: u8) -> Result<(), CliError> {
    let tiles = enumerate_viewport_tiles(&bounds, zoom)?;

    if bounds.crosses_antimeridian() {
        println!("Viewport crosses the antimeridian");
    }
    println!("{} tiles at zoom {}", tiles.len(), zoom);
    for tile in &tiles {
        print_tile(tile);
    }
    Ok(())
}

fn print_tile(tile: &TileAddress) {
    let [west, south, east, north] = tile_bounding_box(tile);
    println!(
        "{}  [W {:.6}, S {:.6}, E {:.6}, N {:.6}]",
        tile, west, south, east, north
    );
}
