//! Remote API commands: `fetch` and `health`.

use commutemap::cache::OverlayDataCache;
use commutemap::coord::{lon_lat_to_tile, normalize_lon, LonLat, ViewportBounds};
use commutemap::fetch::OverlayRequest;
use commutemap::overlay::summarize;
use commutemap::viewport::{ViewSignature, Viewport};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Where to fetch overlay data for.
pub enum FetchTarget {
    /// The tile containing a point.
    Point { lon: f64, lat: f64 },
    /// Every tile covering a bounding box.
    Bounds(ViewportBounds),
}

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub target: FetchTarget,
    pub zoom: u8,
    pub area: Option<String>,
}

/// Fetch overlay data through the cache and print a summary.
pub async fn run_fetch(args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("fetch");
    let config = runner.app_config()?;

    let client = runner.fetch_client(&config)?;
    let cache = OverlayDataCache::new(config.cache_ttl, config.schema.clone());

    let zoom = f64::from(args.zoom);
    let (signature, request) = match args.target {
        FetchTarget::Point { lon, lat } => {
            let tile = lon_lat_to_tile(normalize_lon(lon), lat, args.zoom)?;
            println!("Tile: {}", tile);
            (
                ViewSignature::new(LonLat::new(lon, lat), zoom)?,
                OverlayRequest::tile(tile),
            )
        }
        FetchTarget::Bounds(bounds) => (
            Viewport::from_bounds(bounds, zoom).signature()?,
            OverlayRequest::bounds(bounds, args.zoom),
        ),
    };
    let request = match args.area {
        Some(code) => request.with_area_code(code),
        None => request,
    };

    let data = cache
        .get_or_fetch(&signature, || client.request(&request))
        .await?;
    let summary = summarize(&data);

    println!("View:        {}", signature);
    println!("Features:    {}", summary.feature_count);
    println!("Population:  {:.0}", summary.total_population);
    println!("Households:  {:.0}", summary.total_households);
    if summary.regions.is_empty() {
        println!("Regions:     (none)");
    } else {
        println!("Regions:     {}", summary.regions.join(", "));
    }

    Ok(())
}

/// Check the remote API health endpoint.
pub async fn run_health() -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("health");
    let config = runner.app_config()?;

    let client = runner.fetch_client(&config)?;
    let status = client.health().await?;

    match &status.message {
        Some(message) => println!("{}: {}", status.status, message),
        None => println!("{}", status.status),
    }

    if status.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Unhealthy(status.status))
    }
}
