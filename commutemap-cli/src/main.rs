//! CommuteMap CLI - Command-line interface
//!
//! Exposes the tile math, the overlay API client and the overlay controller
//! of the `commutemap` library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commutemap::coord::ViewportBounds;

use commands::config::ConfigCommands;
use commands::fetch::{FetchArgs, FetchTarget};
use commands::tile::TileArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "commutemap")]
#[command(version, about = "Viewport-synchronized map overlays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tile containing a point
    Tile {
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long)]
        zoom: u8,

        /// Ask the overlay API instead of computing locally
        #[arg(long)]
        remote: bool,
    },

    /// List the tiles covering a viewport
    Tiles {
        #[arg(long, allow_negative_numbers = true)]
        north: f64,

        #[arg(long, allow_negative_numbers = true)]
        south: f64,

        #[arg(long, allow_negative_numbers = true)]
        east: f64,

        #[arg(long, allow_negative_numbers = true)]
        west: f64,

        #[arg(long)]
        zoom: u8,
    },

    /// Fetch overlay data for a point or a bounding box and summarize it
    Fetch {
        #[arg(long, allow_negative_numbers = true, requires = "lat", conflicts_with = "bounds")]
        lon: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Bounding box as NORTH,SOUTH,EAST,WEST
        #[arg(long, allow_hyphen_values = true, value_parser = parse_bounds)]
        bounds: Option<ViewportBounds>,

        #[arg(long)]
        zoom: u8,

        /// Administrative area code filter
        #[arg(long)]
        area: Option<String>,
    },

    /// Check the overlay API health endpoint
    Health,

    /// Feed a JSON list of viewport events through the overlay controller
    Replay {
        /// Path to the event script
        file: PathBuf,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn parse_bounds(value: &str) -> Result<ViewportBounds, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;

    match parts.as_slice() {
        [north, south, east, west] => {
            ViewportBounds::new(*north, *south, *east, *west).map_err(|e| e.to_string())
        }
        _ => Err("expected NORTH,SOUTH,EAST,WEST".to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Tile {
            lon,
            lat,
            zoom,
            remote,
        } => {
            commands::tile::run_tile(TileArgs {
                lon,
                lat,
                zoom,
                remote,
            })
            .await
        }
        Commands::Tiles {
            north,
            south,
            east,
            west,
            zoom,
        } => {
            let bounds = ViewportBounds::new(north, south, east, west)?;
            commands::tile::run_tiles(bounds, zoom)
        }
        Commands::Fetch {
            lon,
            lat,
            bounds,
            zoom,
            area,
        } => {
            let target = match (lon, lat, bounds) {
                (Some(lon), Some(lat), None) => FetchTarget::Point { lon, lat },
                (None, None, Some(bounds)) => FetchTarget::Bounds(bounds),
                _ => {
                    return Err(CliError::Config(
                        "Specify either --lon and --lat, or --bounds".to_string(),
                    ))
                }
            };
            commands::fetch::run_fetch(FetchArgs { target, zoom, area }).await
        }
        Commands::Health => commands::fetch::run_health().await,
        Commands::Replay { file } => commands::replay::run(&file).await,
        Commands::Config { command } => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bounds() {
        let bounds = parse_bounds("35.69,35.67,139.78,139.75").unwrap();
        assert_eq!(bounds.north, 35.69);
        assert_eq!(bounds.west, 139.75);

        let crossing = parse_bounds("10, -10, -179, 179").unwrap();
        assert!(crossing.crosses_antimeridian());
    }

    #[test]
    fn test_parse_bounds_rejects_bad_input() {
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("north,2,3,4").is_err());
        assert!(parse_bounds("10,20,3,4").is_err());
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "commutemap", "tile", "--lon", "-73.98", "--lat", "40.75", "--zoom", "12",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Tile { lon, .. } if lon == -73.98));
    }
}
