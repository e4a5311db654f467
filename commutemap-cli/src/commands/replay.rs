//! Replay command - drive the overlay controller from a recorded event list.
//!
//! The script is a JSON array of events:
//!
//! ```json
//! [
//!   { "event": "show" },
//!   { "event": "viewport", "north": 35.69, "south": 35.67, "east": 139.78, "west": 139.75, "zoom": 15.2 },
//!   { "event": "wait", "secs": 2.0 },
//!   { "event": "toggle" },
//!   { "event": "refresh" }
//! ]
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use commutemap::app::OverlayApp;
use commutemap::coord::ViewportBounds;
use commutemap::sync::{OverlayRenderer, PaintStyle, SyncOutcome};
use commutemap::viewport::Viewport;
use geojson::FeatureCollection;
use serde::Deserialize;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// One recorded host notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Move-end/zoom-end with the new visible area.
    Viewport {
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        zoom: f64,
    },
    Show,
    Hide,
    Toggle,
    Refresh,
    /// Pause between events, in seconds.
    Wait { secs: f64 },
}

/// Renderer that reports every call instead of drawing.
#[derive(Debug, Default)]
pub struct LoggingRenderer;

impl OverlayRenderer for LoggingRenderer {
    fn upsert(&self, source_id: &str, data: Arc<FeatureCollection>) {
        info!(source_id, features = data.features.len(), "Render data");
        println!("  render  {} <- {} features", source_id, data.features.len());
    }

    fn set_visible(&self, source_id: &str, visible: bool) {
        info!(source_id, visible, "Render visibility");
        println!("  render  {} visible={}", source_id, visible);
    }

    fn set_paint(&self, source_id: &str, paint: &PaintStyle) {
        println!(
            "  render  {} paint fill={} stroke={} opacity={}",
            source_id, paint.fill_color, paint.stroke_color, paint.opacity
        );
    }
}

/// Reads and parses a replay script.
pub fn load_events(path: &Path) -> Result<Vec<ReplayEvent>, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::Replay(format!("{}: {}", path.display(), e)))?;
    parse_events(&contents)
}

fn parse_events(contents: &str) -> Result<Vec<ReplayEvent>, CliError> {
    serde_json::from_str(contents).map_err(|e| CliError::Replay(e.to_string()))
}

/// Run the replay command.
pub async fn run(path: &Path) -> Result<(), CliError> {
    let events = load_events(path)?;

    let runner = CliRunner::new()?;
    runner.log_startup("replay");
    let config = runner.app_config()?;

    let app = OverlayApp::start(config, Arc::new(LoggingRenderer))?;
    let controller = app.controller();

    for (index, event) in events.into_iter().enumerate() {
        println!("#{} {:?}", index, event);
        let outcome = match event {
            ReplayEvent::Viewport {
                north,
                south,
                east,
                west,
                zoom,
            } => {
                let bounds = ViewportBounds::new(north, south, east, west)?;
                controller
                    .on_viewport_change(Viewport::from_bounds(bounds, zoom))
                    .await
            }
            ReplayEvent::Show => controller.set_visible(true).await,
            ReplayEvent::Hide => controller.set_visible(false).await,
            ReplayEvent::Toggle => controller.toggle_visibility().await,
            ReplayEvent::Refresh => controller.refresh().await,
            ReplayEvent::Wait { secs } => {
                let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                continue;
            }
        };
        println!("  => {}", describe(&outcome));
    }

    let status = controller.status();
    let stats = app.cache().stats();
    println!();
    println!(
        "Final phase: {} ({} features rendered)",
        status.phase, status.feature_count
    );
    println!(
        "Cache: {} entries, {} hits, {} misses, {} expired",
        stats.entries, stats.hits, stats.misses, stats.expired
    );

    Ok(())
}

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Hidden => "hidden".to_string(),
        SyncOutcome::OutOfRange { zoom } => format!("zoom {:.2} out of range, cleared", zoom),
        SyncOutcome::Unchanged => "unchanged".to_string(),
        SyncOutcome::Applied {
            signature,
            feature_count,
        } => format!("applied {} ({} features)", signature, feature_count),
        SyncOutcome::Discarded { signature } => format!("discarded stale {}", signature),
        SyncOutcome::Failed(e) => format!("failed: {}", e),
    }
}
