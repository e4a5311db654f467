//! Fakes for controller tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use geojson::FeatureCollection;
use parking_lot::Mutex;
use serde_json::json;

use super::traits::{OverlayRenderer, OverlaySource};
use super::types::PaintStyle;
use crate::coord::{LonLat, ViewportBounds};
use crate::error::OverlayError;
use crate::fetch::OverlayRequest;
use crate::overlay::tests::{collection, polygon_feature};
use crate::viewport::Viewport;

type Scripted = (Duration, Result<FeatureCollection, OverlayError>);

/// Source replaying scripted responses, each after its own delay.
#[derive(Default)]
pub struct FakeSource {
    script: Mutex<VecDeque<Scripted>>,
    pub requests: Mutex<Vec<OverlayRequest>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, delay: Duration, result: Result<FeatureCollection, OverlayError>) -> Self {
        self.script.lock().push_back((delay, result));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl OverlaySource for FakeSource {
    async fn fetch(&self, request: &OverlayRequest) -> Result<FeatureCollection, OverlayError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        let (delay, result) = next.unwrap_or_else(|| (Duration::ZERO, Ok(features(1))));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// A renderer call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Upsert { source_id: String, features: usize },
    Visible(bool),
    Paint(PaintStyle),
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn upserts(&self) -> Vec<usize> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Upsert { features, .. } => Some(*features),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<RenderEvent> {
        self.events.lock().last().cloned()
    }
}

impl OverlayRenderer for RecordingRenderer {
    fn upsert(&self, source_id: &str, data: Arc<FeatureCollection>) {
        self.events.lock().push(RenderEvent::Upsert {
            source_id: source_id.to_string(),
            features: data.features.len(),
        });
    }

    fn set_visible(&self, _source_id: &str, visible: bool) {
        self.events.lock().push(RenderEvent::Visible(visible));
    }

    fn set_paint(&self, _source_id: &str, paint: &PaintStyle) {
        self.events.lock().push(RenderEvent::Paint(paint.clone()));
    }
}

/// A collection of `count` DID polygons.
pub fn features(count: usize) -> FeatureCollection {
    collection(
        (0..count)
            .map(|i| polygon_feature(json!({ "A16_003": format!("Region {}", i), "A16_005": 100 })))
            .collect(),
    )
}

/// A small viewport centered on (`lon`, `lat`).
pub fn view(lon: f64, lat: f64, zoom: f64) -> Viewport {
    let half = 0.01;
    let bounds = ViewportBounds {
        north: lat + half,
        south: lat - half,
        east: lon + half,
        west: lon - half,
    };
    Viewport::new(bounds, zoom, LonLat::new(lon, lat))
}
