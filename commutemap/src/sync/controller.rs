//! Viewport-driven overlay synchronization.

use std::sync::Arc;

use geojson::FeatureCollection;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::traits::{OverlayRenderer, OverlaySource};
use super::types::{FetchMode, PaintStyle, SyncConfig, SyncOutcome, SyncPhase, SyncStatus};
use crate::cache::OverlayDataCache;
use crate::coord::{lon_lat_to_tile, normalize_lon};
use crate::error::OverlayError;
use crate::fetch::OverlayRequest;
use crate::viewport::{ViewSignature, Viewport, ViewportChangeDetector};

/// Mutable controller state, guarded by a single lock.
#[derive(Debug, Default)]
struct SyncState {
    /// Signature of the most recently started refresh
    last_signature: Option<ViewSignature>,
    /// Detector baseline: viewport of the most recently started refresh,
    /// dropped again if that refresh fails
    last_requested: Option<Viewport>,
    /// Most recent viewport reported by the host
    last_seen: Option<Viewport>,
    visible: bool,
    /// The renderer source holds the result of a successful refresh,
    /// possibly an empty one
    applied: bool,
    paint: PaintStyle,
    status: SyncStatus,
}

/// What an event requires once the state has been inspected.
enum Plan {
    Done(SyncOutcome),
    Clear { zoom: f64 },
    Fetch {
        signature: ViewSignature,
        request: OverlayRequest,
    },
}

/// Keeps the rendered overlay in step with the map viewport.
///
/// All methods take `&self`; overlapping events are allowed and resolved by
/// the staleness guard: a response is applied only if its signature is
/// still the latest requested one and the overlay is still visible.
pub struct OverlaySyncController<S: OverlaySource, R: OverlayRenderer> {
    source: Arc<S>,
    renderer: Arc<R>,
    cache: Arc<OverlayDataCache>,
    detector: ViewportChangeDetector,
    config: SyncConfig,
    state: Mutex<SyncState>,
    status_tx: watch::Sender<SyncStatus>,
}

impl<S: OverlaySource, R: OverlayRenderer> OverlaySyncController<S, R> {
    pub fn new(
        source: Arc<S>,
        renderer: Arc<R>,
        cache: Arc<OverlayDataCache>,
        config: SyncConfig,
    ) -> Self {
        let state = SyncState {
            visible: config.visible,
            paint: config.paint.clone().clamped(),
            ..Default::default()
        };
        let (status_tx, _) = watch::channel(SyncStatus::default());

        Self {
            source,
            renderer,
            cache,
            detector: ViewportChangeDetector::new(config.detector),
            config,
            state: Mutex::new(state),
            status_tx,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<OverlayDataCache> {
        &self.cache
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    pub fn paint(&self) -> PaintStyle {
        self.state.lock().paint.clone()
    }

    /// Current status snapshot.
    pub fn status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Applies paint and initial visibility to the renderer.
    pub fn initialize(&self) {
        let (paint, visible) = {
            let state = self.state.lock();
            (state.paint.clone(), state.visible)
        };
        self.renderer.set_paint(&self.config.source_id, &paint);
        self.renderer.set_visible(&self.config.source_id, visible);
        info!(
            source_id = %self.config.source_id,
            visible,
            fetch_mode = %self.config.fetch_mode,
            "Overlay initialized"
        );
    }

    /// Updates the paint style. Opacity is clamped into `[0, 1]`.
    pub fn set_paint(&self, paint: PaintStyle) {
        let paint = paint.clamped();
        self.state.lock().paint = paint.clone();
        self.renderer.set_paint(&self.config.source_id, &paint);
    }

    /// Handles a move-end/zoom-end notification from the host.
    pub async fn on_viewport_change(&self, viewport: Viewport) -> SyncOutcome {
        self.state.lock().last_seen = Some(viewport);
        self.evaluate(viewport).await
    }

    /// Shows or hides the overlay.
    ///
    /// Hiding keeps the cache and the rendered data. Showing re-evaluates
    /// the last seen viewport.
    pub async fn set_visible(&self, visible: bool) -> SyncOutcome {
        let last_seen = {
            let mut state = self.state.lock();
            if state.visible == visible {
                return if visible {
                    SyncOutcome::Unchanged
                } else {
                    SyncOutcome::Hidden
                };
            }
            state.visible = visible;
            if !visible {
                // An in-flight fetch will be discarded; let the next show refetch it
                if state.status.phase == SyncPhase::Fetching {
                    state.last_requested = None;
                    state.last_signature = None;
                }
                state.status.phase = SyncPhase::Idle;
                self.publish(&state);
            }
            state.last_seen
        };

        self.renderer.set_visible(&self.config.source_id, visible);

        if !visible {
            info!(source_id = %self.config.source_id, "Overlay hidden");
            return SyncOutcome::Hidden;
        }
        info!(source_id = %self.config.source_id, "Overlay shown");

        let outcome = match last_seen {
            Some(viewport) => self.evaluate(viewport).await,
            None => SyncOutcome::Unchanged,
        };

        if outcome == SyncOutcome::Unchanged {
            let mut state = self.state.lock();
            if state.visible && state.status.phase == SyncPhase::Idle && state.applied {
                state.status.phase = SyncPhase::Ready;
                self.publish(&state);
            }
        }
        outcome
    }

    /// Flips visibility.
    pub async fn toggle_visibility(&self) -> SyncOutcome {
        let visible = self.is_visible();
        self.set_visible(!visible).await
    }

    /// Forces a refresh of the last seen viewport.
    ///
    /// Drops the detector baseline so the next evaluation always refreshes.
    /// Cached data within its TTL is still reused.
    pub async fn refresh(&self) -> SyncOutcome {
        let last_seen = {
            let mut state = self.state.lock();
            state.last_requested = None;
            state.last_signature = None;
            state.last_seen
        };
        debug!("Forced overlay refresh");

        match last_seen {
            Some(viewport) => self.evaluate(viewport).await,
            None => SyncOutcome::Unchanged,
        }
    }

    async fn evaluate(&self, viewport: Viewport) -> SyncOutcome {
        let plan = match self.plan(&viewport) {
            Ok(plan) => plan,
            Err(e) => return self.fail(e),
        };

        match plan {
            Plan::Done(outcome) => outcome,
            Plan::Clear { zoom } => {
                self.renderer
                    .upsert(&self.config.source_id, Arc::new(empty_collection()));
                debug!(
                    zoom,
                    min_zoom = self.config.zoom_range.min,
                    max_zoom = self.config.zoom_range.max,
                    "Zoom outside supported range, overlay cleared"
                );
                SyncOutcome::OutOfRange { zoom }
            }
            Plan::Fetch { signature, request } => self.fetch(signature, request).await,
        }
    }

    /// Inspects and updates state for a viewport under the lock.
    fn plan(&self, viewport: &Viewport) -> Result<Plan, OverlayError> {
        let mut state = self.state.lock();

        if !state.visible {
            return Ok(Plan::Done(SyncOutcome::Hidden));
        }

        if !self.config.zoom_range.contains(viewport.zoom) {
            state.last_requested = None;
            state.last_signature = None;
            state.applied = false;
            state.status.phase = SyncPhase::Idle;
            state.status.feature_count = 0;
            self.publish(&state);
            return Ok(Plan::Clear {
                zoom: viewport.zoom,
            });
        }

        let signature = viewport.signature()?;
        if !self
            .detector
            .should_refresh(state.last_requested.as_ref(), viewport)
        {
            return Ok(Plan::Done(SyncOutcome::Unchanged));
        }

        let zoom = self.config.zoom_range.clamp(viewport.zoom)?;
        let request = match self.config.fetch_mode {
            FetchMode::Tile => {
                let center = viewport.center;
                OverlayRequest::tile(lon_lat_to_tile(normalize_lon(center.lon), center.lat, zoom)?)
            }
            FetchMode::Bounds => OverlayRequest::bounds(viewport.bounds, zoom),
        };

        state.last_requested = Some(*viewport);
        state.last_signature = Some(signature.clone());
        state.status.phase = SyncPhase::Fetching;
        self.publish(&state);

        Ok(Plan::Fetch { signature, request })
    }

    async fn fetch(&self, signature: ViewSignature, request: OverlayRequest) -> SyncOutcome {
        debug!(signature = %signature, request = ?request, "Overlay refresh started");

        let result = self
            .cache
            .get_or_fetch(&signature, || self.source.fetch(&request))
            .await;

        let mut state = self.state.lock();
        let current = state.visible && state.last_signature.as_ref() == Some(&signature);
        if !current {
            debug!(signature = %signature, "Discarding stale overlay response");
            return SyncOutcome::Discarded { signature };
        }

        match result {
            Ok(data) => {
                let feature_count = data.features.len();
                state.applied = true;
                state.status = SyncStatus {
                    phase: SyncPhase::Ready,
                    last_error: None,
                    feature_count,
                };
                self.publish(&state);
                drop(state);

                self.renderer.upsert(&self.config.source_id, data);
                info!(signature = %signature, feature_count, "Overlay updated");
                SyncOutcome::Applied {
                    signature,
                    feature_count,
                }
            }
            Err(e) => {
                // Without a baseline the next event always gets a fresh attempt
                state.last_requested = None;
                state.status.phase = SyncPhase::Error;
                state.status.last_error = Some(e.clone());
                self.publish(&state);
                warn!(signature = %signature, error = %e, "Overlay refresh failed");
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Records a failure that happened before any fetch started.
    fn fail(&self, error: OverlayError) -> SyncOutcome {
        let mut state = self.state.lock();
        state.status.phase = SyncPhase::Error;
        state.status.last_error = Some(error.clone());
        self.publish(&state);
        warn!(error = %error, "Overlay refresh rejected");
        SyncOutcome::Failed(error)
    }

    fn publish(&self, state: &SyncState) {
        self.status_tx.send_replace(state.status.clone());
    }
}

fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}
