//! Seams between the controller, the data source and the map renderer.

use std::future::Future;
use std::sync::Arc;

use geojson::FeatureCollection;

use super::types::PaintStyle;
use crate::error::OverlayError;
use crate::fetch::{AsyncHttpClient, OverlayFetchClient, OverlayRequest};

/// Something that can produce raw overlay data for a request.
pub trait OverlaySource: Send + Sync {
    fn fetch(
        &self,
        request: &OverlayRequest,
    ) -> impl Future<Output = Result<FeatureCollection, OverlayError>> + Send;
}

impl<C: AsyncHttpClient> OverlaySource for OverlayFetchClient<C> {
    async fn fetch(&self, request: &OverlayRequest) -> Result<FeatureCollection, OverlayError> {
        Ok(self.request(request).await?)
    }
}

/// The map layer the overlay is drawn into.
///
/// Calls are synchronous; the host applies them on its render thread.
pub trait OverlayRenderer: Send + Sync {
    /// Replaces the data of `source_id`, creating the source if needed.
    fn upsert(&self, source_id: &str, data: Arc<FeatureCollection>);

    fn set_visible(&self, source_id: &str, visible: bool);

    fn set_paint(&self, source_id: &str, paint: &PaintStyle);
}
