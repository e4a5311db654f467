//! Signature-keyed overlay cache.
//!
//! [`OverlayDataCache`] stores normalized feature collections keyed by
//! [`ViewSignature`]. Entries expire after a fixed TTL and are evicted
//! lazily on the next lookup; there is no background sweeper.
//!
//! Time is read from [`tokio::time::Instant`], so expiry follows tokio's
//! clock and can be driven with a paused runtime in tests.

mod stats;

pub use stats::CacheStats;

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use geojson::FeatureCollection;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::OverlayError;
use crate::overlay::{normalize_collection, PropertySchema};
use crate::viewport::ViewSignature;

/// Default time-to-live for cached overlay data (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    data: Arc<FeatureCollection>,
    expires_at: Instant,
}

/// TTL cache of normalized overlay collections.
///
/// The internal lock is never held across an await: a miss releases the
/// lock, awaits the fetch, then re-acquires it to store the result.
pub struct OverlayDataCache {
    entries: Mutex<HashMap<ViewSignature, CacheEntry>>,
    ttl: Duration,
    schema: PropertySchema,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl OverlayDataCache {
    /// Creates a cache with the given TTL and normalization schema.
    pub fn new(ttl: Duration, schema: PropertySchema) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            schema,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// Creates a cache with [`DEFAULT_TTL`] and the DID schema.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TTL, PropertySchema::did())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    /// Returns the cached collection for `signature` if it has not expired.
    ///
    /// An expired entry is removed. Does not touch the hit/miss counters.
    pub fn get(&self, signature: &ViewSignature) -> Option<Arc<FeatureCollection>> {
        self.lookup(signature, Instant::now())
    }

    /// Returns the cached collection or fetches, normalizes and stores it.
    ///
    /// `fetch` is only invoked on a miss. Fetch and normalization failures
    /// are returned and leave the cache unchanged.
    ///
    /// # Arguments
    ///
    /// * `signature` - Cache key for the view
    /// * `fetch` - Produces the raw collection on a miss
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        signature: &ViewSignature,
        fetch: F,
    ) -> Result<Arc<FeatureCollection>, OverlayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FeatureCollection, E>>,
        E: Into<OverlayError>,
    {
        if let Some(data) = self.lookup(signature, Instant::now()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(signature = %signature, "Overlay cache hit");
            return Ok(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(signature = %signature, "Overlay cache miss, fetching");

        let raw = fetch().await.map_err(Into::<OverlayError>::into)?;
        let normalized = normalize_collection(raw, &self.schema)?;
        let data = Arc::new(normalized);

        let expires_at = Instant::now() + self.ttl;
        self.entries.lock().insert(
            signature.clone(),
            CacheEntry {
                data: Arc::clone(&data),
                expires_at,
            },
        );
        trace!(
            signature = %signature,
            features = data.features.len(),
            "Overlay cached"
        );

        Ok(data)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        debug!(removed, "Overlay cache cleared");
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn lookup(&self, signature: &ViewSignature, now: Instant) -> Option<Arc<FeatureCollection>> {
        let mut entries = self.entries.lock();
        match entries.get(signature) {
            Some(entry) if now < entry.expires_at => Some(Arc::clone(&entry.data)),
            Some(_) => {
                entries.remove(signature);
                self.expired.fetch_add(1, Ordering::Relaxed);
                trace!(signature = %signature, "Overlay cache entry expired");
                None
            }
            None => None,
        }
    }
}

impl Default for OverlayDataCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for OverlayDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayDataCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{CoordError, LonLat};
    use crate::overlay::tests::{collection, polygon_feature};
    use crate::overlay::NormalizeError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn signature(lon: f64, lat: f64, zoom: f64) -> ViewSignature {
        ViewSignature::new(LonLat::new(lon, lat), zoom).unwrap()
    }

    fn sample() -> FeatureCollection {
        collection(vec![polygon_feature(json!({ "name": " Chiyoda ", "population": -1 }))])
    }

    async fn fetch_counted(
        cache: &OverlayDataCache,
        sig: &ViewSignature,
        calls: &AtomicUsize,
    ) -> Result<Arc<FeatureCollection>, OverlayError> {
        cache
            .get_or_fetch(sig, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OverlayError>(sample())
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_lookup_within_ttl_is_served_from_cache() {
        let cache = OverlayDataCache::new(DEFAULT_TTL, PropertySchema::empty());
        let sig = signature(139.767, 35.681, 15.0);
        let calls = AtomicUsize::new(0);

        let first = fetch_counted(&cache, &sig, &calls).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = fetch_counted(&cache, &sig, &calls).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let cache = OverlayDataCache::new(DEFAULT_TTL, PropertySchema::empty());
        let sig = signature(139.767, 35.681, 15.0);
        let calls = AtomicUsize::new(0);

        fetch_counted(&cache, &sig, &calls).await.unwrap();
        tokio::time::advance(DEFAULT_TTL).await;
        fetch_counted(&cache, &sig, &calls).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().expired, 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_evicts_expired_entry() {
        let cache = OverlayDataCache::new(Duration::from_secs(10), PropertySchema::empty());
        let sig = signature(0.0, 0.0, 9.0);
        let calls = AtomicUsize::new(0);

        fetch_counted(&cache, &sig, &calls).await.unwrap();
        assert!(cache.get(&sig).is_some());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get(&sig).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_signatures_fetch_separately() {
        let cache = OverlayDataCache::with_defaults();
        let calls = AtomicUsize::new(0);

        fetch_counted(&cache, &signature(139.767, 35.681, 15.0), &calls)
            .await
            .unwrap();
        fetch_counted(&cache, &signature(139.767, 35.681, 13.0), &calls)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_for_many_views() {
        let cache = OverlayDataCache::with_defaults();
        let calls = AtomicUsize::new(0);
        let signatures: Vec<_> = (0..8)
            .map(|i| signature(139.0 + f64::from(i) * 0.1, 35.681, 13.0))
            .collect();

        let fetches = signatures
            .iter()
            .map(|sig| fetch_counted(&cache, sig, &calls));
        let results = futures::future::join_all(fetches).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(cache.len(), 8);

        for sig in &signatures {
            fetch_counted(&cache, sig, &calls).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(cache.stats().hits, 8);
    }

    #[tokio::test]
    async fn test_cached_data_is_normalized() {
        let schema = PropertySchema::empty().with_numeric(["population"]);
        let cache = OverlayDataCache::new(DEFAULT_TTL, schema);
        let calls = AtomicUsize::new(0);

        let data = fetch_counted(&cache, &signature(1.0, 1.0, 10.0), &calls)
            .await
            .unwrap();
        let props = data.features[0].properties.as_ref().unwrap();

        assert_eq!(props["name"], json!("Chiyoda"));
        assert_eq!(props["population"], json!(0));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_cached() {
        let cache = OverlayDataCache::with_defaults();
        let sig = signature(139.767, 35.681, 15.0);

        let err = cache
            .get_or_fetch(&sig, || async {
                Err::<FeatureCollection, _>(CoordError::InvalidLatitude(91.0))
            })
            .await
            .unwrap_err();

        assert_eq!(err, OverlayError::Coord(CoordError::InvalidLatitude(91.0)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_normalization_failure_is_not_cached() {
        let cache = OverlayDataCache::with_defaults();
        let sig = signature(139.767, 35.681, 15.0);
        let mut feature = polygon_feature(json!({}));
        feature.geometry = None;

        let err = cache
            .get_or_fetch(&sig, || async move {
                Ok::<_, OverlayError>(collection(vec![feature]))
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OverlayError::Normalize(NormalizeError::UnsupportedGeometry { index: 0, .. })
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let cache = OverlayDataCache::with_defaults();
        let calls = AtomicUsize::new(0);
        let sig = signature(139.767, 35.681, 15.0);

        fetch_counted(&cache, &sig, &calls).await.unwrap();
        cache.clear();
        assert!(cache.is_empty());

        fetch_counted(&cache, &sig, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
