//! Time-bounded cache of the schedule index.
//!
//! Reference tables (routes, stops, trips, stop times) change rarely, so
//! they are fetched together and indexed once per TTL. Live vehicle reports
//! are never cached.
//!
//! A refresh builds a complete new [`ScheduleIndex`] and swaps it in under
//! the write lock, so readers see either the previous generation or the new
//! one. A failed refresh leaves the previous generation in place.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::engine::{ScheduleIndex, TransitFeed};
use crate::tranzy::{
    RouteDto, StopDto, StopTimeDto, TranzyError, TripDto, convert_routes, convert_stop_times,
    convert_stops, convert_trips,
};

/// Freshness of the cached generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing has been fetched yet.
    Empty,
    /// Within the TTL.
    Fresh,
    /// Past the TTL or invalidated; still served until replaced.
    Stale,
}

#[derive(Debug)]
struct Generation {
    index: Arc<ScheduleIndex>,
    /// `None` once invalidated.
    fetched_at: Option<Instant>,
}

/// Cache holding one generation of indexed reference data.
#[derive(Debug)]
pub struct StaticDataCache {
    ttl: Duration,
    inner: RwLock<Option<Generation>>,
}

impl StaticDataCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current generation, fresh or not.
    pub async fn current(&self) -> Option<Arc<ScheduleIndex>> {
        let guard = self.inner.read().await;
        guard.as_ref().map(|g| Arc::clone(&g.index))
    }

    pub async fn state(&self) -> CacheState {
        let guard = self.inner.read().await;
        self.state_of(guard.as_ref())
    }

    fn state_of(&self, generation: Option<&Generation>) -> CacheState {
        match generation {
            None => CacheState::Empty,
            Some(Generation {
                fetched_at: Some(at),
                ..
            }) if at.elapsed() < self.ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// Mark the current generation stale so the next `ensure_fresh` refetches.
    ///
    /// The data itself stays available until the refetch succeeds.
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        if let Some(generation) = guard.as_mut() {
            generation.fetched_at = None;
        }
        debug!("schedule cache invalidated");
    }

    /// Return a fresh index, refetching from `feed` if needed.
    ///
    /// All four tables are fetched concurrently; if any fetch fails the
    /// error is returned and the previous generation is kept.
    pub async fn ensure_fresh<F: TransitFeed>(
        &self,
        feed: &F,
    ) -> Result<Arc<ScheduleIndex>, TranzyError> {
        {
            let guard = self.inner.read().await;
            if self.state_of(guard.as_ref()) == CacheState::Fresh {
                if let Some(generation) = guard.as_ref() {
                    return Ok(Arc::clone(&generation.index));
                }
            }
        }

        info!("refreshing schedule data");
        let (routes, stops, trips, stop_times) = futures::try_join!(
            feed.fetch_routes(),
            feed.fetch_stops(),
            feed.fetch_trips(),
            feed.fetch_stop_times(),
        )
        .inspect_err(|e| warn!(error = %e, "schedule refresh failed, keeping previous data"))?;

        let index = Arc::new(build_index(routes, stops, trips, stop_times));

        let mut guard = self.inner.write().await;
        *guard = Some(Generation {
            index: Arc::clone(&index),
            fetched_at: Some(Instant::now()),
        });

        Ok(index)
    }
}

/// Convert and index one fetch of the reference tables.
fn build_index(
    routes: Vec<RouteDto>,
    stops: Vec<StopDto>,
    trips: Vec<TripDto>,
    stop_times: Vec<StopTimeDto>,
) -> ScheduleIndex {
    let routes = convert_routes(routes);
    let stops = convert_stops(stops);
    let trips = convert_trips(trips);
    let stop_times = convert_stop_times(stop_times);

    for (table, dropped) in [
        ("routes", routes.dropped),
        ("stops", stops.dropped),
        ("trips", trips.dropped),
        ("stop_times", stop_times.dropped),
    ] {
        if dropped > 0 {
            warn!(table, dropped, "dropped malformed records");
        }
    }

    let index = ScheduleIndex::build(
        routes.records,
        stops.records,
        trips.records,
        stop_times.records,
    );
    info!(
        routes = index.route_count(),
        stops = index.stop_count(),
        trips = index.trip_count(),
        stop_times = index.stop_time_count(),
        "schedule data indexed"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MemoryFeed;

    #[tokio::test]
    async fn starts_empty() {
        let cache = StaticDataCache::new(Duration::from_secs(60));
        assert_eq!(cache.state().await, CacheState::Empty);
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn fetches_once_within_ttl() {
        let feed = MemoryFeed::sample();
        let cache = StaticDataCache::new(Duration::from_secs(3600));

        let first = cache.ensure_fresh(&feed).await.unwrap();
        let second = cache.ensure_fresh(&feed).await.unwrap();

        assert_eq!(feed.static_fetches(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.state().await, CacheState::Fresh);
        assert_eq!(first.route_count(), 2);
    }

    #[tokio::test]
    async fn refetches_after_ttl() {
        let feed = MemoryFeed::sample();
        let cache = StaticDataCache::new(Duration::ZERO);

        cache.ensure_fresh(&feed).await.unwrap();
        assert_eq!(cache.state().await, CacheState::Stale);
        cache.ensure_fresh(&feed).await.unwrap();

        assert_eq!(feed.static_fetches(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_but_keeps_data() {
        let feed = MemoryFeed::sample();
        let cache = StaticDataCache::new(Duration::from_secs(3600));

        cache.ensure_fresh(&feed).await.unwrap();
        cache.invalidate().await;

        assert_eq!(cache.state().await, CacheState::Stale);
        assert!(cache.current().await.is_some());

        cache.ensure_fresh(&feed).await.unwrap();
        assert_eq!(feed.static_fetches(), 2);
        assert_eq!(cache.state().await, CacheState::Fresh);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_generation() {
        let feed = MemoryFeed::sample();
        let cache = StaticDataCache::new(Duration::ZERO);

        let before = cache.ensure_fresh(&feed).await.unwrap();
        feed.fail_with(|| TranzyError::Api {
            status: 503,
            message: "maintenance".into(),
        });

        let err = cache.ensure_fresh(&feed).await.unwrap_err();
        assert!(matches!(err, TranzyError::Api { status: 503, .. }));

        let after = cache.current().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[tokio::test]
    async fn failure_on_empty_cache_stays_empty() {
        let feed = MemoryFeed::sample();
        feed.fail_with(|| TranzyError::Unauthorized { status: 401 });
        let cache = StaticDataCache::new(Duration::from_secs(60));

        let err = cache.ensure_fresh(&feed).await.unwrap_err();
        assert!(matches!(err, TranzyError::Unauthorized { status: 401 }));
        assert_eq!(cache.state().await, CacheState::Empty);
    }

    #[tokio::test]
    async fn malformed_records_are_dropped_not_fatal() {
        let feed = MemoryFeed::sample();
        feed.push_stop_time(StopTimeDto::default());
        let cache = StaticDataCache::new(Duration::from_secs(60));

        let index = cache.ensure_fresh(&feed).await.unwrap();
        assert_eq!(index.stop_time_count(), MemoryFeed::sample_stop_time_count());
    }
}
