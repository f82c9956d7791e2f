//! Arrival engine: cached schedule plus live reports for one agency.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheState, StaticDataCache};
use crate::domain::{RouteType, VehicleReport};
use crate::tranzy::{TranzyError, convert_vehicles};

use super::config::EngineConfig;
use super::feed::TransitFeed;
use super::fusion::{Arrival, FusionParams, fuse};
use super::index::ScheduleIndex;

/// Computes ranked arrivals at a stop from a [`TransitFeed`].
///
/// Holds its own schedule cache; vehicle reports are fetched fresh on
/// every computation. At most one schedule refresh runs at a time; callers
/// arriving during a refresh wait for it and reuse its result.
pub struct ArrivalsEngine<F> {
    feed: F,
    config: EngineConfig,
    cache: StaticDataCache,
    refresh: Mutex<()>,
}

impl<F: TransitFeed> ArrivalsEngine<F> {
    pub fn new(feed: F, config: EngineConfig) -> Self {
        let cache = StaticDataCache::new(config.static_ttl);
        Self {
            feed,
            config,
            cache,
            refresh: Mutex::new(()),
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Refetch the reference tables if the cache is empty or past its TTL.
    pub async fn ensure_fresh(&self) -> Result<Arc<ScheduleIndex>, TranzyError> {
        // The cache rechecks freshness once the lock is held, so waiters
        // return the generation the previous holder just fetched.
        let _refresh = self.refresh.lock().await;
        self.cache.ensure_fresh(&self.feed).await
    }

    /// Force the next computation to refetch the reference tables.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }

    pub async fn cache_state(&self) -> CacheState {
        self.cache.state().await
    }

    /// The currently cached index, without refreshing.
    ///
    /// `None` until the first successful refresh.
    pub async fn index(&self) -> Option<Arc<ScheduleIndex>> {
        self.cache.current().await
    }

    /// Ranked arrivals at `stop_id`, evaluated at the local wall clock.
    pub async fn compute_arrivals(
        &self,
        stop_id: &str,
        vehicle_types: Option<&[RouteType]>,
    ) -> Result<Vec<Arrival>, TranzyError> {
        self.compute_arrivals_at(stop_id, vehicle_types, Local::now().fixed_offset())
            .await
    }

    /// Ranked arrivals at `stop_id`, evaluated at `now`.
    ///
    /// Fails only when the schedule cannot be made fresh. A failed vehicle
    /// fetch degrades to schedule-only results.
    pub async fn compute_arrivals_at(
        &self,
        stop_id: &str,
        vehicle_types: Option<&[RouteType]>,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Arrival>, TranzyError> {
        let index = self.ensure_fresh().await?;
        if index.stop_times_at(stop_id).is_empty() {
            debug!(stop_id, "no scheduled visits at stop");
            return Ok(Vec::new());
        }

        let vehicles = self.live_vehicles().await;
        let params = FusionParams {
            stop_id,
            vehicle_types,
            now,
            max_vehicle_age: self.config.max_vehicle_age(),
        };
        let arrivals = fuse(&index, &vehicles, &params);

        debug!(
            stop_id,
            vehicles = vehicles.len(),
            arrivals = arrivals.len(),
            "arrivals computed"
        );
        Ok(arrivals)
    }

    /// Current vehicle reports; empty if the fetch fails.
    async fn live_vehicles(&self) -> Vec<VehicleReport> {
        match self.feed.fetch_vehicles().await {
            Ok(dtos) => {
                let converted = convert_vehicles(dtos);
                if converted.dropped > 0 {
                    debug!(dropped = converted.dropped, "dropped unidentifiable vehicles");
                }
                converted.records
            }
            Err(e) => {
                warn!(error = %e, "vehicle fetch failed, using schedule only");
                Vec::new()
            }
        }
    }
}
