//! Periodic board refresh for one stop.
//!
//! The engine itself has no timers. The poller drives it on a fixed
//! interval and publishes each result as an immutable [`BoardSnapshot`]
//! that HTTP handlers read without touching the upstream.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::board::{self, NextArrival, RouteSummary};
use crate::domain::RouteType;
use crate::engine::{Arrival, ArrivalsEngine, TransitFeed};
use crate::tranzy::TranzyError;

/// Default seconds between refreshes.
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;

/// Default arrivals kept per route.
const DEFAULT_MAX_ARRIVALS: usize = 10;

/// What to poll and how often.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub stop_id: String,

    /// Route types to show; empty means all.
    pub vehicle_types: Vec<RouteType>,

    pub scan_interval: Duration,

    /// Arrivals kept per route in each snapshot.
    pub max_arrivals: usize,
}

impl PollConfig {
    /// Trams only, every 30 seconds, ten arrivals per route.
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            vehicle_types: vec![RouteType::Tram],
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            max_arrivals: DEFAULT_MAX_ARRIVALS,
        }
    }

    pub fn with_vehicle_types(mut self, types: Vec<RouteType>) -> Self {
        self.vehicle_types = types;
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn with_max_arrivals(mut self, max: usize) -> Self {
        self.max_arrivals = max;
        self
    }

    /// The type filter to hand to the engine.
    pub fn type_filter(&self) -> Option<&[RouteType]> {
        (!self.vehicle_types.is_empty()).then_some(self.vehicle_types.as_slice())
    }
}

/// The board as of the last poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub stop_id: String,
    pub stop_name: Option<String>,
    /// When the arrivals were last computed successfully.
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub next: Option<NextArrival>,
    pub arrivals: Vec<Arrival>,
    pub routes: BTreeMap<String, RouteSummary>,
    pub route_names: Vec<String>,
    pub total_vehicles: usize,
    /// Message from the last failed poll, cleared on success.
    pub error: Option<String>,
}

impl BoardSnapshot {
    /// A board with nothing on it yet.
    pub fn empty(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            stop_name: None,
            updated_at: None,
            next: None,
            arrivals: Vec::new(),
            routes: BTreeMap::new(),
            route_names: Vec::new(),
            total_vehicles: 0,
            error: None,
        }
    }

    /// Build a board from a ranked list, capped per route.
    pub fn from_arrivals(
        stop_id: impl Into<String>,
        stop_name: Option<String>,
        ranked: &[Arrival],
        max_per_route: usize,
        updated_at: DateTime<FixedOffset>,
    ) -> Self {
        let arrivals = board::cap_per_route(ranked, max_per_route);
        Self {
            stop_id: stop_id.into(),
            stop_name,
            updated_at: Some(updated_at),
            next: board::next_arrival(&arrivals),
            routes: board::route_summaries(&arrivals),
            route_names: board::route_names(&arrivals),
            total_vehicles: arrivals.len(),
            arrivals,
            error: None,
        }
    }
}

/// Snapshot shared between the poller and readers.
pub type SharedSnapshot = Arc<RwLock<BoardSnapshot>>;

/// How the loop proceeds after a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterError {
    Continue,
    SkipNextTick,
    Stop,
}

fn after_error(err: &TranzyError) -> AfterError {
    match err {
        TranzyError::Unauthorized { .. } | TranzyError::NotConfigured(_) => AfterError::Stop,
        TranzyError::RateLimited => AfterError::SkipNextTick,
        _ => AfterError::Continue,
    }
}

/// Drives one engine for one stop.
pub struct Poller<F> {
    engine: Arc<ArrivalsEngine<F>>,
    config: PollConfig,
    snapshot: SharedSnapshot,
}

impl<F: TransitFeed> Poller<F> {
    pub fn new(engine: Arc<ArrivalsEngine<F>>, config: PollConfig) -> Self {
        let snapshot = Arc::new(RwLock::new(BoardSnapshot::empty(config.stop_id.clone())));
        Self {
            engine,
            config,
            snapshot,
        }
    }

    /// Handle for readers of the published board.
    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Refresh the board once, at the local wall clock.
    pub async fn poll_once(&self) -> Result<usize, TranzyError> {
        self.poll_once_at(Local::now().fixed_offset()).await
    }

    /// Refresh the board once, evaluated at `now`.
    ///
    /// On failure the previous arrivals stay published with `error` set.
    pub async fn poll_once_at(&self, now: DateTime<FixedOffset>) -> Result<usize, TranzyError> {
        let stop_id = self.config.stop_id.as_str();
        let result = self
            .engine
            .compute_arrivals_at(stop_id, self.config.type_filter(), now)
            .await;

        match result {
            Ok(ranked) => {
                let stop_name = self
                    .engine
                    .index()
                    .await
                    .and_then(|index| index.stop(stop_id).map(|s| s.name.clone()));
                let next = BoardSnapshot::from_arrivals(
                    stop_id,
                    stop_name,
                    &ranked,
                    self.config.max_arrivals,
                    now,
                );
                let count = next.arrivals.len();
                *self.snapshot.write().await = next;
                debug!(stop_id, arrivals = count, "board updated");
                Ok(count)
            }
            Err(e) => {
                self.snapshot.write().await.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Poll until the credentials are rejected.
    ///
    /// Missed ticks are skipped rather than bursted. A rate-limit response
    /// also skips the following tick.
    pub async fn run(self) {
        info!(
            stop_id = %self.config.stop_id,
            interval_secs = self.config.scan_interval.as_secs(),
            "poller started"
        );

        let mut interval = tokio::time::interval(self.config.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut skip_next = false;

        loop {
            interval.tick().await;
            if std::mem::take(&mut skip_next) {
                debug!("skipping tick after rate limit");
                continue;
            }

            let Err(e) = self.poll_once().await else {
                continue;
            };
            match after_error(&e) {
                AfterError::Stop => {
                    error!(error = %e, "poller stopped");
                    return;
                }
                AfterError::SkipNextTick => {
                    warn!(error = %e, "rate limited, backing off");
                    skip_next = true;
                }
                AfterError::Continue => warn!(error = %e, "poll failed"),
            }
        }
    }
}
