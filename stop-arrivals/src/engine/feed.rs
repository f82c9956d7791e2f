//! Upstream data source abstraction.

use std::future::Future;

use crate::tranzy::{RouteDto, StopDto, StopTimeDto, TranzyError, TripDto, VehicleDto};

/// A source of transit record arrays.
///
/// Implemented by [`crate::tranzy::TranzyClient`] for live data and by
/// [`crate::tranzy::FileFeed`] for local files. Tests use in-memory feeds.
pub trait TransitFeed: Send + Sync {
    fn fetch_routes(&self) -> impl Future<Output = Result<Vec<RouteDto>, TranzyError>> + Send;

    fn fetch_stops(&self) -> impl Future<Output = Result<Vec<StopDto>, TranzyError>> + Send;

    fn fetch_trips(&self) -> impl Future<Output = Result<Vec<TripDto>, TranzyError>> + Send;

    fn fetch_stop_times(
        &self,
    ) -> impl Future<Output = Result<Vec<StopTimeDto>, TranzyError>> + Send;

    /// Current live vehicle reports. Never cached.
    fn fetch_vehicles(&self) -> impl Future<Output = Result<Vec<VehicleDto>, TranzyError>> + Send;
}
