//! Tranzy OpenData client.
//!
//! This module provides the upstream data source for the arrival engine:
//! an HTTP client for the Tranzy OpenData API, which partially implements
//! GTFS, and a file-backed stand-in for development.
//!
//! Key characteristics of the API:
//! - Every endpoint returns a flat, non-paginated JSON array
//! - Requests are scoped to one agency by the `X-Agency-Id` header
//! - Identifiers are numbers for some agencies and strings for others

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{TranzyClient, TranzyConfig};
pub use convert::{
    ConversionError, Converted, convert_route, convert_routes, convert_stop, convert_stop_time,
    convert_stop_times, convert_stops, convert_trip, convert_trips, convert_vehicle,
    convert_vehicles,
};
pub use error::TranzyError;
pub use mock::FileFeed;
pub use types::{RouteDto, StopDto, StopTimeDto, TripDto, VehicleDto};
