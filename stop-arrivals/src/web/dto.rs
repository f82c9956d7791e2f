//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Route, RouteType, Stop};

/// Query for `/stops`.
#[derive(Debug, Default, Deserialize)]
pub struct StopSearchRequest {
    /// Case-insensitive name fragment; empty matches everything
    #[serde(default)]
    pub search: Option<String>,

    /// Maximum number of results (default 10, at most 50)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A stop in search results.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub stop_id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopResult>,
}

/// A route serving a stop.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub route_id: String,
    pub short_name: String,
    pub long_name: String,
    pub route_type: Option<RouteType>,
    /// Human-readable type, e.g. "tram"
    pub route_type_label: String,
}

/// Response for `/stops/{stop_id}`.
#[derive(Debug, Serialize)]
pub struct StopDetailResponse {
    #[serde(flatten)]
    pub stop: StopResult,

    /// Routes with at least one trip calling here, by short name
    pub routes: Vec<RouteResult>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl From<Stop> for StopResult {
    fn from(stop: Stop) -> Self {
        Self {
            stop_id: stop.stop_id,
            name: stop.name,
            lat: stop.lat,
            lon: stop.lon,
        }
    }
}

impl From<Route> for RouteResult {
    fn from(route: Route) -> Self {
        Self {
            route_type_label: route
                .route_type
                .map_or("unknown", RouteType::label)
                .to_string(),
            route_id: route.route_id,
            short_name: route.short_name,
            long_name: route.long_name,
            route_type: route.route_type,
        }
    }
}
