//! Validated transit records.
//!
//! These are produced from upstream DTOs by the conversion layer. Identity
//! fields are always present and non-empty; everything else the upstream may
//! legitimately omit stays optional.

use serde::Serialize;

use super::{RouteType, ServiceTime};

/// A route (line) operated by the agency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub route_id: String,
    pub short_name: String,
    pub long_name: String,
    /// `None` when the upstream code is outside the supported vocabulary.
    pub route_type: Option<RouteType>,
}

/// A physical stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub stop_id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Stop {
    /// Coordinates, if both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}

/// One run of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub headsign: Option<String>,
}

/// A scheduled visit of a trip to a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    /// Raw arrival time text (falls back to the departure time upstream).
    pub time_text: Option<String>,
}

impl StopTime {
    /// The scheduled time, if present and well-formed.
    pub fn service_time(&self) -> Option<ServiceTime> {
        ServiceTime::parse(self.time_text.as_deref()?).ok()
    }
}

/// A live position report from a vehicle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleReport {
    pub id: Option<String>,
    pub label: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// ISO-8601 timestamp as reported.
    pub timestamp: Option<String>,
    pub speed: Option<f64>,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub vehicle_type: Option<RouteType>,
    pub wheelchair_accessible: Option<String>,
    pub bike_accessible: Option<String>,
}

impl VehicleReport {
    /// Coordinates, if both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }

    /// Stable identity for de-duplication: the id, else the label.
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref().or(self.label.as_deref())
    }
}
