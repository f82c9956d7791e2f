//! Conversion from Tranzy DTOs to domain types.
//!
//! A record missing one of its identity fields cannot be indexed and is
//! dropped. Dropping is per record: one bad row never fails a whole table.

use crate::domain::{Route, RouteType, Stop, StopTime, Trip, VehicleReport};

use super::types::{RouteDto, StopDto, StopTimeDto, TripDto, VehicleDto};

/// Why a single upstream record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// A required identity field is absent or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but unusable
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Records that survived conversion, plus how many were dropped.
#[derive(Debug, Clone)]
pub struct Converted<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

impl<T> Converted<T> {
    fn collect<D>(items: Vec<D>, convert: impl Fn(D) -> Result<T, ConversionError>) -> Self {
        let mut records = Vec::with_capacity(items.len());
        let mut dropped = 0;
        for item in items {
            match convert(item) {
                Ok(record) => records.push(record),
                Err(_) => dropped += 1,
            }
        }
        Self { records, dropped }
    }
}

/// Non-blank identity field, trimmed.
fn required(value: Option<String>, field: &'static str) -> Result<String, ConversionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConversionError::MissingField(field)),
    }
}

/// Non-blank optional field.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn convert_route(dto: RouteDto) -> Result<Route, ConversionError> {
    Ok(Route {
        route_id: required(dto.route_id, "route_id")?,
        short_name: dto.route_short_name.unwrap_or_default(),
        long_name: dto.route_long_name.unwrap_or_default(),
        route_type: dto.route_type.and_then(RouteType::from_code),
    })
}

pub fn convert_stop(dto: StopDto) -> Result<Stop, ConversionError> {
    Ok(Stop {
        stop_id: required(dto.stop_id, "stop_id")?,
        name: dto.stop_name.unwrap_or_default(),
        lat: dto.stop_lat,
        lon: dto.stop_lon,
    })
}

pub fn convert_trip(dto: TripDto) -> Result<Trip, ConversionError> {
    Ok(Trip {
        trip_id: required(dto.trip_id, "trip_id")?,
        route_id: required(dto.route_id, "route_id")?,
        headsign: present(dto.trip_headsign),
    })
}

pub fn convert_stop_time(dto: StopTimeDto) -> Result<StopTime, ConversionError> {
    let trip_id = required(dto.trip_id, "trip_id")?;
    let stop_id = required(dto.stop_id, "stop_id")?;

    // Absent means unordered (0); present text must be a non-negative integer.
    let stop_sequence = match present(dto.stop_sequence) {
        None => 0,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConversionError::InvalidField {
                field: "stop_sequence",
                value: raw,
            })?,
    };

    Ok(StopTime {
        trip_id,
        stop_id,
        stop_sequence,
        time_text: present(dto.arrival_time).or_else(|| present(dto.departure_time)),
    })
}

pub fn convert_vehicle(dto: VehicleDto) -> Result<VehicleReport, ConversionError> {
    let id = present(dto.id);
    let label = present(dto.label);
    if id.is_none() && label.is_none() {
        return Err(ConversionError::MissingField("id"));
    }

    Ok(VehicleReport {
        id,
        label,
        lat: dto.latitude,
        lon: dto.longitude,
        timestamp: present(dto.timestamp),
        speed: dto.speed,
        trip_id: present(dto.trip_id),
        route_id: present(dto.route_id),
        vehicle_type: dto.vehicle_type.and_then(RouteType::from_code),
        wheelchair_accessible: present(dto.wheelchair_accessible),
        bike_accessible: present(dto.bike_accessible),
    })
}

pub fn convert_routes(dtos: Vec<RouteDto>) -> Converted<Route> {
    Converted::collect(dtos, convert_route)
}

pub fn convert_stops(dtos: Vec<StopDto>) -> Converted<Stop> {
    Converted::collect(dtos, convert_stop)
}

pub fn convert_trips(dtos: Vec<TripDto>) -> Converted<Trip> {
    Converted::collect(dtos, convert_trip)
}

pub fn convert_stop_times(dtos: Vec<StopTimeDto>) -> Converted<StopTime> {
    Converted::collect(dtos, convert_stop_time)
}

pub fn convert_vehicles(dtos: Vec<VehicleDto>) -> Converted<VehicleReport> {
    Converted::collect(dtos, convert_vehicle)
}
