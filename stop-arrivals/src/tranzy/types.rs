//! Tranzy OpenData response DTOs.
//!
//! These types map directly to the JSON record arrays returned by the
//! upstream. Everything is optional because the API omits fields freely,
//! and identifiers arrive as numbers for some agencies and strings for
//! others. Validation happens later, in the conversion layer.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::convert::Converted;

/// A row of `/routes`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RouteDto {
    #[serde(default, deserialize_with = "opt_string")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub route_short_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub route_long_name: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub route_type: Option<i64>,
}

/// A row of `/stops`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StopDto {
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_name: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub stop_lat: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub stop_lon: Option<f64>,
}

/// A row of `/trips`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TripDto {
    #[serde(default, deserialize_with = "opt_string")]
    pub trip_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub trip_headsign: Option<String>,
}

/// A row of `/stop_times`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StopTimeDto {
    #[serde(default, deserialize_with = "opt_string")]
    pub trip_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_id: Option<String>,
    /// Raw text; parsed and validated during conversion.
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_sequence: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub departure_time: Option<String>,
}

/// A row of `/vehicles`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VehicleDto {
    #[serde(default, alias = "vehicle_id", deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default, alias = "vehicle_label", deserialize_with = "opt_string")]
    pub label: Option<String>,
    #[serde(default, alias = "lat", deserialize_with = "opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng", deserialize_with = "opt_f64")]
    pub longitude: Option<f64>,
    /// ISO-8601 text; epoch seconds are normalised to RFC 3339.
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub trip_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub vehicle_type: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub wheelchair_accessible: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub bike_accessible: Option<String>,
}

/// Decode a JSON record array row by row.
///
/// Only a body that is not an array fails. A row that does not fit `T`
/// (an object where an id belongs, say) is skipped and counted.
pub fn decode_records<T: DeserializeOwned>(json: &str) -> Result<Converted<T>, serde_json::Error> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0;
    for row in rows {
        match serde_json::from_value(row) {
            Ok(record) => records.push(record),
            Err(_) => dropped += 1,
        }
    }
    Ok(Converted { records, dropped })
}

/// A JSON scalar that may be text or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.and_then(|v| match v {
        Scalar::Int(i) => Some(i.to_string()),
        Scalar::Float(f) => Some(f.to_string()),
        Scalar::Text(s) => Some(s),
        Scalar::Bool(b) => Some(b.to_string()),
    }))
}

fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.and_then(|v| match v {
        Scalar::Int(i) => Some(i as f64),
        Scalar::Float(f) => Some(f),
        Scalar::Text(s) => s.trim().parse().ok(),
        Scalar::Bool(_) => None,
    }))
}

fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.and_then(|v| match v {
        Scalar::Int(i) => Some(i),
        Scalar::Float(f) if f.fract() == 0.0 => Some(f as i64),
        Scalar::Float(_) => None,
        Scalar::Text(s) => s.trim().parse().ok(),
        Scalar::Bool(_) => None,
    }))
}

/// Epoch values above this are taken to be milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

fn opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let epoch_to_rfc3339 = |secs: i64| {
        let secs = if secs > EPOCH_MILLIS_THRESHOLD {
            secs / 1000
        } else {
            secs
        };
        DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
    };

    Ok(Option::<Scalar>::deserialize(d)?.and_then(|v| match v {
        Scalar::Int(i) => epoch_to_rfc3339(i),
        Scalar::Float(f) => epoch_to_rfc3339(f as i64),
        Scalar::Text(s) => Some(s),
        Scalar::Bool(_) => None,
    }))
}
