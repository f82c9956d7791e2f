//! Departure-board views over a ranked arrival list.
//!
//! Every function here is a pure mapping of the engine's output; none of
//! them reorder arrivals within a route.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::engine::Arrival;

/// What to show for the next arrival.
///
/// Serializes as `{"value": 5, "unit": "min"}`, or
/// `{"value": "approaching", "unit": null}` when nothing is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Minutes(u32),
    Stops(u32),
    /// Live, but neither an ETA nor a stop count is known.
    Approaching,
}

impl Countdown {
    pub fn of(arrival: &Arrival) -> Self {
        match (arrival.eta_minutes, arrival.stops_away) {
            (Some(eta), _) => Countdown::Minutes(eta),
            (None, Some(stops)) => Countdown::Stops(stops),
            (None, None) => Countdown::Approaching,
        }
    }

    /// Unit label, if the countdown is numeric.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Countdown::Minutes(_) => Some("min"),
            Countdown::Stops(_) => Some("stops"),
            Countdown::Approaching => None,
        }
    }
}

impl Serialize for Countdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Countdown", 2)?;
        match self {
            Countdown::Minutes(n) | Countdown::Stops(n) => state.serialize_field("value", n)?,
            Countdown::Approaching => state.serialize_field("value", "approaching")?,
        }
        state.serialize_field("unit", &self.unit())?;
        state.end()
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Countdown::Minutes(n) => write!(f, "{n} min"),
            Countdown::Stops(1) => write!(f, "1 stop"),
            Countdown::Stops(n) => write!(f, "{n} stops"),
            Countdown::Approaching => write!(f, "approaching"),
        }
    }
}

/// Headline entry: the first ranked arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextArrival {
    pub route_short_name: String,
    pub destination: Option<String>,
    pub countdown: Countdown,
    pub is_realtime: bool,
}

pub fn next_arrival(arrivals: &[Arrival]) -> Option<NextArrival> {
    let first = arrivals.first()?;
    Some(NextArrival {
        route_short_name: first.route_short_name.clone(),
        destination: first.destination.clone(),
        countdown: Countdown::of(first),
        is_realtime: first.is_realtime,
    })
}

/// Arrivals keyed by route short name, each list in rank order.
pub fn group_by_route(arrivals: &[Arrival]) -> BTreeMap<String, Vec<Arrival>> {
    let mut groups: BTreeMap<String, Vec<Arrival>> = BTreeMap::new();
    for arrival in arrivals {
        groups
            .entry(arrival.route_short_name.clone())
            .or_default()
            .push(arrival.clone());
    }
    groups
}

/// Per-route headline for a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub next_eta: Option<u32>,
    pub next_stops_away: Option<u32>,
    pub route_type_label: String,
    pub destination: Option<String>,
    /// Number of arrivals listed for the route.
    pub vehicle_count: usize,
}

pub fn route_summaries(arrivals: &[Arrival]) -> BTreeMap<String, RouteSummary> {
    group_by_route(arrivals)
        .into_iter()
        .filter_map(|(name, group)| {
            let first = group.first()?;
            let summary = RouteSummary {
                next_eta: first.eta_minutes,
                next_stops_away: first.stops_away,
                route_type_label: first.route_type_label.clone(),
                destination: first.destination.clone(),
                vehicle_count: group.len(),
            };
            Some((name, summary))
        })
        .collect()
}

/// Distinct non-empty route short names, sorted.
pub fn route_names(arrivals: &[Arrival]) -> Vec<String> {
    group_by_route(arrivals)
        .into_keys()
        .filter(|name| !name.is_empty())
        .collect()
}

/// Keep at most `max` arrivals per route, preserving overall order.
pub fn cap_per_route(arrivals: &[Arrival], max: usize) -> Vec<Arrival> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    arrivals
        .iter()
        .filter(|a| {
            let count = seen.entry(a.route_short_name.as_str()).or_default();
            *count += 1;
            *count <= max
        })
        .cloned()
        .collect()
}
