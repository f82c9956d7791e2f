//! Fusion of scheduled stop times with live vehicle reports.
//!
//! One fusion pass is a straight-line transformation:
//! 1. Accept scheduled visits whose ETA falls in the acceptance window
//! 2. Enrich trip-backed candidates with fresh vehicle reports, and add
//!    unscheduled vehicles running on a serving route
//! 3. Drop candidates that carry no signal, then rank
//!
//! Each record is accepted or skipped by an explicit decision; nothing here
//! fails. Candidates live only for the duration of one call.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::domain::{Route, RouteType, ServiceTime, StopTime, Trip, VehicleReport};

use super::freshness::is_fresh;
use super::geo::nearest_stop_index;
use super::index::ScheduleIndex;
use super::rank::rank_arrivals;

/// How far in the past a scheduled visit may be and still be shown (minutes).
pub const ACCEPT_PAST_MINS: i64 = 5;

/// How far ahead a scheduled visit may be and still be shown (minutes).
pub const ACCEPT_AHEAD_MINS: i64 = 180;

/// One upcoming arrival at the stop.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Arrival {
    pub route_id: Option<String>,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_type: Option<RouteType>,
    pub route_type_label: String,
    pub trip_id: Option<String>,
    /// Headsign of the trip.
    pub destination: Option<String>,
    pub eta_minutes: Option<u32>,
    pub stops_away: Option<u32>,
    pub is_realtime: bool,
    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    /// Scheduled time at this stop as published, e.g. "08:30:00".
    pub scheduled_time: Option<String>,
    /// Timestamp of the vehicle report used.
    pub timestamp: Option<String>,
    pub wheelchair_accessible: Option<String>,
    pub bike_accessible: Option<String>,
}

impl Arrival {
    /// Arrival carrying route and trip metadata only.
    fn from_route(route: Option<&Route>, trip: Option<&Trip>) -> Self {
        let route_type = route.and_then(|r| r.route_type);
        let short_name = route
            .map(|r| r.short_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "?".to_string());
        let long_name = route.map(|r| r.long_name.clone()).unwrap_or_default();
        let destination = trip
            .and_then(|t| t.headsign.clone())
            .filter(|h| !h.is_empty());

        Self {
            route_id: route
                .map(|r| r.route_id.clone())
                .or_else(|| trip.map(|t| t.route_id.clone())),
            route_short_name: short_name,
            route_long_name: long_name,
            route_type,
            route_type_label: route_type.map_or("unknown", RouteType::label).to_string(),
            trip_id: trip.map(|t| t.trip_id.clone()),
            destination,
            ..Self::default()
        }
    }

    /// Copy vehicle identity and telemetry onto this arrival.
    fn attach_vehicle(&mut self, report: &VehicleReport) {
        self.is_realtime = true;
        self.vehicle_id = report.id.clone();
        self.vehicle_label = report.label.clone();
        self.latitude = report.lat;
        self.longitude = report.lon;
        self.speed = report.speed;
        self.timestamp = report.timestamp.clone();
        self.wheelchair_accessible = report.wheelchair_accessible.clone();
        self.bike_accessible = report.bike_accessible.clone();
    }

    /// Whether the arrival carries any usable signal.
    fn has_signal(&self) -> bool {
        self.eta_minutes.is_some() || self.stops_away.is_some() || self.is_realtime
    }
}

/// Inputs that stay fixed for one fusion pass.
#[derive(Debug, Clone, Copy)]
pub struct FusionParams<'a> {
    pub stop_id: &'a str,
    /// Only these route types, when set.
    pub vehicle_types: Option<&'a [RouteType]>,
    /// The local wall clock; the schedule is read in this offset.
    pub now: DateTime<FixedOffset>,
    pub max_vehicle_age: Duration,
}

impl FusionParams<'_> {
    fn type_allowed(&self, route_type: Option<RouteType>) -> bool {
        match self.vehicle_types {
            None => true,
            Some(allowed) => route_type.is_some_and(|rt| allowed.contains(&rt)),
        }
    }
}

/// ETA in minutes for a scheduled time, if inside the acceptance window.
///
/// The schedule is anchored at local midnight of `now`'s date. Returns
/// `max(0, round(diff))` for `-5 <= diff <= 180` minutes, otherwise `None`.
/// Half minutes round to even.
pub fn schedule_eta(time: ServiceTime, now: &DateTime<FixedOffset>) -> Option<u32> {
    let now_local = now.naive_local();
    let scheduled = time.on(now_local.date());
    let diff_ms = scheduled.signed_duration_since(now_local).num_milliseconds();
    let diff_minutes = diff_ms as f64 / 60_000.0;

    if diff_minutes < -(ACCEPT_PAST_MINS as f64) || diff_minutes > ACCEPT_AHEAD_MINS as f64 {
        return None;
    }
    Some(diff_minutes.round_ties_even().max(0.0) as u32)
}

/// Candidates in discovery order, addressable by key.
#[derive(Default)]
struct Candidates {
    slots: Vec<Option<Arrival>>,
    by_key: HashMap<String, usize>,
}

impl Candidates {
    fn get(&self, key: &str) -> Option<&Arrival> {
        let idx = *self.by_key.get(key)?;
        self.slots[idx].as_ref()
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Arrival> {
        let idx = *self.by_key.get(key)?;
        self.slots[idx].as_mut()
    }

    fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    fn insert(&mut self, key: String, arrival: Arrival) {
        self.by_key.insert(key, self.slots.len());
        self.slots.push(Some(arrival));
    }

    /// Discard a candidate. Its key stays reserved for this pass.
    fn discard(&mut self, key: &str) {
        if let Some(&idx) = self.by_key.get(key) {
            self.slots[idx] = None;
        }
    }

    fn into_arrivals(self) -> Vec<Arrival> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Key for an unscheduled live vehicle.
fn vehicle_key(identity: &str) -> String {
    format!("vehicle:{identity}")
}

/// Fuse the schedule at one stop with live reports into a ranked list.
pub fn fuse(
    index: &ScheduleIndex,
    vehicles: &[VehicleReport],
    params: &FusionParams<'_>,
) -> Vec<Arrival> {
    let stop_times = index.stop_times_at(params.stop_id);
    if stop_times.is_empty() {
        return Vec::new();
    }

    let mut candidates = schedule_candidates(index, stop_times, params);
    enrich_with_vehicles(index, stop_times, vehicles, params, &mut candidates);

    let arrivals = candidates
        .into_arrivals()
        .into_iter()
        .filter(Arrival::has_signal)
        .collect();
    rank_arrivals(arrivals)
}

/// Scheduled visits inside the acceptance window, one per trip.
fn schedule_candidates(
    index: &ScheduleIndex,
    stop_times: &[StopTime],
    params: &FusionParams<'_>,
) -> Candidates {
    let mut candidates = Candidates::default();

    for st in stop_times {
        if candidates.contains(&st.trip_id) {
            continue;
        }
        let Some(trip) = index.trip(&st.trip_id) else {
            continue;
        };
        let route = index.route(&trip.route_id);
        if !params.type_allowed(route.and_then(|r| r.route_type)) {
            continue;
        }
        let Some(eta) = st
            .service_time()
            .and_then(|time| schedule_eta(time, &params.now))
        else {
            continue;
        };

        let mut arrival = Arrival::from_route(route, Some(trip));
        arrival.eta_minutes = Some(eta);
        arrival.scheduled_time = st.time_text.clone();
        candidates.insert(st.trip_id.clone(), arrival);
    }

    candidates
}

/// The effective type of a report: its own, else its route's.
fn report_type(index: &ScheduleIndex, report: &VehicleReport) -> Option<RouteType> {
    report
        .vehicle_type
        .or_else(|| {
            report
                .route_id
                .as_deref()
                .and_then(|id| index.route(id))
                .and_then(|r| r.route_type)
        })
        .or_else(|| {
            report
                .trip_id
                .as_deref()
                .and_then(|id| index.route_for_trip(id))
                .and_then(|r| r.route_type)
        })
}

fn enrich_with_vehicles(
    index: &ScheduleIndex,
    stop_times: &[StopTime],
    vehicles: &[VehicleReport],
    params: &FusionParams<'_>,
    candidates: &mut Candidates,
) {
    let now_utc = params.now.to_utc();
    let serving_routes: BTreeSet<&str> = index.route_ids_serving(params.stop_id);
    // Trips that already have a vehicle attached in this pass.
    let mut tracked: BTreeSet<&str> = BTreeSet::new();

    for report in vehicles {
        if !is_fresh(report, now_utc, params.max_vehicle_age) {
            continue;
        }
        if !params.type_allowed(report_type(index, report)) {
            continue;
        }

        match report.trip_id.as_deref() {
            Some(trip_id) => {
                let Some(our_index) = index.stop_position(params.stop_id, trip_id) else {
                    continue;
                };
                let Some(trip) = index.trip(trip_id) else {
                    continue;
                };
                if !tracked.insert(trip_id) {
                    continue;
                }

                let vehicle_index =
                    nearest_stop_index(index, report.position(), index.trip_stops(trip_id));
                let stops_away = vehicle_index.map(|v| our_index as i64 - v as i64);
                let has_eta = candidates
                    .get(trip_id)
                    .is_some_and(|a| a.eta_minutes.is_some());

                let stops_away = match stops_away {
                    // Already past this stop with no upcoming scheduled visit.
                    Some(n) if n < -1 && !has_eta => {
                        candidates.discard(trip_id);
                        continue;
                    }
                    Some(n) if n < -1 => None,
                    other => other.map(|n| n.max(0) as u32),
                };

                if !candidates.contains(trip_id) {
                    let mut arrival = Arrival::from_route(index.route(&trip.route_id), Some(trip));
                    arrival.scheduled_time = stop_times
                        .iter()
                        .find(|st| st.trip_id == trip_id)
                        .and_then(|st| st.time_text.clone());
                    candidates.insert(trip_id.to_string(), arrival);
                }
                if let Some(arrival) = candidates.get_mut(trip_id) {
                    arrival.stops_away = stops_away;
                    arrival.attach_vehicle(report);
                }
            }
            None => {
                let Some(route_id) = report.route_id.as_deref() else {
                    continue;
                };
                if !serving_routes.contains(route_id) {
                    continue;
                }
                let Some(identity) = report.identity() else {
                    continue;
                };
                let key = vehicle_key(identity);
                if candidates.contains(&key) {
                    continue;
                }

                let mut arrival = Arrival::from_route(index.route(route_id), None);
                arrival.route_id = Some(route_id.to_string());
                arrival.attach_vehicle(report);
                candidates.insert(key, arrival);
            }
        }
    }
}
