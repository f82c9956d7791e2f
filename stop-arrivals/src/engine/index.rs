//! Schedule index over the four reference tables.
//!
//! Built wholesale from one fetch of routes, stops, trips and stop times.
//! The index is immutable once built; a refresh builds a new one.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{Route, Stop, StopTime, Trip};

/// One generation of indexed reference data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleIndex {
    routes_by_id: HashMap<String, Route>,
    stops_by_id: HashMap<String, Stop>,
    trips_by_id: HashMap<String, Trip>,

    /// stop_id -> stop times at that stop, ordered by scheduled time.
    /// Records without a usable time sort last; ties keep upstream order.
    stop_times_by_stop: HashMap<String, Vec<StopTime>>,

    /// trip_id -> stop_ids ordered by stop_sequence.
    trip_stop_order: HashMap<String, Vec<String>>,

    /// stop_id -> (trip_id -> position of the stop in that trip's order).
    trips_for_stop: HashMap<String, HashMap<String, usize>>,
}

impl ScheduleIndex {
    /// Build the index from validated records.
    ///
    /// Later duplicates of an identity key replace earlier ones.
    pub fn build(
        routes: Vec<Route>,
        stops: Vec<Stop>,
        trips: Vec<Trip>,
        stop_times: Vec<StopTime>,
    ) -> Self {
        let routes_by_id: HashMap<_, _> = routes
            .into_iter()
            .map(|r| (r.route_id.clone(), r))
            .collect();
        let stops_by_id: HashMap<_, _> = stops
            .into_iter()
            .map(|s| (s.stop_id.clone(), s))
            .collect();
        let trips_by_id: HashMap<_, _> = trips
            .into_iter()
            .map(|t| (t.trip_id.clone(), t))
            .collect();

        // Per-trip (sequence, stop) in upstream order, sorted stably below.
        let mut sequences: HashMap<String, Vec<(u32, String)>> = HashMap::new();
        for st in &stop_times {
            sequences
                .entry(st.trip_id.clone())
                .or_default()
                .push((st.stop_sequence, st.stop_id.clone()));
        }

        let trip_stop_order: HashMap<String, Vec<String>> = sequences
            .into_iter()
            .map(|(trip_id, mut visits)| {
                visits.sort_by_key(|(seq, _)| *seq);
                (trip_id, visits.into_iter().map(|(_, stop)| stop).collect())
            })
            .collect();

        let mut trips_for_stop: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (trip_id, ordered) in &trip_stop_order {
            for (idx, stop_id) in ordered.iter().enumerate() {
                // A looping trip visits a stop twice; the first visit wins.
                trips_for_stop
                    .entry(stop_id.clone())
                    .or_default()
                    .entry(trip_id.clone())
                    .or_insert(idx);
            }
        }

        let mut stop_times_by_stop: HashMap<String, Vec<StopTime>> = HashMap::new();
        for st in stop_times {
            stop_times_by_stop
                .entry(st.stop_id.clone())
                .or_default()
                .push(st);
        }
        for list in stop_times_by_stop.values_mut() {
            list.sort_by_cached_key(|st| st.service_time().map_or(u32::MAX, |t| t.as_secs()));
        }

        Self {
            routes_by_id,
            stops_by_id,
            trips_by_id,
            stop_times_by_stop,
            trip_stop_order,
            trips_for_stop,
        }
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes_by_id.get(route_id)
    }

    pub fn stop(&self, stop_id: &str) -> Option<&Stop> {
        self.stops_by_id.get(stop_id)
    }

    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips_by_id.get(trip_id)
    }

    /// Route owning a trip, if both resolve.
    pub fn route_for_trip(&self, trip_id: &str) -> Option<&Route> {
        self.route(&self.trip(trip_id)?.route_id)
    }

    /// Stop times at a stop, ordered by scheduled time.
    pub fn stop_times_at(&self, stop_id: &str) -> &[StopTime] {
        self.stop_times_by_stop
            .get(stop_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// A trip's stops in visiting order.
    pub fn trip_stops(&self, trip_id: &str) -> &[String] {
        self.trip_stop_order
            .get(trip_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `stop_id` within the trip's ordered stops.
    pub fn stop_position(&self, stop_id: &str, trip_id: &str) -> Option<usize> {
        self.trips_for_stop.get(stop_id)?.get(trip_id).copied()
    }

    /// Whether the trip calls at the stop.
    pub fn trip_serves_stop(&self, trip_id: &str, stop_id: &str) -> bool {
        self.stop_position(stop_id, trip_id).is_some()
    }

    /// Route ids with at least one trip calling at the stop.
    pub fn route_ids_serving(&self, stop_id: &str) -> BTreeSet<&str> {
        self.trips_for_stop
            .get(stop_id)
            .into_iter()
            .flat_map(|trips| trips.keys())
            .filter_map(|trip_id| self.trip(trip_id))
            .map(|trip| trip.route_id.as_str())
            .collect()
    }

    /// Routes with at least one trip calling at the stop, by short name.
    pub fn routes_serving(&self, stop_id: &str) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self
            .route_ids_serving(stop_id)
            .into_iter()
            .filter_map(|id| self.route(id))
            .collect();
        routes.sort_by(|a, b| {
            a.short_name
                .cmp(&b.short_name)
                .then_with(|| a.route_id.cmp(&b.route_id))
        });
        routes
    }

    /// Stops whose name contains `query` (case-insensitive), sorted by name.
    pub fn search_stops(&self, query: &str, limit: usize) -> Vec<&Stop> {
        let query = query.trim().to_lowercase();
        let mut matches: Vec<&Stop> = self
            .stops_by_id
            .values()
            .filter(|s| s.name.to_lowercase().contains(&query))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.stop_id.cmp(&b.stop_id)));
        matches.truncate(limit);
        matches
    }

    pub fn route_count(&self) -> usize {
        self.routes_by_id.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops_by_id.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips_by_id.len()
    }

    pub fn stop_time_count(&self) -> usize {
        self.stop_times_by_stop.values().map(Vec::len).sum()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::RouteType;

    /// Line 1: S1 -> S2 -> S3 -> S4, stop times deliberately out of order.
    fn line_one() -> ScheduleIndex {
        ScheduleIndex::build(
            vec![
                route("1", "1", RouteType::Tram),
                route("33", "33", RouteType::Bus),
            ],
            vec![
                stop("S1", "Gara de Nord", 45.750, 21.200),
                stop("S2", "Piata Victoriei", 45.752, 21.210),
                stop("S3", "Piata Maria", 45.754, 21.220),
                stop("S4", "Catedrala", 45.756, 21.230),
            ],
            vec![trip("T1", "1", "Catedrala"), trip("T2", "33", "Gara")],
            vec![
                stop_time("T1", "S3", 3, Some("08:34:00")),
                stop_time("T1", "S1", 1, Some("08:30:00")),
                stop_time("T1", "S4", 4, Some("08:36:00")),
                stop_time("T1", "S2", 2, Some("08:32:00")),
                stop_time("T2", "S2", 1, Some("08:10:00")),
            ],
        )
    }

    #[test]
    fn empty_index() {
        let index = ScheduleIndex::build(vec![], vec![], vec![], vec![]);
        assert_eq!(index.route_count(), 0);
        assert!(index.stop_times_at("S1").is_empty());
        assert!(index.trip_stops("T1").is_empty());
        assert_eq!(index.stop_position("S1", "T1"), None);
    }

    #[test]
    fn identity_maps() {
        let index = line_one();
        assert_eq!(index.route_count(), 2);
        assert_eq!(index.stop_count(), 4);
        assert_eq!(index.trip_count(), 2);
        assert_eq!(index.stop_time_count(), 5);
        assert_eq!(index.stop("S2").unwrap().name, "Piata Victoriei");
        assert_eq!(index.route_for_trip("T2").unwrap().short_name, "33");
    }

    #[test]
    fn trip_order_follows_stop_sequence() {
        let index = line_one();
        assert_eq!(index.trip_stops("T1"), ["S1", "S2", "S3", "S4"]);
    }

    #[test]
    fn reverse_index_gives_position_in_trip() {
        let index = line_one();
        assert_eq!(index.stop_position("S1", "T1"), Some(0));
        assert_eq!(index.stop_position("S3", "T1"), Some(2));
        assert_eq!(index.stop_position("S2", "T2"), Some(0));
        assert_eq!(index.stop_position("S3", "T2"), None);
        assert!(index.trip_serves_stop("T1", "S4"));
    }

    #[test]
    fn equal_sequences_keep_upstream_order() {
        let index = ScheduleIndex::build(
            vec![],
            vec![],
            vec![],
            vec![
                stop_time("T1", "B", 1, None),
                stop_time("T1", "A", 1, None),
                stop_time("T1", "C", 0, None),
            ],
        );
        assert_eq!(index.trip_stops("T1"), ["C", "B", "A"]);
    }

    #[test]
    fn stop_times_ordered_by_time_with_unparseable_last() {
        let index = ScheduleIndex::build(
            vec![],
            vec![],
            vec![],
            vec![
                stop_time("T3", "S", 1, None),
                stop_time("T2", "S", 1, Some("25:00:00")),
                stop_time("T1", "S", 1, Some("09:00:00")),
                stop_time("T4", "S", 1, Some("09:00:00")),
            ],
        );
        let trips: Vec<_> = index
            .stop_times_at("S")
            .iter()
            .map(|st| st.trip_id.as_str())
            .collect();
        assert_eq!(trips, ["T1", "T4", "T2", "T3"]);
    }

    #[test]
    fn looping_trip_keeps_first_visit() {
        let index = ScheduleIndex::build(
            vec![],
            vec![],
            vec![],
            vec![
                stop_time("L", "A", 1, None),
                stop_time("L", "B", 2, None),
                stop_time("L", "A", 3, None),
            ],
        );
        assert_eq!(index.stop_position("A", "L"), Some(0));
    }

    #[test]
    fn routes_serving_stop() {
        let index = line_one();
        let names: Vec<_> = index
            .routes_serving("S2")
            .iter()
            .map(|r| r.short_name.as_str())
            .collect();
        assert_eq!(names, ["1", "33"]);
        assert!(index.routes_serving("S9").is_empty());
        assert!(index.route_ids_serving("S4").contains("1"));
    }

    #[test]
    fn search_stops_by_name() {
        let index = line_one();
        let found: Vec<_> = index
            .search_stops("piata", 10)
            .iter()
            .map(|s| s.stop_id.as_str())
            .collect();
        assert_eq!(found, ["S3", "S2"]);

        assert_eq!(index.search_stops("piata", 1).len(), 1);
        assert!(index.search_stops("airport", 10).is_empty());
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let index = ScheduleIndex::build(
            vec![route("1", "old", RouteType::Bus), route("1", "new", RouteType::Tram)],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(index.route_count(), 1);
        assert_eq!(index.route("1").unwrap().short_name, "new");
    }
}
