//! In-memory feed for engine and cache tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::tranzy::{RouteDto, StopDto, StopTimeDto, TranzyError, TripDto, VehicleDto};

use super::TransitFeed;

type ErrorFactory = Box<dyn Fn() -> TranzyError + Send + Sync>;

/// Feed over fixed tables that counts fetches and can be told to fail.
///
/// The sample network:
/// - tram `1` (trip `1_1`): Gara de Nord 08:30, Piata Victoriei 08:32,
///   Piata Maria 08:34, Catedrala 08:36
/// - bus `33` (trip `33_1`): Piata Victoriei 08:40, Piata Maria 08:45
pub struct MemoryFeed {
    routes: Vec<RouteDto>,
    stops: Vec<StopDto>,
    trips: Vec<TripDto>,
    stop_times: Mutex<Vec<StopTimeDto>>,
    vehicles: Mutex<Vec<VehicleDto>>,
    static_error: Mutex<Option<ErrorFactory>>,
    vehicle_error: Mutex<Option<ErrorFactory>>,
    static_delay: Mutex<Option<Duration>>,
    static_fetches: AtomicUsize,
    vehicle_fetches: AtomicUsize,
}

pub fn route_dto(id: &str, short: &str, long: &str, route_type: i64) -> RouteDto {
    RouteDto {
        route_id: Some(id.into()),
        route_short_name: Some(short.into()),
        route_long_name: Some(long.into()),
        route_type: Some(route_type),
    }
}

pub fn stop_dto(id: &str, name: &str, lat: f64, lon: f64) -> StopDto {
    StopDto {
        stop_id: Some(id.into()),
        stop_name: Some(name.into()),
        stop_lat: Some(lat),
        stop_lon: Some(lon),
    }
}

pub fn trip_dto(id: &str, route_id: &str, headsign: &str) -> TripDto {
    TripDto {
        trip_id: Some(id.into()),
        route_id: Some(route_id.into()),
        trip_headsign: Some(headsign.into()),
    }
}

pub fn stop_time_dto(trip_id: &str, stop_id: &str, seq: i64, time: &str) -> StopTimeDto {
    StopTimeDto {
        trip_id: Some(trip_id.into()),
        stop_id: Some(stop_id.into()),
        stop_sequence: Some(seq.to_string()),
        arrival_time: Some(time.into()),
        departure_time: None,
    }
}

/// A vehicle report at a position, timestamped in RFC 3339.
pub fn vehicle_dto(
    id: &str,
    trip_id: Option<&str>,
    route_id: &str,
    vehicle_type: i64,
    position: (f64, f64),
    timestamp: &str,
) -> VehicleDto {
    VehicleDto {
        id: Some(id.into()),
        label: Some(format!("TM{id}")),
        latitude: Some(position.0),
        longitude: Some(position.1),
        timestamp: Some(timestamp.into()),
        speed: Some(18.0),
        trip_id: trip_id.map(Into::into),
        route_id: Some(route_id.into()),
        vehicle_type: Some(vehicle_type),
        ..VehicleDto::default()
    }
}

impl MemoryFeed {
    pub fn sample() -> Self {
        Self {
            routes: vec![
                route_dto("1", "1", "Gara de Nord - Catedrala", 0),
                route_dto("33", "33", "Gara - Aeroport", 3),
            ],
            stops: vec![
                stop_dto("10", "Gara de Nord", 45.750, 21.200),
                stop_dto("11", "Piata Victoriei", 45.752, 21.210),
                stop_dto("12", "Piata Maria", 45.754, 21.220),
                stop_dto("13", "Catedrala", 45.756, 21.230),
            ],
            trips: vec![
                trip_dto("1_1", "1", "Catedrala"),
                trip_dto("33_1", "33", "Aeroport"),
            ],
            stop_times: Mutex::new(vec![
                stop_time_dto("1_1", "10", 1, "08:30:00"),
                stop_time_dto("1_1", "11", 2, "08:32:00"),
                stop_time_dto("1_1", "12", 3, "08:34:00"),
                stop_time_dto("1_1", "13", 4, "08:36:00"),
                stop_time_dto("33_1", "11", 1, "08:40:00"),
                stop_time_dto("33_1", "12", 2, "08:45:00"),
            ]),
            vehicles: Mutex::new(Vec::new()),
            static_error: Mutex::new(None),
            vehicle_error: Mutex::new(None),
            static_delay: Mutex::new(None),
            static_fetches: AtomicUsize::new(0),
            vehicle_fetches: AtomicUsize::new(0),
        }
    }

    pub fn sample_stop_time_count() -> usize {
        6
    }

    /// Number of full reference-table fetches so far.
    pub fn static_fetches(&self) -> usize {
        self.static_fetches.load(Ordering::SeqCst)
    }

    pub fn vehicle_fetches(&self) -> usize {
        self.vehicle_fetches.load(Ordering::SeqCst)
    }

    pub fn set_vehicles(&self, vehicles: Vec<VehicleDto>) {
        *self.vehicles.lock().unwrap() = vehicles;
    }

    pub fn push_stop_time(&self, stop_time: StopTimeDto) {
        self.stop_times.lock().unwrap().push(stop_time);
    }

    /// Make every reference-table fetch fail from now on.
    pub fn fail_with(&self, error: impl Fn() -> TranzyError + Send + Sync + 'static) {
        *self.static_error.lock().unwrap() = Some(Box::new(error));
    }

    /// Make every vehicle fetch fail from now on.
    pub fn fail_vehicles_with(&self, error: impl Fn() -> TranzyError + Send + Sync + 'static) {
        *self.vehicle_error.lock().unwrap() = Some(Box::new(error));
    }

    /// Make each reference-table fetch take at least `delay`.
    pub fn delay_static_fetches(&self, delay: Duration) {
        *self.static_delay.lock().unwrap() = Some(delay);
    }

    pub fn recover(&self) {
        *self.static_error.lock().unwrap() = None;
        *self.vehicle_error.lock().unwrap() = None;
    }

    fn static_result<T: Clone>(&self, rows: &[T]) -> Result<Vec<T>, TranzyError> {
        match self.static_error.lock().unwrap().as_ref() {
            Some(make) => Err(make()),
            None => Ok(rows.to_vec()),
        }
    }
}

impl TransitFeed for MemoryFeed {
    async fn fetch_routes(&self) -> Result<Vec<RouteDto>, TranzyError> {
        self.static_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.static_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.static_result(&self.routes)
    }

    async fn fetch_stops(&self) -> Result<Vec<StopDto>, TranzyError> {
        self.static_result(&self.stops)
    }

    async fn fetch_trips(&self) -> Result<Vec<TripDto>, TranzyError> {
        self.static_result(&self.trips)
    }

    async fn fetch_stop_times(&self) -> Result<Vec<StopTimeDto>, TranzyError> {
        let rows = self.stop_times.lock().unwrap().clone();
        self.static_result(&rows)
    }

    async fn fetch_vehicles(&self) -> Result<Vec<VehicleDto>, TranzyError> {
        self.vehicle_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(make) = self.vehicle_error.lock().unwrap().as_ref() {
            return Err(make());
        }
        Ok(self.vehicles.lock().unwrap().clone())
    }
}
