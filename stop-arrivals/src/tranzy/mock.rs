//! File-backed feed for running without API access.
//!
//! Serves record arrays from JSON files in a directory, using the same
//! layout as the live endpoints: `routes.json`, `stops.json`, `trips.json`,
//! `stop_times.json` and `vehicles.json`. Files are re-read on every fetch,
//! so editing `vehicles.json` while the server runs simulates movement.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::engine::TransitFeed;

use super::error::TranzyError;
use super::types::{RouteDto, StopDto, StopTimeDto, TripDto, VehicleDto, decode_records};

const REFERENCE_FILES: [&str; 4] = ["routes.json", "stops.json", "trips.json", "stop_times.json"];

/// Feed that serves data from JSON files.
#[derive(Debug, Clone)]
pub struct FileFeed {
    dir: PathBuf,
}

impl FileFeed {
    /// Create a feed over a directory.
    ///
    /// Fails if any of the four reference files is missing. A missing
    /// `vehicles.json` is allowed and means "no live vehicles".
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, TranzyError> {
        let dir = dir.as_ref().to_path_buf();
        for name in REFERENCE_FILES {
            if !dir.join(name).is_file() {
                return Err(TranzyError::Feed(format!(
                    "missing {} in {}",
                    name,
                    dir.display()
                )));
            }
        }
        Ok(Self { dir })
    }

    /// The directory being served.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, TranzyError> {
        let path = self.dir.join(name);
        let json = std::fs::read_to_string(&path)
            .map_err(|e| TranzyError::Feed(format!("failed to read {}: {}", path.display(), e)))?;
        let decoded = decode_records(&json)
            .map_err(|e| TranzyError::Feed(format!("failed to parse {}: {}", path.display(), e)))?;
        if decoded.dropped > 0 {
            warn!(file = name, dropped = decoded.dropped, "skipped undecodable records");
        }
        Ok(decoded.records)
    }
}

impl TransitFeed for FileFeed {
    async fn fetch_routes(&self) -> Result<Vec<RouteDto>, TranzyError> {
        self.load("routes.json")
    }

    async fn fetch_stops(&self) -> Result<Vec<StopDto>, TranzyError> {
        self.load("stops.json")
    }

    async fn fetch_trips(&self) -> Result<Vec<TripDto>, TranzyError> {
        self.load("trips.json")
    }

    async fn fetch_stop_times(&self) -> Result<Vec<StopTimeDto>, TranzyError> {
        self.load("stop_times.json")
    }

    async fn fetch_vehicles(&self) -> Result<Vec<VehicleDto>, TranzyError> {
        if !self.dir.join("vehicles.json").is_file() {
            return Ok(Vec::new());
        }
        self.load("vehicles.json")
    }
}
