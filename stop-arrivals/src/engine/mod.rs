//! Arrival estimation.
//!
//! Fuses the static schedule with live vehicle reports into a ranked list
//! of upcoming arrivals at one stop:
//! - [`ScheduleIndex`]: lookup tables built from the reference data
//! - [`nearest_stop_index`]: position along a trip from raw coordinates
//! - [`is_fresh`]: which live reports are recent enough to trust
//! - [`fuse`] and [`rank_arrivals`]: candidate assembly and ordering
//! - [`ArrivalsEngine`]: ties these to a [`TransitFeed`] and a schedule cache

mod arrivals;
mod config;
mod feed;
mod freshness;
mod fusion;
mod geo;
mod index;
mod rank;

#[cfg(test)]
pub(crate) mod testing;

pub use arrivals::ArrivalsEngine;
pub use config::EngineConfig;
pub use feed::TransitFeed;
pub use freshness::{is_fresh, parse_timestamp};
pub use fusion::{ACCEPT_AHEAD_MINS, ACCEPT_PAST_MINS, Arrival, FusionParams, fuse, schedule_eta};
pub use geo::nearest_stop_index;
pub use index::ScheduleIndex;
pub use rank::rank_arrivals;
