//! Domain types for stop arrival estimation.
//!
//! This module contains validated transit records. Identity fields are
//! enforced at construction time by the conversion layer, so code that
//! receives these types can rely on them.

mod model;
mod route_type;
mod time;

pub use model::{Route, Stop, StopTime, Trip, VehicleReport};
pub use route_type::{RouteType, UnknownRouteType, parse_route_types};
pub use time::{ServiceTime, TimeError};
