//! GTFS route types.
//!
//! The upstream reports a route's vehicle mode as an integer code from the
//! basic GTFS vocabulary. Only the codes below are recognised; anything else
//! is rejected at parse time so filters never silently match garbage.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Error returned for a route type code outside the supported vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route type: {0}")]
pub struct UnknownRouteType(pub String);

/// Vehicle mode of a route, keyed by its GTFS `route_type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteType {
    Tram,
    Metro,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Trolleybus,
    Monorail,
}

impl RouteType {
    /// Every supported route type, in code order.
    pub const ALL: [RouteType; 10] = [
        RouteType::Tram,
        RouteType::Metro,
        RouteType::Rail,
        RouteType::Bus,
        RouteType::Ferry,
        RouteType::CableTram,
        RouteType::AerialLift,
        RouteType::Funicular,
        RouteType::Trolleybus,
        RouteType::Monorail,
    ];

    /// Look up a route type by its GTFS code.
    ///
    /// # Examples
    ///
    /// ```
    /// use stop_arrivals::domain::RouteType;
    ///
    /// assert_eq!(RouteType::from_code(0), Some(RouteType::Tram));
    /// assert_eq!(RouteType::from_code(11), Some(RouteType::Trolleybus));
    /// assert_eq!(RouteType::from_code(8), None);
    /// ```
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RouteType::Tram),
            1 => Some(RouteType::Metro),
            2 => Some(RouteType::Rail),
            3 => Some(RouteType::Bus),
            4 => Some(RouteType::Ferry),
            5 => Some(RouteType::CableTram),
            6 => Some(RouteType::AerialLift),
            7 => Some(RouteType::Funicular),
            11 => Some(RouteType::Trolleybus),
            12 => Some(RouteType::Monorail),
            _ => None,
        }
    }

    /// The GTFS code for this route type.
    pub fn code(self) -> u8 {
        match self {
            RouteType::Tram => 0,
            RouteType::Metro => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableTram => 5,
            RouteType::AerialLift => 6,
            RouteType::Funicular => 7,
            RouteType::Trolleybus => 11,
            RouteType::Monorail => 12,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            RouteType::Tram => "tram",
            RouteType::Metro => "metro",
            RouteType::Rail => "rail",
            RouteType::Bus => "bus",
            RouteType::Ferry => "ferry",
            RouteType::CableTram => "cable tram",
            RouteType::AerialLift => "aerial lift",
            RouteType::Funicular => "funicular",
            RouteType::Trolleybus => "trolleybus",
            RouteType::Monorail => "monorail",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a numeric code ("0", " 11 ").
impl FromStr for RouteType {
    type Err = UnknownRouteType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(RouteType::from_code)
            .ok_or_else(|| UnknownRouteType(s.to_string()))
    }
}

impl Serialize for RouteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Parse a comma-separated list of route type codes, e.g. `"0,3,11"`.
///
/// Empty segments are ignored; an unknown code fails the whole list.
pub fn parse_route_types(s: &str) -> Result<Vec<RouteType>, UnknownRouteType> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}
