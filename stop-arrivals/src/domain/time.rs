//! Schedule time handling for GTFS stop times.
//!
//! GTFS provides stop times as "HH:MM:SS" strings measured from midnight of
//! the service day. Hours may exceed 23 for trips that run past midnight, so
//! "25:10:00" is 01:10 on the following calendar day.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

const SECS_PER_MINUTE: u32 = 60;
const SECS_PER_HOUR: u32 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of the service day, possibly past midnight.
///
/// # Examples
///
/// ```
/// use stop_arrivals::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(t.days(), 1);
/// assert_eq!(t.hour(), 1);
/// assert_eq!(t.minute(), 10);
/// assert_eq!(t.to_string(), "25:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime {
    secs: u32,
}

impl ServiceTime {
    /// Create a service time from components. `hour` may exceed 23.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if minute >= 60 || second >= 60 {
            return None;
        }
        let secs = hour
            .checked_mul(SECS_PER_HOUR)?
            .checked_add(minute * SECS_PER_MINUTE + second)?;
        Some(Self { secs })
    }

    /// Parse "HH:MM:SS" or "HH:MM" (seconds default to zero).
    ///
    /// The hour field is one to three digits and is not capped at 23.
    ///
    /// ```
    /// use stop_arrivals::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse("08:30:00").is_ok());
    /// assert!(ServiceTime::parse("08:30").is_ok());
    /// assert!(ServiceTime::parse("24:00:00").is_ok());
    ///
    /// assert!(ServiceTime::parse("").is_err());
    /// assert!(ServiceTime::parse("08:60:00").is_err());
    /// assert!(ServiceTime::parse("8h30").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeError::new("empty time"));
        }

        let mut parts = s.split(':');
        let hour_part = parts.next().unwrap_or_default();
        let minute_part = parts
            .next()
            .ok_or_else(|| TimeError::new("expected HH:MM[:SS] format"))?;
        let second_part = parts.next();
        if parts.next().is_some() {
            return Err(TimeError::new("too many fields"));
        }

        if hour_part.is_empty() || hour_part.len() > 3 {
            return Err(TimeError::new("hour must be 1-3 digits"));
        }
        let hour = parse_digits(hour_part).ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minute =
            parse_two_digits(minute_part).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = match second_part {
            Some(sec) => {
                parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?
            }
            None => 0,
        };
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Self::from_hms(hour, minute, second).ok_or_else(|| TimeError::new("time out of range"))
    }

    /// Whole days past the service day's midnight.
    pub fn days(&self) -> u32 {
        self.secs / SECS_PER_DAY
    }

    /// Hour within its calendar day (0-23).
    pub fn hour(&self) -> u32 {
        (self.secs % SECS_PER_DAY) / SECS_PER_HOUR
    }

    /// Minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.secs % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    /// Second (0-59).
    pub fn second(&self) -> u32 {
        self.secs % SECS_PER_MINUTE
    }

    /// Seconds since the service day's midnight.
    pub fn as_secs(&self) -> u32 {
        self.secs
    }

    /// The wall-clock instant of this time on the given service day.
    ///
    /// ```
    /// use stop_arrivals::domain::ServiceTime;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let t = ServiceTime::parse("25:10:00").unwrap();
    /// let instant = t.on(day);
    /// assert_eq!(instant.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    /// assert_eq!(instant.time().to_string(), "01:10:00");
    /// ```
    pub fn on(&self, service_day: NaiveDate) -> NaiveDateTime {
        service_day.and_time(chrono::NaiveTime::MIN) + Duration::seconds(i64::from(self.secs))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.secs / SECS_PER_HOUR,
            self.minute(),
            self.second()
        )
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    parse_digits(s)
}

fn parse_digits(s: &str) -> Option<u32> {
    s.chars()
        .try_fold(0u32, |acc, c| Some(acc * 10 + c.to_digit(10)?))
}
