//! Arrival engine configuration.

use std::time::Duration as StdDuration;

use chrono::Duration;

/// Tunable parameters for one arrival engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long fetched reference tables stay fresh.
    pub static_ttl: StdDuration,

    /// Live reports older than this are ignored (minutes).
    pub max_vehicle_age_mins: i64,
}

impl EngineConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(static_ttl: StdDuration, max_vehicle_age_mins: i64) -> Self {
        Self {
            static_ttl,
            max_vehicle_age_mins,
        }
    }

    /// Set the reference-data TTL.
    pub fn with_static_ttl(mut self, ttl: StdDuration) -> Self {
        self.static_ttl = ttl;
        self
    }

    /// Set the maximum live report age in minutes.
    pub fn with_max_vehicle_age_mins(mut self, mins: i64) -> Self {
        self.max_vehicle_age_mins = mins;
        self
    }

    /// Returns the maximum live report age as a Duration.
    pub fn max_vehicle_age(&self) -> Duration {
        Duration::minutes(self.max_vehicle_age_mins)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            static_ttl: StdDuration::from_secs(6 * 60 * 60),
            max_vehicle_age_mins: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.static_ttl, StdDuration::from_secs(21_600));
        assert_eq!(config.max_vehicle_age_mins, 10);
        assert_eq!(config.max_vehicle_age(), Duration::minutes(10));
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_static_ttl(StdDuration::from_secs(60))
            .with_max_vehicle_age_mins(5);

        assert_eq!(config.static_ttl, StdDuration::from_secs(60));
        assert_eq!(config.max_vehicle_age(), Duration::minutes(5));
    }
}
