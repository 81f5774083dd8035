//! Debounce thresholds and their builder.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default widening of every zone radius, in meters.
pub const DEFAULT_BUFFER_METERS: f64 = 10.0;
/// Default number of agreeing readings needed to confirm a change.
pub const DEFAULT_REQUIRED_READINGS: u32 = 3;
/// Default cooldown between confirmed changes.
pub const DEFAULT_MINIMUM_TRANSITION_INTERVAL: Duration = Duration::from_millis(30_000);
/// Default number of transitions retained per device.
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Thresholds applied by the transition debouncer.
///
/// On the wire the interval is expressed in milliseconds:
///
/// ```rust
/// use zonewatch::debounce::DebounceConfig;
/// use std::time::Duration;
///
/// let config = DebounceConfig::from_json(r#"{
///     "buffer_meters": 15.0,
///     "required_consecutive_readings": 2,
///     "minimum_transition_interval_ms": 5000
/// }"#).unwrap();
///
/// assert_eq!(config.minimum_transition_interval, Duration::from_secs(5));
/// assert_eq!(config.history_limit, 32);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub buffer_meters: f64,
    pub required_consecutive_readings: u32,
    #[serde(rename = "minimum_transition_interval_ms", with = "duration_ms")]
    pub minimum_transition_interval: Duration,
    pub history_limit: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            buffer_meters: DEFAULT_BUFFER_METERS,
            required_consecutive_readings: DEFAULT_REQUIRED_READINGS,
            minimum_transition_interval: DEFAULT_MINIMUM_TRANSITION_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl DebounceConfig {
    pub fn builder() -> DebounceConfigBuilder {
        DebounceConfigBuilder::new()
    }

    /// Reject thresholds that would make the debouncer meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.buffer_meters.is_finite() || self.buffer_meters < 0.0 {
            return Err(ConfigError::InvalidBuffer(self.buffer_meters));
        }
        if self.required_consecutive_readings == 0 {
            return Err(ConfigError::ZeroReadings);
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Fluent builder for [`DebounceConfig`]
pub struct DebounceConfigBuilder {
    config: DebounceConfig,
}

impl DebounceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DebounceConfig::default(),
        }
    }

    /// Set extra radius added to every zone
    pub fn buffer_meters(mut self, meters: f64) -> Self {
        self.config.buffer_meters = meters;
        self
    }

    /// Set agreeing readings required to confirm a change
    pub fn required_consecutive_readings(mut self, n: u32) -> Self {
        self.config.required_consecutive_readings = n;
        self
    }

    /// Set cooldown between confirmed changes
    pub fn minimum_transition_interval(mut self, interval: Duration) -> Self {
        self.config.minimum_transition_interval = interval;
        self
    }

    /// Set transitions retained per device
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<DebounceConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for DebounceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
