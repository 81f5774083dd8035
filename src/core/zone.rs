//! Circular safe zones attached to a device.

use super::device::DeviceId;
use super::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a safe zone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafeZoneId(String);

impl SafeZoneId {
    /// Wrap a raw zone identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SafeZoneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A circular geofence owned by one device.
///
/// # Example
///
/// ```rust
/// use zonewatch::core::{Coordinate, SafeZone};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let zone = SafeZone::new("zone-1", "dev-1", "School", Coordinate::new(0.0, 0.0), 100.0)
///     .expiring_at(now + Duration::hours(2));
///
/// assert!(!zone.is_expired(now));
/// assert!(zone.is_expired(now + Duration::hours(2)));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub id: SafeZoneId,
    pub device_id: DeviceId,
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    #[serde(default)]
    pub expiration_at: Option<DateTime<Utc>>,
}

impl SafeZone {
    pub fn new(
        id: impl Into<SafeZoneId>,
        device_id: impl Into<DeviceId>,
        name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            device_id: device_id.into(),
            name: name.into(),
            center,
            radius_meters,
            expiration_at: None,
        }
    }

    /// Set the instant from which the zone no longer applies
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_at = Some(at);
        self
    }

    /// A zone is expired once `now >= expiration_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_at.is_some_and(|at| now >= at)
    }

    /// Nominal radius widened by the jitter buffer.
    pub fn effective_radius(&self, buffer_meters: f64) -> f64 {
        self.radius_meters + buffer_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn zone() -> SafeZone {
        SafeZone::new("z", "d", "Home", Coordinate::new(0.0, 0.0), 100.0)
    }

    #[test]
    fn zone_without_expiration_never_expires() {
        assert!(!zone().is_expired(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn expiration_is_inclusive() {
        let at = Utc::now();
        let zone = zone().expiring_at(at);

        assert!(!zone.is_expired(at - Duration::milliseconds(1)));
        assert!(zone.is_expired(at));
    }

    #[test]
    fn effective_radius_adds_buffer() {
        assert_eq!(zone().effective_radius(10.0), 110.0);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SafeZoneId::generate(), SafeZoneId::generate());
    }

    #[test]
    fn zone_roundtrips_through_json() {
        let zone = zone().expiring_at(Utc::now());
        let json = serde_json::to_string(&zone).unwrap();
        let back: SafeZone = serde_json::from_str(&json).unwrap();
        assert_eq!(zone, back);
    }
}
