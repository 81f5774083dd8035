//! Core value types for geofence monitoring.
//!
//! This module holds the pure data model:
//! - Coordinates and great-circle distance
//! - Devices, safe zones and location fixes
//! - Debounced presence and its transition history
//!
//! Nothing here performs I/O or holds shared state.

mod device;
mod fix;
mod geo;
mod presence;
mod zone;

pub use device::{Device, DeviceId};
pub use fix::LocationFix;
pub use geo::{distance_meters, Coordinate, EARTH_RADIUS_METERS};
pub use presence::{Presence, PresenceHistory, PresenceTransition};
pub use zone::{SafeZone, SafeZoneId};
