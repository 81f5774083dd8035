//! Tracked devices as supplied by the directory.

use super::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable device identifier assigned by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw device identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A device registered for safe-zone monitoring.
///
/// The detector treats devices as read-only snapshots; edits go through
/// the directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub owner_id: String,
    pub display_name: String,
    #[serde(default)]
    pub last_known_location: Option<Coordinate>,
    /// Opaque push token handed to the notification sink.
    #[serde(default)]
    pub notification_address: Option<String>,
}

impl Device {
    pub fn new(
        id: impl Into<DeviceId>,
        owner_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            display_name: display_name.into(),
            last_known_location: None,
            notification_address: None,
        }
    }

    /// Set the push address used for alerts
    pub fn with_notification_address(mut self, address: impl Into<String>) -> Self {
        self.notification_address = Some(address.into());
        self
    }

    /// Set the last reported position
    pub fn with_last_known_location(mut self, location: Coordinate) -> Self {
        self.last_known_location = Some(location);
        self
    }
}
