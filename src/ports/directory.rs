//! Device and zone directory.
//!
//! The detector reads the directory once per fix. Implementations must hand
//! out owned snapshots so concurrent edits never tear an evaluation.

use crate::core::{Coordinate, Device, DeviceId, SafeZone, SafeZoneId};
use crate::error::DirectoryError;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Read-only view of tracked devices and their zones
pub trait Directory: Send + Sync {
    fn list_tracked_devices(&self) -> Result<Vec<Device>, DirectoryError>;

    fn zones_for_device(&self, device_id: &DeviceId) -> Result<Vec<SafeZone>, DirectoryError>;
}

#[derive(Debug, Default)]
struct Records {
    // Insertion order is kept so evaluation order is deterministic.
    devices: Vec<Device>,
    zones: HashMap<DeviceId, Vec<SafeZone>>,
}

/// Process-local directory with copy-on-read snapshots.
///
/// Writers take the lock only for the length of the edit, so CRUD calls
/// from other threads can interleave freely with evaluation.
///
/// # Example
///
/// ```rust
/// use zonewatch::core::{Coordinate, Device};
/// use zonewatch::ports::{Directory, InMemoryDirectory};
///
/// let directory = InMemoryDirectory::new();
/// directory.register_device(Device::new("dev-1", "owner-1", "Backpack")).unwrap();
/// let zone_id = directory
///     .create_zone(&"dev-1".into(), "Home", Coordinate::new(0.0, 0.0), 100.0, None)
///     .unwrap();
///
/// let zones = directory.zones_for_device(&"dev-1".into()).unwrap();
/// assert_eq!(zones[0].id, zone_id);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<Records>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Records>, DirectoryError> {
        self.records.read().map_err(|_| DirectoryError::Unavailable {
            reason: "directory lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Records>, DirectoryError> {
        self.records.write().map_err(|_| DirectoryError::Unavailable {
            reason: "directory lock poisoned".to_string(),
        })
    }

    /// Add a device, replacing any existing record with the same id.
    pub fn register_device(&self, device: Device) -> Result<(), DirectoryError> {
        let mut records = self.write()?;
        match records.devices.iter().position(|d| d.id == device.id) {
            Some(position) => records.devices[position] = device,
            None => {
                debug!(device_id = %device.id, "device registered");
                records.devices.push(device);
            }
        }
        Ok(())
    }

    /// Remove a device together with all of its zones.
    pub fn remove_device(&self, device_id: &DeviceId) -> Result<Device, DirectoryError> {
        let mut records = self.write()?;
        let position = records
            .devices
            .iter()
            .position(|d| d.id == *device_id)
            .ok_or_else(|| DirectoryError::UnknownDevice(device_id.clone()))?;

        records.zones.remove(device_id);
        debug!(device_id = %device_id, "device removed");
        Ok(records.devices.remove(position))
    }

    pub fn update_device_location(
        &self,
        device_id: &DeviceId,
        location: Coordinate,
    ) -> Result<(), DirectoryError> {
        let mut records = self.write()?;
        let device = records
            .devices
            .iter_mut()
            .find(|d| d.id == *device_id)
            .ok_or_else(|| DirectoryError::UnknownDevice(device_id.clone()))?;
        device.last_known_location = Some(location);
        Ok(())
    }

    /// Create a zone for a registered device and return its fresh id.
    pub fn create_zone(
        &self,
        device_id: &DeviceId,
        name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
        expiration_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<SafeZoneId, DirectoryError> {
        let mut zone = SafeZone::new(
            SafeZoneId::generate(),
            device_id.clone(),
            name,
            center,
            radius_meters,
        );
        zone.expiration_at = expiration_at;
        let id = zone.id.clone();
        self.insert_zone(zone)?;
        Ok(id)
    }

    /// Store a fully formed zone, replacing one with the same id.
    pub fn insert_zone(&self, zone: SafeZone) -> Result<(), DirectoryError> {
        let mut records = self.write()?;
        if !records.devices.iter().any(|d| d.id == zone.device_id) {
            return Err(DirectoryError::UnknownDevice(zone.device_id));
        }

        let zones = records.zones.entry(zone.device_id.clone()).or_default();
        match zones.iter().position(|z| z.id == zone.id) {
            Some(position) => zones[position] = zone,
            None => {
                debug!(device_id = %zone.device_id, zone_id = %zone.id, "safe zone created");
                zones.push(zone);
            }
        }
        Ok(())
    }

    pub fn delete_zone(&self, zone_id: &SafeZoneId) -> Result<SafeZone, DirectoryError> {
        let mut records = self.write()?;
        for zones in records.zones.values_mut() {
            if let Some(position) = zones.iter().position(|z| z.id == *zone_id) {
                debug!(zone_id = %zone_id, "safe zone deleted");
                return Ok(zones.remove(position));
            }
        }
        Err(DirectoryError::UnknownZone(zone_id.clone()))
    }
}

impl Directory for InMemoryDirectory {
    fn list_tracked_devices(&self) -> Result<Vec<Device>, DirectoryError> {
        Ok(self.read()?.devices.clone())
    }

    fn zones_for_device(&self, device_id: &DeviceId) -> Result<Vec<SafeZone>, DirectoryError> {
        let records = self.read()?;
        if !records.devices.iter().any(|d| d.id == *device_id) {
            return Err(DirectoryError::UnknownDevice(device_id.clone()));
        }
        Ok(records.zones.get(device_id).cloned().unwrap_or_default())
    }
}
