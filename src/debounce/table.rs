//! Slot table holding debounce state for every tracked device.
//!
//! Devices map to stable slot indices on first sight. Evicting a device frees
//! its slot for reuse; nothing is left behind for a device that stopped being
//! tracked.

use crate::core::{DeviceId, PresenceHistory};
use crate::debounce::state::ZoneMembershipState;
use std::collections::{HashMap, HashSet};

/// Debounce state and transition history of one device
#[derive(Clone, Debug)]
pub struct TrackedDevice {
    pub device_id: DeviceId,
    pub state: ZoneMembershipState,
    pub history: PresenceHistory,
}

/// Device-id to slot mapping with explicit eviction.
#[derive(Debug, Default)]
pub struct MembershipTable {
    index: HashMap<DeviceId, usize>,
    slots: Vec<Option<TrackedDevice>>,
    free: Vec<usize>,
}

impl MembershipTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked devices
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no device is tracked
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True if `device_id` has an entry
    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.index.contains_key(device_id)
    }

    /// Get the entry for a device
    pub fn get(&self, device_id: &DeviceId) -> Option<&TrackedDevice> {
        let slot = *self.index.get(device_id)?;
        self.slots.get(slot)?.as_ref()
    }

    /// Get the entry for a device mutably
    pub fn get_mut(&mut self, device_id: &DeviceId) -> Option<&mut TrackedDevice> {
        let slot = *self.index.get(device_id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Insert or replace the entry for `tracked.device_id`, returning its slot.
    pub fn insert(&mut self, tracked: TrackedDevice) -> usize {
        if let Some(&slot) = self.index.get(&tracked.device_id) {
            self.slots[slot] = Some(tracked);
            return slot;
        }

        let device_id = tracked.device_id.clone();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(tracked);
                slot
            }
            None => {
                self.slots.push(Some(tracked));
                self.slots.len() - 1
            }
        };
        self.index.insert(device_id, slot);
        slot
    }

    /// Drop the entry for `device_id`. Returns it if present.
    pub fn evict(&mut self, device_id: &DeviceId) -> Option<TrackedDevice> {
        let slot = self.index.remove(device_id)?;
        let tracked = self.slots.get_mut(slot)?.take();
        self.free.push(slot);
        tracked
    }

    /// Evict every device not in `keep`, returning the evicted ids.
    pub fn retain_tracked(&mut self, keep: &HashSet<DeviceId>) -> Vec<DeviceId> {
        let stale: Vec<DeviceId> = self
            .index
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();

        for device_id in &stale {
            self.evict(device_id);
        }
        stale
    }

    /// Iterate over tracked devices in slot order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedDevice> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
