//! Counters for non-fatal anomalies and detector activity.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters, updated from the evaluation loop and dispatch tasks.
#[derive(Debug, Default)]
pub struct Diagnostics {
    fixes_processed: AtomicU64,
    fixes_skipped: AtomicU64,
    zones_rejected: AtomicU64,
    zones_expired: AtomicU64,
    directory_failures: AtomicU64,
    devices_evicted: AtomicU64,
    transitions_confirmed: AtomicU64,
    transitions_held: AtomicU64,
    notifications_dispatched: AtomicU64,
    notifications_delivered: AtomicU64,
    notifications_failed: AtomicU64,
}

/// Point-in-time copy of [`Diagnostics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub fixes_processed: u64,
    pub fixes_skipped: u64,
    pub zones_rejected: u64,
    pub zones_expired: u64,
    pub directory_failures: u64,
    pub devices_evicted: u64,
    pub transitions_confirmed: u64,
    pub transitions_held: u64,
    pub notifications_dispatched: u64,
    pub notifications_delivered: u64,
    pub notifications_failed: u64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fix_processed(&self) {
        bump(&self.fixes_processed, 1);
    }

    pub(crate) fn fix_skipped(&self) {
        bump(&self.fixes_skipped, 1);
    }

    pub(crate) fn zones_rejected(&self, count: usize) {
        bump(&self.zones_rejected, count as u64);
    }

    pub(crate) fn zones_expired(&self, count: usize) {
        bump(&self.zones_expired, count as u64);
    }

    pub(crate) fn directory_failure(&self) {
        bump(&self.directory_failures, 1);
    }

    pub(crate) fn devices_evicted(&self, count: usize) {
        bump(&self.devices_evicted, count as u64);
    }

    pub(crate) fn transition_confirmed(&self) {
        bump(&self.transitions_confirmed, 1);
    }

    pub(crate) fn transition_held(&self) {
        bump(&self.transitions_held, 1);
    }

    pub(crate) fn notification_dispatched(&self) {
        bump(&self.notifications_dispatched, 1);
    }

    pub(crate) fn notification_delivered(&self) {
        bump(&self.notifications_delivered, 1);
    }

    pub(crate) fn notification_failed(&self) {
        bump(&self.notifications_failed, 1);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        DiagnosticsSnapshot {
            fixes_processed: load(&self.fixes_processed),
            fixes_skipped: load(&self.fixes_skipped),
            zones_rejected: load(&self.zones_rejected),
            zones_expired: load(&self.zones_expired),
            directory_failures: load(&self.directory_failures),
            devices_evicted: load(&self.devices_evicted),
            transitions_confirmed: load(&self.transitions_confirmed),
            transitions_held: load(&self.transitions_held),
            notifications_dispatched: load(&self.notifications_dispatched),
            notifications_delivered: load(&self.notifications_delivered),
            notifications_failed: load(&self.notifications_failed),
        }
    }
}
