//! The geofence transition detector.
//!
//! For every fix the detector reads one snapshot of the directory, evaluates
//! each tracked device against its zones, feeds the raw reading to that
//! device's debouncer and dispatches an alert for every confirmed exit.
//!
//! Nothing in the fix path returns an error: malformed fixes, broken zones,
//! directory outages and sink failures are logged, counted in
//! [`Diagnostics`] and reported in the [`FixOutcome`].

mod builder;
mod diagnostics;

pub use builder::DetectorBuilder;
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};

use crate::core::{
    Coordinate, Device, DeviceId, LocationFix, Presence, PresenceHistory, PresenceTransition,
    SafeZoneId,
};
use crate::debounce::{
    DebounceConfig, MembershipTable, ReadingOutcome, TrackedDevice, TransitionRules,
    ZoneMembershipState,
};
use crate::error::DirectoryError;
use crate::membership::{evaluate_zones, Reading};
use crate::ports::{Directory, Notification, NotificationSink};
use crate::validation::{into_result, validate_fix, InputViolation};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a fix as a whole was handled
#[derive(Clone, Debug, PartialEq)]
pub enum FixStatus {
    Evaluated,
    /// The fix had no usable coordinates
    Malformed(Vec<InputViolation>),
    /// The device list could not be read; evaluation deferred to the next fix
    DirectoryUnavailable(DirectoryError),
}

/// Why a device's counters were left untouched
#[derive(Clone, Debug, PartialEq)]
pub enum FreezeReason {
    ZonesUnavailable(DirectoryError),
    /// No usable zone contained the fix and an expired or invalid zone
    /// left the reading undecided
    NoUsableZones,
}

/// Result of one device on one fix
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceOutcome {
    Evaluated {
        reading: Reading,
        containing: Vec<SafeZoneId>,
        outcome: ReadingOutcome,
    },
    Frozen(FreezeReason),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceReport {
    pub device_id: DeviceId,
    pub outcome: DeviceOutcome,
}

/// Everything that happened while processing one fix.
#[derive(Clone, Debug, PartialEq)]
pub struct FixOutcome {
    pub timestamp: DateTime<Utc>,
    pub status: FixStatus,
    pub devices: Vec<DeviceReport>,
    /// Zone-exit alerts raised by this fix
    pub notifications: Vec<Notification>,
    /// Devices whose state was dropped because they left the directory
    pub evicted: Vec<DeviceId>,
}

impl FixOutcome {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            status: FixStatus::Evaluated,
            devices: Vec::new(),
            notifications: Vec::new(),
            evicted: Vec::new(),
        }
    }

    /// Confirmed transitions across all devices.
    pub fn transitions(&self) -> Vec<&PresenceTransition> {
        self.devices
            .iter()
            .filter_map(|report| match &report.outcome {
                DeviceOutcome::Evaluated { outcome, .. } => outcome.transition(),
                DeviceOutcome::Frozen(_) => None,
            })
            .collect()
    }

    /// Report for one device, if it was in the snapshot
    pub fn report(&self, device_id: &DeviceId) -> Option<&DeviceReport> {
        self.devices.iter().find(|r| r.device_id == *device_id)
    }
}

/// Debounced inside/outside tracking for every device in a directory.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use zonewatch::core::{Coordinate, Device, LocationFix, Presence};
/// use zonewatch::detector::Detector;
/// use zonewatch::ports::{ChannelSink, InMemoryDirectory};
///
/// let directory = Arc::new(InMemoryDirectory::new());
/// directory.register_device(Device::new("dev-1", "owner-1", "Backpack")).unwrap();
/// directory
///     .create_zone(&"dev-1".into(), "Home", Coordinate::new(0.0, 0.0), 100.0, None)
///     .unwrap();
///
/// let (sink, _alerts) = ChannelSink::new();
/// let mut detector = Detector::builder()
///     .directory(directory)
///     .sink(Arc::new(sink))
///     .build()
///     .unwrap();
///
/// let outcome = detector.evaluate_fix(&LocationFix::now(Coordinate::new(0.0, 0.0)));
/// assert!(outcome.notifications.is_empty());
/// assert_eq!(detector.presence(&"dev-1".into()), Some(Presence::Inside));
/// ```
pub struct Detector {
    config: DebounceConfig,
    rules: TransitionRules,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn NotificationSink>,
    table: MembershipTable,
    diagnostics: Arc<Diagnostics>,
}

impl Detector {
    /// Start building a detector
    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::new()
    }

    pub(crate) fn assemble(
        config: DebounceConfig,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn NotificationSink>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            rules: TransitionRules::from_config(&config),
            config,
            directory,
            sink,
            table: MembershipTable::new(),
            diagnostics,
        }
    }

    /// Get the active thresholds
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Shared anomaly and activity counters
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    /// Confirmed presence of a tracked device.
    pub fn presence(&self, device_id: &DeviceId) -> Option<Presence> {
        self.table.get(device_id).map(|tracked| tracked.state.stable())
    }

    /// Raw debounce counters of a tracked device
    pub fn state(&self, device_id: &DeviceId) -> Option<&ZoneMembershipState> {
        self.table.get(device_id).map(|tracked| &tracked.state)
    }

    /// Recent confirmed transitions of a tracked device
    pub fn history(&self, device_id: &DeviceId) -> Option<&PresenceHistory> {
        self.table.get(device_id).map(|tracked| &tracked.history)
    }

    /// Number of devices with debounce state
    pub fn tracked_devices(&self) -> usize {
        self.table.len()
    }

    /// Drop all state for a device. It starts fresh if seen again.
    pub fn untrack(&mut self, device_id: &DeviceId) -> bool {
        let evicted = self.table.evict(device_id).is_some();
        if evicted {
            self.diagnostics.devices_evicted(1);
        }
        evicted
    }

    /// Evaluate a fix and dispatch any resulting alerts without awaiting them.
    ///
    /// Dispatch needs a Tokio runtime; without one, alerts are logged and
    /// counted as failed while state changes still commit. Callers without a
    /// runtime should use [`Detector::evaluate_fix`] and deliver
    /// [`FixOutcome::notifications`] themselves.
    pub fn process_fix(&mut self, fix: LocationFix) -> FixOutcome {
        let outcome = self.evaluate_fix(&fix);
        for notification in &outcome.notifications {
            self.dispatch(notification.clone());
        }
        outcome
    }

    /// Evaluate a fix and update debounce state. Alerts are returned in the
    /// outcome but not delivered.
    pub fn evaluate_fix(&mut self, fix: &LocationFix) -> FixOutcome {
        let now = fix.timestamp;
        let mut outcome = FixOutcome::new(now);

        let coordinate = match usable_coordinate(fix) {
            Ok(coordinate) => coordinate,
            Err(violations) => {
                warn!(?violations, "skipping malformed fix");
                self.diagnostics.fix_skipped();
                outcome.status = FixStatus::Malformed(violations);
                return outcome;
            }
        };

        let devices = match self.directory.list_tracked_devices() {
            Ok(devices) => devices,
            Err(error) => {
                warn!(%error, "device list unavailable, deferring fix");
                self.diagnostics.directory_failure();
                self.diagnostics.fix_skipped();
                outcome.status = FixStatus::DirectoryUnavailable(error);
                return outcome;
            }
        };
        self.diagnostics.fix_processed();

        let mut seen = HashSet::with_capacity(devices.len());
        for device in &devices {
            if !seen.insert(device.id.clone()) {
                continue;
            }
            let report = self.evaluate_device(device, &coordinate, now, &mut outcome.notifications);
            outcome.devices.push(report);
        }

        outcome.evicted = self.table.retain_tracked(&seen);
        if !outcome.evicted.is_empty() {
            debug!(evicted = ?outcome.evicted, "dropped state of untracked devices");
            self.diagnostics.devices_evicted(outcome.evicted.len());
        }

        outcome
    }

    fn evaluate_device(
        &mut self,
        device: &Device,
        coordinate: &Coordinate,
        now: DateTime<Utc>,
        notifications: &mut Vec<Notification>,
    ) -> DeviceReport {
        let device_id = device.id.clone();

        let zones = match self.directory.zones_for_device(&device.id) {
            Ok(zones) => zones,
            Err(error) => {
                warn!(device_id = %device.id, %error, "zone list unavailable, counters frozen");
                self.diagnostics.directory_failure();
                return DeviceReport {
                    device_id,
                    outcome: DeviceOutcome::Frozen(FreezeReason::ZonesUnavailable(error)),
                };
            }
        };

        let evaluation =
            evaluate_zones(coordinate, &device.id, &zones, self.config.buffer_meters, now);
        for rejected in &evaluation.rejected {
            warn!(
                device_id = %device.id,
                zone_id = %rejected.zone_id,
                violations = ?rejected.violations,
                "skipping invalid safe zone"
            );
        }
        self.diagnostics.zones_rejected(evaluation.rejected.len());
        self.diagnostics.zones_expired(evaluation.expired);

        let Some(raw_inside) = evaluation.reading.as_inside() else {
            debug!(device_id = %device.id, "no usable zones, counters frozen");
            return DeviceReport {
                device_id,
                outcome: DeviceOutcome::Frozen(FreezeReason::NoUsableZones),
            };
        };

        let outcome = match self.table.get_mut(&device.id) {
            Some(tracked) => {
                let outcome = tracked.state.ingest(&device.id, raw_inside, now, &self.rules);
                if let ReadingOutcome::Transitioned(transition) = &outcome {
                    tracked.history.record(transition.clone());
                }
                outcome
            }
            None => {
                let state = ZoneMembershipState::initial(raw_inside, now);
                let presence = state.stable();
                self.table.insert(TrackedDevice {
                    device_id: device.id.clone(),
                    state,
                    history: PresenceHistory::new(self.config.history_limit),
                });
                debug!(device_id = %device.id, %presence, "tracking device");
                ReadingOutcome::Initialized(presence)
            }
        };

        match &outcome {
            ReadingOutcome::Transitioned(transition) => {
                self.diagnostics.transition_confirmed();
                info!(
                    device_id = %device.id,
                    from = %transition.from,
                    to = %transition.to,
                    readings = transition.confirming_readings,
                    "presence change confirmed"
                );
                if transition.is_exit() {
                    info!(device_id = %device.id, name = %device.display_name, "device exited safe zone");
                    notifications.push(Notification::zone_exited(device, now));
                }
            }
            ReadingOutcome::Pending { reasons, .. } => {
                self.diagnostics.transition_held();
                debug!(device_id = %device.id, ?reasons, "presence change held");
            }
            ReadingOutcome::Initialized(_) | ReadingOutcome::Steady(_) => {}
        }

        DeviceReport {
            device_id,
            outcome: DeviceOutcome::Evaluated {
                reading: evaluation.reading,
                containing: evaluation.containing,
                outcome,
            },
        }
    }

    fn dispatch(&self, notification: Notification) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(
                device_id = %notification.device.id,
                "no async runtime available, dropping zone-exit notification"
            );
            self.diagnostics.notification_failed();
            return;
        };

        self.diagnostics.notification_dispatched();
        let sink = Arc::clone(&self.sink);
        let diagnostics = Arc::clone(&self.diagnostics);
        runtime.spawn(async move {
            let result = sink
                .notify(&notification.device, notification.kind, &notification.text)
                .await;
            match result {
                Ok(()) => diagnostics.notification_delivered(),
                Err(error) => {
                    warn!(device_id = %notification.device.id, %error, "zone-exit notification failed");
                    diagnostics.notification_failed();
                }
            }
        });
    }
}

fn usable_coordinate(fix: &LocationFix) -> Result<Coordinate, Vec<InputViolation>> {
    into_result(validate_fix(fix))?;
    fix.coordinate
        .ok_or_else(|| vec![InputViolation::MissingCoordinate])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SafeZone;
    use crate::ports::{ChannelSink, InMemoryDirectory};
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn origin() -> Coordinate {
        Coordinate::new(0.0, 0.0)
    }

    fn at(start: DateTime<Utc>, secs: i64, meters_from_origin: f64) -> LocationFix {
        LocationFix::new(
            origin().destination(0.0, meters_from_origin),
            start + ChronoDuration::seconds(secs),
        )
    }

    fn setup() -> (Arc<InMemoryDirectory>, Detector) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .register_device(Device::new("dev", "owner", "Backpack"))
            .unwrap();
        directory
            .insert_zone(SafeZone::new("home", "dev", "Home", origin(), 100.0))
            .unwrap();

        let (sink, _rx) = ChannelSink::new();
        let detector = Detector::builder()
            .directory(directory.clone())
            .sink(Arc::new(sink))
            .build()
            .unwrap();
        (directory, detector)
    }

    fn dev() -> DeviceId {
        DeviceId::new("dev")
    }

    #[test]
    fn first_fix_initializes_silently() {
        let (_, mut detector) = setup();
        let outcome = detector.evaluate_fix(&at(Utc::now(), 0, 0.0));

        assert_eq!(outcome.status, FixStatus::Evaluated);
        assert!(outcome.notifications.is_empty());
        assert!(matches!(
            outcome.report(&dev()).unwrap().outcome,
            DeviceOutcome::Evaluated {
                outcome: ReadingOutcome::Initialized(Presence::Inside),
                ..
            }
        ));
    }

    #[test]
    fn three_far_fixes_raise_one_exit() {
        let (_, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));

        let outcomes: Vec<FixOutcome> = [40, 80, 120]
            .iter()
            .map(|secs| detector.evaluate_fix(&at(start, *secs, 200.0)))
            .collect();

        assert!(outcomes[0].notifications.is_empty());
        assert!(outcomes[1].notifications.is_empty());
        assert_eq!(outcomes[2].notifications.len(), 1);
        assert_eq!(outcomes[2].notifications[0].text, "Backpack has exited the safe zone!");
        assert_eq!(detector.presence(&dev()), Some(Presence::Outside));
        assert_eq!(detector.history(&dev()).unwrap().len(), 1);
    }

    #[test]
    fn reentry_is_silent() {
        let (_, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 500.0));

        let outcomes: Vec<FixOutcome> = [40, 80, 120]
            .iter()
            .map(|secs| detector.evaluate_fix(&at(start, *secs, 0.0)))
            .collect();

        assert_eq!(outcomes[2].transitions().len(), 1);
        assert!(outcomes.iter().all(|o| o.notifications.is_empty()));
        assert_eq!(detector.presence(&dev()), Some(Presence::Inside));
    }

    #[test]
    fn malformed_fix_is_skipped_without_touching_counters() {
        let (_, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));
        let before = detector.state(&dev()).cloned();

        let outcome = detector.evaluate_fix(&LocationFix::without_position(start));
        assert!(matches!(outcome.status, FixStatus::Malformed(_)));

        let outcome = detector.evaluate_fix(&LocationFix::new(Coordinate::new(f64::NAN, 0.0), start));
        assert!(matches!(outcome.status, FixStatus::Malformed(_)));

        assert_eq!(detector.state(&dev()).cloned(), before);
        assert_eq!(detector.diagnostics().snapshot().fixes_skipped, 2);
    }

    #[test]
    fn zone_deletion_still_requires_three_readings() {
        let (directory, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));
        directory.delete_zone(&SafeZoneId::new("home")).unwrap();

        let first = detector.evaluate_fix(&at(start, 60, 0.0));
        let second = detector.evaluate_fix(&at(start, 70, 0.0));
        assert!(first.transitions().is_empty());
        assert!(second.transitions().is_empty());
        assert_eq!(detector.presence(&dev()), Some(Presence::Inside));

        let third = detector.evaluate_fix(&at(start, 80, 0.0));
        assert_eq!(third.notifications.len(), 1);
    }

    #[test]
    fn expired_only_zone_freezes_counters() {
        let (directory, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));
        directory
            .insert_zone(
                SafeZone::new("home", "dev", "Home", origin(), 100.0)
                    .expiring_at(start + ChronoDuration::seconds(10)),
            )
            .unwrap();

        for secs in [40, 80, 120, 160] {
            let outcome = detector.evaluate_fix(&at(start, secs, 500.0));
            assert!(matches!(
                outcome.report(&dev()).unwrap().outcome,
                DeviceOutcome::Frozen(FreezeReason::NoUsableZones)
            ));
        }
        assert_eq!(detector.presence(&dev()), Some(Presence::Inside));
        assert_eq!(detector.state(&dev()).unwrap().consecutive_inside_count, 1);
    }

    struct FlakyDirectory {
        inner: InMemoryDirectory,
        zones_down: AtomicBool,
        devices_down: AtomicBool,
    }

    impl Directory for FlakyDirectory {
        fn list_tracked_devices(&self) -> Result<Vec<Device>, DirectoryError> {
            if self.devices_down.load(Ordering::SeqCst) {
                return Err(DirectoryError::Unavailable {
                    reason: "offline".to_string(),
                });
            }
            self.inner.list_tracked_devices()
        }

        fn zones_for_device(&self, device_id: &DeviceId) -> Result<Vec<crate::core::SafeZone>, DirectoryError> {
            if self.zones_down.load(Ordering::SeqCst) {
                return Err(DirectoryError::Unavailable {
                    reason: "offline".to_string(),
                });
            }
            self.inner.zones_for_device(device_id)
        }
    }

    fn flaky_setup() -> (Arc<FlakyDirectory>, Detector) {
        let inner = InMemoryDirectory::new();
        inner
            .register_device(Device::new("dev", "owner", "Backpack"))
            .unwrap();
        inner
            .insert_zone(SafeZone::new("home", "dev", "Home", origin(), 100.0))
            .unwrap();
        let directory = Arc::new(FlakyDirectory {
            inner,
            zones_down: AtomicBool::new(false),
            devices_down: AtomicBool::new(false),
        });

        let (sink, _rx) = ChannelSink::new();
        let detector = Detector::builder()
            .directory(directory.clone())
            .sink(Arc::new(sink))
            .build()
            .unwrap();
        (directory, detector)
    }

    #[test]
    fn zone_read_failure_freezes_device() {
        let (directory, mut detector) = flaky_setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));
        detector.evaluate_fix(&at(start, 40, 500.0));

        directory.zones_down.store(true, Ordering::SeqCst);
        for secs in [50, 60, 70] {
            let outcome = detector.evaluate_fix(&at(start, secs, 500.0));
            assert!(outcome.notifications.is_empty());
        }
        assert_eq!(detector.state(&dev()).unwrap().consecutive_outside_count, 1);

        directory.zones_down.store(false, Ordering::SeqCst);
        detector.evaluate_fix(&at(start, 80, 500.0));
        let outcome = detector.evaluate_fix(&at(start, 90, 500.0));
        assert_eq!(outcome.notifications.len(), 1);
    }

    #[test]
    fn device_list_failure_defers_whole_fix() {
        let (directory, mut detector) = flaky_setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));

        directory.devices_down.store(true, Ordering::SeqCst);
        let outcome = detector.evaluate_fix(&at(start, 40, 500.0));

        assert!(matches!(outcome.status, FixStatus::DirectoryUnavailable(_)));
        assert_eq!(detector.tracked_devices(), 1);
        assert_eq!(detector.diagnostics().snapshot().directory_failures, 1);
    }

    #[test]
    fn removed_device_state_is_evicted() {
        let (directory, mut detector) = setup();
        let start = Utc::now();
        detector.evaluate_fix(&at(start, 0, 0.0));
        directory.remove_device(&dev()).unwrap();

        let outcome = detector.evaluate_fix(&at(start, 10, 0.0));
        assert_eq!(outcome.evicted, vec![dev()]);
        assert_eq!(detector.presence(&dev()), None);
        assert_eq!(detector.tracked_devices(), 0);
    }

    #[test]
    fn invalid_zone_is_counted_and_ignored() {
        let (directory, mut detector) = setup();
        directory
            .insert_zone(SafeZone::new("broken", "dev", "Broken", origin(), 0.0))
            .unwrap();

        let outcome = detector.evaluate_fix(&at(Utc::now(), 0, 0.0));
        assert!(matches!(
            outcome.report(&dev()).unwrap().outcome,
            DeviceOutcome::Evaluated {
                reading: Reading::Inside,
                ..
            }
        ));
        assert_eq!(detector.diagnostics().snapshot().zones_rejected, 1);
    }

    #[test]
    fn untrack_drops_state() {
        let (_, mut detector) = setup();
        detector.evaluate_fix(&at(Utc::now(), 0, 0.0));

        assert!(detector.untrack(&dev()));
        assert!(!detector.untrack(&dev()));
        assert_eq!(detector.presence(&dev()), None);
    }

    #[test]
    fn process_fix_without_runtime_commits_state() {
        let (_, mut detector) = setup();
        let start = Utc::now();
        detector.process_fix(at(start, 0, 0.0));
        for secs in [40, 80, 120] {
            detector.process_fix(at(start, secs, 500.0));
        }

        assert_eq!(detector.presence(&dev()), Some(Presence::Outside));
        let snapshot = detector.diagnostics().snapshot();
        assert_eq!(snapshot.notifications_failed, 1);
        assert_eq!(snapshot.notifications_dispatched, 0);
    }

    #[tokio::test]
    async fn process_fix_delivers_through_sink() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .register_device(Device::new("dev", "owner", "Backpack"))
            .unwrap();
        directory
            .insert_zone(SafeZone::new("home", "dev", "Home", origin(), 100.0))
            .unwrap();
        let (sink, mut rx) = ChannelSink::new();
        let mut detector = Detector::builder()
            .directory(directory)
            .sink(Arc::new(sink))
            .build()
            .unwrap();

        let start = Utc::now();
        detector.process_fix(at(start, 0, 0.0));
        for secs in [40, 80, 120] {
            detector.process_fix(at(start, secs, 500.0));
        }

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.device.id, dev());
        assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv())
            .await
            .is_err());
    }
}
