//! Zone membership evaluation.
//!
//! Decides whether a single fix lies inside a device's zones. A zone counts
//! as containing the fix when the distance to its center is at most its
//! radius plus a fixed buffer. The buffer only ever widens the inside
//! region, so readings right at the boundary read as inside.
//!
//! Expired and invalid zones are removed from the evaluated set before any
//! distance test. They never count as inside or outside.

use crate::core::{distance_meters, Coordinate, DeviceId, SafeZone, SafeZoneId};
use crate::validation::{into_result, validate_zone, InputViolation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// True when `fix` lies within `zone.radius_meters + buffer_meters` of the
/// zone center.
///
/// ```rust
/// use zonewatch::core::{Coordinate, SafeZone};
/// use zonewatch::membership::is_inside;
///
/// let center = Coordinate::new(0.0, 0.0);
/// let zone = SafeZone::new("z", "d", "Home", center, 100.0);
///
/// assert!(is_inside(&center.destination(0.0, 105.0), &zone, 10.0));
/// assert!(!is_inside(&center.destination(0.0, 115.0), &zone, 10.0));
/// ```
pub fn is_inside(fix: &Coordinate, zone: &SafeZone, buffer_meters: f64) -> bool {
    distance_meters(fix, &zone.center) <= zone.effective_radius(buffer_meters)
}

/// Union membership over every zone not expired at `now`.
///
/// An empty or fully expired zone list reads as outside here; use
/// [`evaluate_zones`] when that distinction matters.
pub fn is_inside_any(
    fix: &Coordinate,
    zones: &[SafeZone],
    buffer_meters: f64,
    now: DateTime<Utc>,
) -> bool {
    zones
        .iter()
        .filter(|zone| !zone.is_expired(now))
        .any(|zone| is_inside(fix, zone, buffer_meters))
}

/// Raw, undebounced reading for one device on one fix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    Inside,
    Outside,
    /// The device has zones but none could be evaluated.
    Indeterminate,
}

impl Reading {
    /// `Some(inside)` for determinate readings.
    pub fn as_inside(self) -> Option<bool> {
        match self {
            Self::Inside => Some(true),
            Self::Outside => Some(false),
            Self::Indeterminate => None,
        }
    }
}

/// A zone left out of evaluation because its definition is broken.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedZone {
    pub zone_id: SafeZoneId,
    pub violations: Vec<InputViolation>,
}

/// Full result of evaluating one device's zone list against a fix.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneEvaluation {
    pub reading: Reading,
    /// Zones that took part in the distance test
    pub considered: usize,
    /// Zones excluded because `now >= expiration_at`
    pub expired: usize,
    /// Zones owned by a different device
    pub foreign: usize,
    /// Zones excluded because their definition is invalid
    pub rejected: Vec<RejectedZone>,
    /// Zones found to contain the fix
    pub containing: Vec<SafeZoneId>,
    /// Expired zones that would still contain the fix
    pub expired_containing: Vec<SafeZoneId>,
}

/// Evaluate `zones` for `device_id` against `fix`.
///
/// - An empty zone list is an [`Reading::Outside`] reading.
/// - A list whose own zones are all expired or invalid is
///   [`Reading::Indeterminate`].
/// - A fix outside every usable zone but inside an expired one is
///   [`Reading::Indeterminate`], so expiry alone never reads as leaving.
/// - Otherwise the reading is the union over usable zones.
pub fn evaluate_zones(
    fix: &Coordinate,
    device_id: &DeviceId,
    zones: &[SafeZone],
    buffer_meters: f64,
    now: DateTime<Utc>,
) -> ZoneEvaluation {
    let mut evaluation = ZoneEvaluation {
        reading: Reading::Outside,
        considered: 0,
        expired: 0,
        foreign: 0,
        rejected: Vec::new(),
        containing: Vec::new(),
        expired_containing: Vec::new(),
    };

    for zone in zones {
        if zone.device_id != *device_id {
            evaluation.foreign += 1;
            continue;
        }
        if zone.is_expired(now) {
            evaluation.expired += 1;
            if validate_zone(zone).is_success() && is_inside(fix, zone, buffer_meters) {
                evaluation.expired_containing.push(zone.id.clone());
            }
            continue;
        }
        if let Err(violations) = into_result(validate_zone(zone)) {
            evaluation.rejected.push(RejectedZone {
                zone_id: zone.id.clone(),
                violations,
            });
            continue;
        }

        evaluation.considered += 1;
        if is_inside(fix, zone, buffer_meters) {
            evaluation.containing.push(zone.id.clone());
        }
    }

    evaluation.reading = if !evaluation.containing.is_empty() {
        Reading::Inside
    } else if !evaluation.expired_containing.is_empty()
        || (evaluation.considered == 0
            && (evaluation.expired > 0 || !evaluation.rejected.is_empty()))
    {
        Reading::Indeterminate
    } else {
        Reading::Outside
    };

    evaluation
}
