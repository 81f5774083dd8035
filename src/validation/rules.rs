//! Validation checks for fixes and zones.
//!
//! Every check reports ALL defects it finds so a single log line can show
//! everything wrong with a zone or a fix.

use crate::core::{Coordinate, LocationFix, SafeZone};
use crate::validation::violations::InputViolation;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome type shared by every check
pub type Checked = Validation<(), NonEmptyVec<InputViolation>>;

/// Check that both coordinate components are finite and in range.
pub fn validate_coordinate(coordinate: &Coordinate) -> Checked {
    let latitude: Checked = if !coordinate.latitude.is_finite() {
        Validation::fail(InputViolation::NonFiniteLatitude {
            value: coordinate.latitude,
        })
    } else if !(-90.0..=90.0).contains(&coordinate.latitude) {
        Validation::fail(InputViolation::LatitudeOutOfRange {
            value: coordinate.latitude,
        })
    } else {
        Validation::success(())
    };

    let longitude: Checked = if !coordinate.longitude.is_finite() {
        Validation::fail(InputViolation::NonFiniteLongitude {
            value: coordinate.longitude,
        })
    } else if !(-180.0..=180.0).contains(&coordinate.longitude) {
        Validation::fail(InputViolation::LongitudeOutOfRange {
            value: coordinate.longitude,
        })
    } else {
        Validation::success(())
    };

    Validation::all_vec(vec![latitude, longitude]).map(|_| ())
}

/// Check a fix has a usable position.
pub fn validate_fix(fix: &LocationFix) -> Checked {
    match &fix.coordinate {
        Some(coordinate) => validate_coordinate(coordinate),
        None => Validation::fail(InputViolation::MissingCoordinate),
    }
}

/// Check a zone's center and radius.
pub fn validate_zone(zone: &SafeZone) -> Checked {
    // NaN fails this comparison too.
    let radius: Checked = if zone.radius_meters > 0.0 && zone.radius_meters.is_finite() {
        Validation::success(())
    } else {
        Validation::fail(InputViolation::NonPositiveRadius {
            value: zone.radius_meters,
        })
    };

    Validation::all_vec(vec![validate_coordinate(&zone.center), radius]).map(|_| ())
}

/// Flatten a check into a plain `Result` carrying every violation.
pub fn into_result(checked: Checked) -> Result<(), Vec<InputViolation>> {
    match checked {
        Validation::Success(_) => Ok(()),
        Validation::Failure(violations) => Err(violations.iter().cloned().collect()),
    }
}
