//! Input defects found while validating fixes and zones.

use thiserror::Error;

/// A single defect in a coordinate, fix or zone definition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputViolation {
    #[error("Fix carries no coordinates")]
    MissingCoordinate,

    #[error("Latitude {value} is not a finite number")]
    NonFiniteLatitude { value: f64 },

    #[error("Longitude {value} is not a finite number")]
    NonFiniteLongitude { value: f64 },

    #[error("Latitude {value} outside [-90, 90]")]
    LatitudeOutOfRange { value: f64 },

    #[error("Longitude {value} outside [-180, 180]")]
    LongitudeOutOfRange { value: f64 },

    #[error("Zone radius must be positive (got {value})")]
    NonPositiveRadius { value: f64 },
}
