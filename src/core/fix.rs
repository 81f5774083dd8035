//! Location fixes delivered by the feed adapter.

use super::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One location sample with its arrival time.
///
/// `coordinate` is `None` when the platform delivered a sample without a
/// position; such fixes are skipped by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Option<Coordinate>,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    /// Fix with a position
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate: Some(coordinate),
            timestamp,
        }
    }

    /// A fix that arrived without coordinates.
    pub fn without_position(timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate: None,
            timestamp,
        }
    }

    /// Stamp `coordinate` with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, Utc::now())
    }
}
