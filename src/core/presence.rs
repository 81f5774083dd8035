//! Debounced presence states and their transition history.
//!
//! A device is either [`Presence::Inside`] at least one of its zones or
//! [`Presence::Outside`] all of them. Confirmed changes between the two are
//! recorded as [`PresenceTransition`] values in a bounded
//! [`PresenceHistory`].

use super::device::DeviceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Whole-device membership across all of its zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Inside,
    Outside,
}

impl Presence {
    /// Map a raw inside flag to a presence
    pub fn from_inside(inside: bool) -> Self {
        if inside {
            Self::Inside
        } else {
            Self::Outside
        }
    }

    pub fn is_inside(self) -> bool {
        matches!(self, Self::Inside)
    }

    /// Name for display and logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::Inside => "Inside",
            Self::Outside => "Outside",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of a single confirmed presence change.
///
/// # Example
///
/// ```rust
/// use zonewatch::core::{DeviceId, Presence, PresenceTransition};
/// use chrono::Utc;
///
/// let transition = PresenceTransition {
///     device_id: DeviceId::new("dev-1"),
///     from: Presence::Inside,
///     to: Presence::Outside,
///     timestamp: Utc::now(),
///     confirming_readings: 3,
/// };
/// assert!(transition.is_exit());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresenceTransition {
    pub device_id: DeviceId,
    /// The confirmed state being left
    pub from: Presence,
    /// The newly confirmed state
    pub to: Presence,
    /// Arrival time of the fix that confirmed the change
    pub timestamp: DateTime<Utc>,
    /// Consecutive agreeing readings at the moment of confirmation
    pub confirming_readings: u32,
}

impl PresenceTransition {
    /// Inside to Outside: the only change that raises an alert.
    pub fn is_exit(&self) -> bool {
        self.from == Presence::Inside && self.to == Presence::Outside
    }
}

/// Ordered, bounded history of confirmed transitions for one device.
///
/// Once `limit` transitions are held, recording a new one drops the oldest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresenceHistory {
    limit: usize,
    transitions: VecDeque<PresenceTransition>,
}

impl PresenceHistory {
    /// Create an empty history holding at most `limit` transitions.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            transitions: VecDeque::new(),
        }
    }

    /// Append a transition, dropping the oldest once full.
    pub fn record(&mut self, transition: PresenceTransition) {
        if self.limit == 0 {
            return;
        }
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// States traversed: the first recorded `from`, then every `to`.
    pub fn get_path(&self) -> Vec<Presence> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Time between the first and last retained transition.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Most recent transition
    pub fn last(&self) -> Option<&PresenceTransition> {
        self.transitions.back()
    }

    /// Retained transitions, oldest first
    pub fn transitions(&self) -> impl Iterator<Item = &PresenceTransition> {
        self.transitions.iter()
    }

    /// Number of retained transitions
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
