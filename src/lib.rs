//! Zonewatch: debounced geofence transition detection
//!
//! Zonewatch watches a stream of location fixes, decides for every tracked
//! device whether it is inside one of its safe zones, and raises an alert
//! when a device leaves. Raw readings near a zone boundary jitter; a change
//! is only confirmed after several agreeing readings and a cooldown, so one
//! real exit produces exactly one alert.
//!
//! # Core Concepts
//!
//! - **Membership**: A fix is inside a zone when it lies within the zone
//!   radius plus a buffer
//! - **Debouncing**: Per-device counters and a cooldown turn raw readings
//!   into a stable presence
//! - **Ports**: A directory, a location feed and a notification sink are
//!   supplied by the host
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use zonewatch::core::{Coordinate, Device, LocationFix};
//! use zonewatch::ports::{ChannelSink, InMemoryDirectory};
//! use zonewatch::Detector;
//!
//! let home = Coordinate::new(51.5007, -0.1246);
//! let directory = Arc::new(InMemoryDirectory::new());
//! directory.register_device(Device::new("tracker-7", "owner-1", "Rex")).unwrap();
//! directory.create_zone(&"tracker-7".into(), "Garden", home, 100.0, None).unwrap();
//!
//! let (sink, _alerts) = ChannelSink::new();
//! let mut detector = Detector::builder()
//!     .directory(directory)
//!     .sink(Arc::new(sink))
//!     .build()
//!     .unwrap();
//!
//! let start = Utc::now();
//! detector.evaluate_fix(&LocationFix::new(home, start));
//!
//! let away = home.destination(45.0, 250.0);
//! let mut alerts = Vec::new();
//! for i in 1..=3 {
//!     let outcome = detector.evaluate_fix(&LocationFix::new(away, start + Duration::seconds(40 * i)));
//!     alerts.extend(outcome.notifications);
//! }
//!
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].text, "Rex has exited the safe zone!");
//! ```

pub mod core;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod membership;
pub mod monitor;
pub mod ports;
pub mod validation;

// Re-export commonly used types
pub use crate::core::{Coordinate, Device, DeviceId, LocationFix, Presence, SafeZone, SafeZoneId};
pub use crate::debounce::DebounceConfig;
pub use crate::detector::{Detector, DetectorBuilder, FixOutcome};
pub use crate::monitor::{Monitor, MonitorHandle};
