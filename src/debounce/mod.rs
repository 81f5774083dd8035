//! Transition debouncing.
//!
//! Turns a noisy stream of raw inside/outside readings into a stable signal
//! per device. A change of the confirmed state needs:
//!
//! - a reading that disagrees with the confirmed state,
//! - `required_consecutive_readings` agreeing readings in a row, and
//! - at least `minimum_transition_interval` since the last confirmed change.
//!
//! # Example
//!
//! ```rust
//! use zonewatch::core::DeviceId;
//! use zonewatch::debounce::{ReadingOutcome, TransitionRules, ZoneMembershipState};
//! use chrono::{Duration, Utc};
//!
//! let device = DeviceId::new("dev-1");
//! let rules = TransitionRules::default();
//! let start = Utc::now();
//! let mut state = ZoneMembershipState::initial(true, start);
//!
//! let mut outcome = ReadingOutcome::Steady(state.stable());
//! for i in 1..=3 {
//!     outcome = state.ingest(&device, false, start + Duration::seconds(40 * i), &rules);
//! }
//!
//! assert!(outcome.transition().is_some_and(|t| t.is_exit()));
//! ```

pub mod config;
pub mod rules;
pub mod state;
pub mod table;

pub use config::{DebounceConfig, DebounceConfigBuilder};
pub use rules::{EligibilityContext, HoldReason, TransitionRules};
pub use state::{ReadingOutcome, ZoneMembershipState};
pub use table::{MembershipTable, TrackedDevice};
