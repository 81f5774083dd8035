//! Validation of untrusted input before evaluation.
//!
//! Fixes and zones arrive from external collaborators and may be malformed.
//! Checks use stillwater's `Validation` to accumulate every defect instead of
//! stopping at the first, so diagnostics show the whole problem at once.
//!
//! # Example
//!
//! ```rust
//! use zonewatch::core::{Coordinate, SafeZone};
//! use zonewatch::validation::{into_result, validate_zone, InputViolation};
//!
//! let zone = SafeZone::new("z", "d", "Broken", Coordinate::new(120.0, 0.0), 0.0);
//! let violations = into_result(validate_zone(&zone)).unwrap_err();
//!
//! assert_eq!(violations.len(), 2);
//! assert!(violations.contains(&InputViolation::NonPositiveRadius { value: 0.0 }));
//! ```

pub mod rules;
pub mod violations;

pub use rules::{into_result, validate_coordinate, validate_fix, validate_zone, Checked};
pub use violations::InputViolation;
