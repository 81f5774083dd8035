//! Eligibility rules for confirming a presence change.
//!
//! A change is confirmed only when every rule passes. Rules are checked with
//! stillwater's `Validation` so a held change reports ALL reasons it was held,
//! not just the first.

use crate::core::Presence;
use crate::debounce::config::DebounceConfig;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Why a reading did not confirm a change
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HoldReason {
    #[error("Reading agrees with confirmed state '{stable}'")]
    AgreesWithStable { stable: Presence },

    #[error("Only {observed} of {required} consecutive readings agree")]
    InsufficientReadings { required: u32, observed: u32 },

    #[error("Cooldown active for another {remaining:?}")]
    CooldownActive { remaining: Duration },
}

/// Snapshot handed to the rules for one reading
#[derive(Clone, Debug, PartialEq)]
pub struct EligibilityContext {
    pub stable: Presence,
    pub raw: Presence,
    /// Consecutive readings agreeing with `raw`, this one included
    pub agreeing_readings: u32,
    /// Time since the last confirmed change (zero if the clock went backwards)
    pub since_last_transition: Duration,
}

/// Outcome of checking every rule
pub type Eligibility = Validation<(), NonEmptyVec<HoldReason>>;

/// Thresholds a reading must clear before a change is confirmed.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRules {
    required_readings: u32,
    minimum_interval: Duration,
}

impl TransitionRules {
    /// Rules with explicit thresholds
    pub fn new(required_readings: u32, minimum_interval: Duration) -> Self {
        Self {
            required_readings,
            minimum_interval,
        }
    }

    /// Rules taken from a debounce configuration
    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(
            config.required_consecutive_readings,
            config.minimum_transition_interval,
        )
    }

    /// Agreeing readings needed to confirm a change
    pub fn required_readings(&self) -> u32 {
        self.required_readings
    }

    /// Cooldown between confirmed changes
    pub fn minimum_interval(&self) -> Duration {
        self.minimum_interval
    }

    /// Check all rules, accumulating every hold reason.
    pub fn check(&self, context: &EligibilityContext) -> Eligibility {
        let mut checks: Vec<Eligibility> = Vec::new();

        checks.push(if context.raw == context.stable {
            Validation::fail(HoldReason::AgreesWithStable {
                stable: context.stable,
            })
        } else {
            Validation::success(())
        });

        checks.push(if context.agreeing_readings < self.required_readings {
            Validation::fail(HoldReason::InsufficientReadings {
                required: self.required_readings,
                observed: context.agreeing_readings,
            })
        } else {
            Validation::success(())
        });

        checks.push(if context.since_last_transition < self.minimum_interval {
            Validation::fail(HoldReason::CooldownActive {
                remaining: self.minimum_interval - context.since_last_transition,
            })
        } else {
            Validation::success(())
        });

        Validation::all_vec(checks).map(|_| ())
    }
}

impl Default for TransitionRules {
    fn default() -> Self {
        Self::from_config(&DebounceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(stable: Presence, raw: Presence, readings: u32, secs: u64) -> EligibilityContext {
        EligibilityContext {
            stable,
            raw,
            agreeing_readings: readings,
            since_last_transition: Duration::from_secs(secs),
        }
    }

    #[test]
    fn eligible_when_all_rules_pass() {
        let rules = TransitionRules::default();
        let result = rules.check(&context(Presence::Inside, Presence::Outside, 3, 30));
        assert!(result.is_success());
    }

    #[test]
    fn hold_accumulates_all_reasons() {
        let rules = TransitionRules::default();
        let result = rules.check(&context(Presence::Inside, Presence::Inside, 1, 5));

        match result {
            Validation::Failure(reasons) => {
                assert_eq!(reasons.len(), 3);
                assert!(reasons
                    .iter()
                    .any(|r| matches!(r, HoldReason::AgreesWithStable { .. })));
                assert!(reasons.iter().any(|r| matches!(
                    r,
                    HoldReason::InsufficientReadings {
                        required: 3,
                        observed: 1
                    }
                )));
                assert!(reasons.iter().any(|r| matches!(
                    r,
                    HoldReason::CooldownActive { remaining } if *remaining == Duration::from_secs(25)
                )));
            }
            Validation::Success(_) => panic!("Expected holds, got success"),
        }
    }

    #[test]
    fn cooldown_alone_holds_a_change() {
        let rules = TransitionRules::default();
        let result = rules.check(&context(Presence::Inside, Presence::Outside, 10, 29));

        assert!(result.is_failure());
        if let Validation::Failure(reasons) = result {
            assert_eq!(reasons.len(), 1);
        }
    }

    #[test]
    fn readings_alone_hold_a_change() {
        let rules = TransitionRules::default();
        let result = rules.check(&context(Presence::Outside, Presence::Inside, 2, 600));
        assert!(result.is_failure());
    }

    #[test]
    fn custom_thresholds_apply() {
        let rules = TransitionRules::new(1, Duration::ZERO);
        assert!(rules
            .check(&context(Presence::Outside, Presence::Inside, 1, 0))
            .is_success());
    }
}
