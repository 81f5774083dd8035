//! Per-device debounce state machine.
//!
//! Each tracked device owns one [`ZoneMembershipState`]. Every determinate
//! reading updates its counters; a change of the confirmed state happens
//! only when [`TransitionRules`] find the reading eligible.
//!
//! After any reading exactly one of the two counters is nonzero.

use crate::core::{DeviceId, Presence, PresenceTransition};
use crate::debounce::rules::{EligibilityContext, HoldReason, TransitionRules};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;

/// Debounced membership of one device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneMembershipState {
    /// Last confirmed state
    pub stable_inside: bool,
    pub last_transition_at: DateTime<Utc>,
    pub consecutive_inside_count: u32,
    pub consecutive_outside_count: u32,
}

/// What a single reading did to the state
#[derive(Clone, Debug, PartialEq)]
pub enum ReadingOutcome {
    /// First reading for the device; sets the confirmed state silently
    Initialized(Presence),
    /// Reading agrees with the confirmed state
    Steady(Presence),
    /// Reading disagrees, but the change is not yet confirmed
    Pending {
        stable: Presence,
        raw: Presence,
        reasons: Vec<HoldReason>,
    },
    /// The change was confirmed by this reading
    Transitioned(PresenceTransition),
}

impl ReadingOutcome {
    /// The confirmed transition, if this reading produced one
    pub fn transition(&self) -> Option<&PresenceTransition> {
        match self {
            Self::Transitioned(transition) => Some(transition),
            _ => None,
        }
    }
}

impl ZoneMembershipState {
    /// State derived from the first reading of a device.
    ///
    /// The reading counts toward its own counter and the cooldown starts at
    /// `now`, so the first confirmed change also waits out the interval.
    pub fn initial(raw_inside: bool, now: DateTime<Utc>) -> Self {
        Self {
            stable_inside: raw_inside,
            last_transition_at: now,
            consecutive_inside_count: u32::from(raw_inside),
            consecutive_outside_count: u32::from(!raw_inside),
        }
    }

    /// Get the confirmed presence
    pub fn stable(&self) -> Presence {
        Presence::from_inside(self.stable_inside)
    }

    /// Consecutive readings agreeing with `raw_inside`.
    pub fn agreeing_readings(&self, raw_inside: bool) -> u32 {
        if raw_inside {
            self.consecutive_inside_count
        } else {
            self.consecutive_outside_count
        }
    }

    fn count_reading(&mut self, raw_inside: bool) {
        if raw_inside {
            self.consecutive_inside_count = self.consecutive_inside_count.saturating_add(1);
            self.consecutive_outside_count = 0;
        } else {
            self.consecutive_outside_count = self.consecutive_outside_count.saturating_add(1);
            self.consecutive_inside_count = 0;
        }
    }

    /// Feed one determinate reading taken at `now`.
    ///
    /// Counters always update. The confirmed state and `last_transition_at`
    /// change only when every rule passes.
    pub fn ingest(
        &mut self,
        device_id: &DeviceId,
        raw_inside: bool,
        now: DateTime<Utc>,
        rules: &TransitionRules,
    ) -> ReadingOutcome {
        self.count_reading(raw_inside);

        let stable = self.stable();
        let raw = Presence::from_inside(raw_inside);
        let context = EligibilityContext {
            stable,
            raw,
            agreeing_readings: self.agreeing_readings(raw_inside),
            since_last_transition: now
                .signed_duration_since(self.last_transition_at)
                .to_std()
                .unwrap_or(Duration::ZERO),
        };

        match rules.check(&context) {
            Validation::Success(_) => {
                self.stable_inside = raw_inside;
                self.last_transition_at = now;
                ReadingOutcome::Transitioned(PresenceTransition {
                    device_id: device_id.clone(),
                    from: stable,
                    to: raw,
                    timestamp: now,
                    confirming_readings: context.agreeing_readings,
                })
            }
            Validation::Failure(_) if raw == stable => ReadingOutcome::Steady(stable),
            Validation::Failure(reasons) => ReadingOutcome::Pending {
                stable,
                raw,
                reasons: reasons.iter().cloned().collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn device() -> DeviceId {
        DeviceId::new("dev")
    }

    fn at(start: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        start + ChronoDuration::seconds(secs)
    }

    fn feed(
        state: &mut ZoneMembershipState,
        readings: &[(bool, i64)],
        start: DateTime<Utc>,
    ) -> Vec<ReadingOutcome> {
        let rules = TransitionRules::default();
        readings
            .iter()
            .map(|(inside, secs)| state.ingest(&device(), *inside, at(start, *secs), &rules))
            .collect()
    }

    fn transitions(outcomes: &[ReadingOutcome]) -> usize {
        outcomes.iter().filter(|o| o.transition().is_some()).count()
    }

    #[test]
    fn initial_state_follows_first_reading() {
        let now = Utc::now();
        let state = ZoneMembershipState::initial(true, now);

        assert!(state.stable_inside);
        assert_eq!(state.last_transition_at, now);
        assert_eq!(state.consecutive_inside_count, 1);
        assert_eq!(state.consecutive_outside_count, 0);
    }

    #[test]
    fn third_outside_reading_confirms_exit() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);

        let outcomes = feed(&mut state, &[(false, 40), (false, 50), (false, 60)], start);

        assert!(matches!(outcomes[0], ReadingOutcome::Pending { .. }));
        assert!(matches!(outcomes[1], ReadingOutcome::Pending { .. }));
        let transition = outcomes[2].transition().unwrap();
        assert!(transition.is_exit());
        assert_eq!(transition.confirming_readings, 3);
        assert!(!state.stable_inside);
        assert_eq!(state.last_transition_at, at(start, 60));
    }

    #[test]
    fn single_outside_blip_is_absorbed() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);

        let outcomes = feed(
            &mut state,
            &[(false, 1), (true, 2), (true, 3), (true, 4), (true, 5)],
            start,
        );

        assert_eq!(transitions(&outcomes), 0);
        assert!(state.stable_inside);
        assert_eq!(state.consecutive_inside_count, 4);
        assert_eq!(state.consecutive_outside_count, 0);
    }

    #[test]
    fn cooldown_defers_transition_until_interval_elapses() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);

        let outcomes = feed(
            &mut state,
            &[(false, 5), (false, 10), (false, 15), (false, 20), (false, 31)],
            start,
        );

        assert_eq!(transitions(&outcomes), 1);
        assert!(outcomes[4].transition().is_some());
        match &outcomes[2] {
            ReadingOutcome::Pending { reasons, .. } => {
                assert_eq!(reasons.len(), 1);
                assert!(matches!(reasons[0], HoldReason::CooldownActive { .. }));
            }
            other => panic!("Expected pending, got {other:?}"),
        }
    }

    #[test]
    fn back_to_back_changes_collapse_inside_cooldown() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);

        let outcomes = feed(
            &mut state,
            &[
                (false, 40),
                (false, 41),
                (false, 42),
                (true, 43),
                (true, 44),
                (true, 45),
            ],
            start,
        );

        assert_eq!(transitions(&outcomes), 1);
        assert!(!state.stable_inside);
        assert_eq!(state.consecutive_inside_count, 3);

        // The re-entry confirms on the first agreeing reading past the cooldown.
        let later = feed(&mut state, &[(true, 72)], start);
        let transition = later[0].transition().unwrap();
        assert_eq!(transition.to, Presence::Inside);
        assert_eq!(transition.confirming_readings, 4);
    }

    #[test]
    fn agreeing_reading_is_steady() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(false, start);

        let outcomes = feed(&mut state, &[(false, 100)], start);
        assert_eq!(outcomes[0], ReadingOutcome::Steady(Presence::Outside));
    }

    #[test]
    fn clock_going_backwards_counts_as_no_time_elapsed() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);

        let outcomes = feed(&mut state, &[(false, -100), (false, -90), (false, -80)], start);

        assert_eq!(transitions(&outcomes), 0);
        assert!(state.stable_inside);
    }

    #[test]
    fn exactly_one_counter_is_nonzero_after_each_reading() {
        let start = Utc::now();
        let mut state = ZoneMembershipState::initial(true, start);
        let rules = TransitionRules::default();

        for (i, inside) in [true, false, false, true, false, true, true].iter().enumerate() {
            state.ingest(&device(), *inside, at(start, i as i64 * 15), &rules);
            let nonzero = [state.consecutive_inside_count, state.consecutive_outside_count]
                .iter()
                .filter(|c| **c != 0)
                .count();
            assert_eq!(nonzero, 1);
        }
    }
}
