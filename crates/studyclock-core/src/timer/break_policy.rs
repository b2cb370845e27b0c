//! Break suggestions.
//!
//! After each completion the policy checks how long the user has gone
//! without a break. A suggestion fires once `threshold_min` has passed and,
//! if the user declined earlier, at least `cooldown_min` more has passed
//! since that decline. Nothing is ever forced.

use serde::{Deserialize, Serialize};

/// Thresholds for break suggestions, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPolicy {
    #[serde(default = "default_threshold_min")]
    pub threshold_min: u64,
    #[serde(default = "default_cooldown_min")]
    pub cooldown_min: u64,
}

fn default_threshold_min() -> u64 {
    120
}
fn default_cooldown_min() -> u64 {
    60
}

impl Default for BreakPolicy {
    fn default() -> Self {
        Self {
            threshold_min: default_threshold_min(),
            cooldown_min: default_cooldown_min(),
        }
    }
}

/// Counters the policy reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPolicyState {
    /// Accrues while the session clock runs and no break is active.
    pub secs_since_break: u64,
    /// `secs_since_break` at the last declined suggestion; 0 if none since
    /// the last break.
    pub decline_mark_secs: u64,
}

impl BreakPolicyState {
    pub fn on_break_started(&mut self) {
        self.secs_since_break = 0;
        self.decline_mark_secs = 0;
    }

    pub fn on_declined(&mut self) {
        self.decline_mark_secs = self.secs_since_break;
    }

    pub fn minutes_since_break(&self) -> f64 {
        self.secs_since_break as f64 / 60.0
    }

    pub fn minutes_since_decline(&self) -> f64 {
        if self.decline_mark_secs > 0 {
            self.secs_since_break.saturating_sub(self.decline_mark_secs) as f64 / 60.0
        } else {
            self.minutes_since_break()
        }
    }
}

impl BreakPolicy {
    pub fn should_suggest(&self, state: &BreakPolicyState) -> bool {
        state.minutes_since_break() >= self.threshold_min as f64
            && state.minutes_since_decline() >= self.cooldown_min as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(secs_since_break: u64, decline_mark_secs: u64) -> BreakPolicyState {
        BreakPolicyState {
            secs_since_break,
            decline_mark_secs,
        }
    }

    #[test]
    fn quiet_before_threshold() {
        let policy = BreakPolicy::default();
        assert!(!policy.should_suggest(&state(7_199, 0)));
        assert!(policy.should_suggest(&state(7_200, 0)));
    }

    #[test]
    fn decline_starts_cooldown() {
        let policy = BreakPolicy::default();
        let mut s = state(7_200, 0);
        s.on_declined();
        assert_eq!(s.decline_mark_secs, 7_200);
        assert!(!policy.should_suggest(&s));

        s.secs_since_break = 7_200 + 3_599;
        assert!(!policy.should_suggest(&s));
        s.secs_since_break = 7_200 + 3_600;
        assert!(policy.should_suggest(&s));
    }

    #[test]
    fn break_clears_both_counters() {
        let mut s = state(9_000, 7_200);
        s.on_break_started();
        assert_eq!(s, BreakPolicyState::default());
    }

    #[test]
    fn custom_thresholds() {
        let policy = BreakPolicy {
            threshold_min: 50,
            cooldown_min: 10,
        };
        assert!(policy.should_suggest(&state(3_000, 0)));
        assert!(!policy.should_suggest(&state(3_000, 2_999)));
    }
}
