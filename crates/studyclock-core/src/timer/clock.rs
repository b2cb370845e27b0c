//! Clock source.
//!
//! The engine itself never reads the time. Callers own a [`Clock`] for
//! wall-clock instants (completion timestamps) and a [`WallTicker`] that
//! turns elapsed wall time into whole one-second ticks.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Converts wall-clock progress into 1 Hz ticks.
///
/// Sub-second remainders carry over so the tick count never drifts from
/// real elapsed time, even when the caller wakes late.
#[derive(Debug, Clone)]
pub struct WallTicker {
    anchor: DateTime<Utc>,
}

impl WallTicker {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { anchor: start }
    }

    /// Whole seconds elapsed since the last call. A clock that moved
    /// backwards yields 0 and re-anchors.
    pub fn due_ticks(&mut self, now: DateTime<Utc>) -> u64 {
        let elapsed = now - self.anchor;
        if elapsed < Duration::zero() {
            self.anchor = now;
            return 0;
        }
        let secs = elapsed.num_seconds();
        self.anchor += Duration::seconds(secs);
        secs as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_carries_sub_second_remainder() {
        let clock = ManualClock::new(Utc::now());
        let mut ticker = WallTicker::new(clock.now());

        clock.advance(Duration::milliseconds(1_500));
        assert_eq!(ticker.due_ticks(clock.now()), 1);

        clock.advance(Duration::milliseconds(600));
        assert_eq!(ticker.due_ticks(clock.now()), 1);

        clock.advance(Duration::milliseconds(900));
        assert_eq!(ticker.due_ticks(clock.now()), 1);
    }

    #[test]
    fn ticker_catches_up_after_late_wakeup() {
        let clock = ManualClock::new(Utc::now());
        let mut ticker = WallTicker::new(clock.now());
        clock.advance(Duration::seconds(7));
        assert_eq!(ticker.due_ticks(clock.now()), 7);
        assert_eq!(ticker.due_ticks(clock.now()), 0);
    }

    #[test]
    fn ticker_ignores_backwards_clock() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let mut ticker = WallTicker::new(clock.now());
        clock.set(start - Duration::seconds(30));
        assert_eq!(ticker.due_ticks(clock.now()), 0);
        clock.advance(Duration::seconds(2));
        assert_eq!(ticker.due_ticks(clock.now()), 2);
    }
}
