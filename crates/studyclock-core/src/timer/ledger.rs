//! Completion bookkeeping: streak, variance, unit totals, rates and a
//! single-level undo.
//!
//! Rates are snapshots. `units_per_hour` is recomputed when a completion is
//! recorded or undone and `rolling_units` only when one is recorded, so
//! between those events they show the value as of the last one. The
//! completion log is append-only; undo works from its own snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ActionError;

/// Streak never exceeds this many consecutive on-target completions.
pub const MAX_STREAK: u8 = 6;

/// Trailing window used for `rolling_units`.
pub const ROLLING_WINDOW_MIN: i64 = 60;

/// One completed study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub at: DateTime<Utc>,
    pub units: f64,
}

/// What a single undo reverts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    pub variance_secs: i64,
    pub units: f64,
    pub streak_before: u8,
}

/// Result of recording a completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOutcome {
    pub variance_secs: i64,
    pub units: f64,
    pub streak: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    cumulative_variance_secs: i64,
    completed_count: u32,
    total_units: f64,
    units_per_hour: f64,
    rolling_units: f64,
    streak: u8,
    records: Vec<CompletionRecord>,
    undo: Option<UndoSnapshot>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn cumulative_variance_secs(&self) -> i64 {
        self.cumulative_variance_secs
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn total_units(&self) -> f64 {
        self.total_units
    }

    pub fn units_per_hour(&self) -> f64 {
        self.units_per_hour
    }

    pub fn rolling_units(&self) -> f64 {
        self.rolling_units
    }

    pub fn streak(&self) -> u8 {
        self.streak
    }

    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    pub fn undo_snapshot(&self) -> Option<&UndoSnapshot> {
        self.undo.as_ref()
    }

    /// Mean variance over completed studies, in seconds.
    pub fn average_variance_secs(&self) -> f64 {
        if self.completed_count == 0 {
            return 0.0;
        }
        self.cumulative_variance_secs as f64 / self.completed_count as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record a completed study and refresh the rate snapshots.
    pub fn record(
        &mut self,
        variance_secs: i64,
        units: f64,
        session_secs: u64,
        now: DateTime<Utc>,
    ) -> CompletionOutcome {
        let streak_before = self.streak;
        self.streak = if variance_secs <= 0 {
            (self.streak + 1).min(MAX_STREAK)
        } else {
            0
        };

        self.undo = Some(UndoSnapshot {
            variance_secs,
            units,
            streak_before,
        });

        self.cumulative_variance_secs += variance_secs;
        self.total_units += units;
        self.completed_count += 1;
        self.records.push(CompletionRecord { at: now, units });
        self.units_per_hour = units_per_hour(self.total_units, session_secs);
        self.rolling_units = rolling_units(&self.records, now);

        CompletionOutcome {
            variance_secs,
            units,
            streak: self.streak,
        }
    }

    /// Revert the most recent completion. The snapshot is consumed; the
    /// completion log and `rolling_units` are left as they are.
    pub fn undo(&mut self, session_secs: u64) -> Result<UndoSnapshot, ActionError> {
        let snapshot = self.undo.take().ok_or(ActionError::NothingToUndo)?;

        self.cumulative_variance_secs -= snapshot.variance_secs;
        self.total_units -= snapshot.units;
        self.streak = snapshot.streak_before;
        self.completed_count = self.completed_count.saturating_sub(1);
        self.units_per_hour = units_per_hour(self.total_units, session_secs);

        Ok(snapshot)
    }
}

/// `total / hours`, or 0 when no session time has elapsed.
pub fn units_per_hour(total_units: f64, session_secs: u64) -> f64 {
    if session_secs == 0 {
        return 0.0;
    }
    total_units / (session_secs as f64 / 3600.0)
}

/// Sum of records stamped within the trailing window ending at `now`.
pub fn rolling_units(records: &[CompletionRecord], now: DateTime<Utc>) -> f64 {
    let cutoff = now - Duration::minutes(ROLLING_WINDOW_MIN);
    records
        .iter()
        .filter(|r| r.at >= cutoff && r.at <= now)
        .map(|r| r.units)
        .sum()
}
