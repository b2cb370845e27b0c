use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::study::{Selection, StudyKind};
use crate::timer::{ActivityCategory, CategoryTotals, EventCounters};

/// Every state change in the session produces one or more Events.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The session clock started with the first study.
    SessionStarted,
    SelectionChanged {
        selection: Selection,
        target_secs: u64,
        units: f64,
    },
    WorkStarted {
        kind: StudyKind,
        elapsed_secs: u64,
        target_secs: u64,
        /// Started by the auto-start preference or by resuming after an
        /// interruption rather than by an explicit command.
        automatic: bool,
    },
    WorkPaused {
        elapsed_secs: u64,
        automatic: bool,
    },
    StudyCompleted {
        kind: StudyKind,
        elapsed_secs: u64,
        target_secs: u64,
        variance_secs: i64,
        units: f64,
        streak: u8,
        at: DateTime<Utc>,
    },
    CompletionUndone {
        variance_secs: i64,
        units: f64,
        streak: u8,
    },
    StudyDiscarded {
        elapsed_secs: u64,
    },
    CategoryStarted {
        category: ActivityCategory,
    },
    CategoryStopped {
        category: ActivityCategory,
        /// Seconds spent in this stint of the category.
        duration_secs: u64,
    },
    BreakSuggested {
        minutes_since_break: u64,
    },
    BreakDeclined {
        minutes_since_break: u64,
    },
    DraftSaved {
        selection: Selection,
        elapsed_secs: u64,
        target_secs: u64,
    },
    DraftResumed {
        selection: Selection,
        elapsed_secs: u64,
    },
    StateSnapshot {
        category: Option<ActivityCategory>,
        paused: bool,
        auto_paused: bool,
        selection: Selection,
        elapsed_secs: u64,
        target_secs: u64,
        session_secs: u64,
        secs_since_break: u64,
        completed_count: u32,
        cumulative_variance_secs: i64,
        total_units: f64,
        units_per_hour: f64,
        rolling_units: f64,
        streak: u8,
        totals: CategoryTotals,
        counters: EventCounters,
        draft: Option<Selection>,
        break_pending: bool,
    },
}
