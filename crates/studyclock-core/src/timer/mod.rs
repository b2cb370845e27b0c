mod break_policy;
mod category;
pub mod clock;
mod engine;
mod ledger;

pub use break_policy::{BreakPolicy, BreakPolicyState};
pub use category::{ActivityCategory, CategoryTotals, EventCounters};
pub use clock::{Clock, ManualClock, SystemClock, WallTicker};
pub use engine::{Action, DraftSlot, SessionEngine};
pub use ledger::{
    rolling_units, units_per_hour, CompletionOutcome, CompletionRecord, Ledger, UndoSnapshot,
    MAX_STREAK, ROLLING_WINDOW_MIN,
};
