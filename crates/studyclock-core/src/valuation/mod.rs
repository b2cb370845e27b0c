//! Target durations and unit values for studies.
//!
//! [`ValuationConfig`] holds the user-editable tables; [`target_duration`]
//! and [`unit_value`] are pure functions over it. Missing or malformed
//! entries count as zero so a half-edited table never breaks a session.

mod engine;
mod table;

pub use engine::{target_duration, unit_value};
pub use table::{UnitWeight, ValuationConfig, LEGACY_KEYS};
