//! # studyclock Core Library
//!
//! Business logic for a single-user work-session dashboard: it times studies,
//! classifies the rest of the session into exclusive activity categories and
//! keeps productivity metrics. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session Engine**: a tick-driven reducer. The caller invokes `tick()`
//!   once per real second and applies user actions between ticks
//! - **Valuation**: pure functions deriving target duration and unit value
//!   from editable tables
//! - **Ledger**: streak, variance, unit totals, rates and a single undo
//! - **Break Policy**: threshold/cooldown suggestion of breaks
//! - **Storage**: TOML configuration and CSV exchange of the valuation tables
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: activity state machine
//! - [`ValuationConfig`]: target seconds and unit values per kind/modifier
//! - [`Config`]: persisted preferences, break thresholds and valuation
//! - [`Event`]: emitted by every transition

pub mod error;
pub mod events;
pub mod format;
pub mod storage;
pub mod study;
pub mod timer;
pub mod valuation;

pub use error::{ActionError, ConfigError, CoreError};
pub use events::Event;
pub use storage::{Config, ConfigFile, Preference, PreferenceStore, Preferences, ValuationStore};
pub use study::{Modifier, Selection, StudyKind};
pub use timer::{Action, ActivityCategory, BreakPolicy, SessionEngine};
pub use valuation::{target_duration, unit_value, ValuationConfig};
