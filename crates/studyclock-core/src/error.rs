//! Core error types for studyclock-core.
//!
//! Two families live here: [`CoreError`] for I/O and configuration failures,
//! and [`ActionError`] for user actions whose preconditions are unmet. The
//! latter never indicate a fault; the engine leaves its state untouched and
//! the caller shows the message.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::ActivityCategory;

/// Core error type for studyclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write errors
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// A user action was invoked while its precondition was unmet.
///
/// The engine performs no mutation when it returns one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("no study selected")]
    NoSelection,

    #[error("no timer started for the selected study")]
    NoTimerStarted,

    #[error("no prior completion to undo")]
    NothingToUndo,

    #[error("work timer is not running")]
    NotWorking,

    #[error("{0} is not active")]
    NotActive(ActivityCategory),

    #[error("another study is in progress")]
    StudyInProgress,

    #[error("draft slot already holds a study")]
    DraftOccupied,

    #[error("draft slot is empty")]
    NoDraft,

    #[error("stop the work timer before resuming the draft")]
    WorkingActive,

    #[error("no break suggestion is pending")]
    NoBreakSuggested,
}

impl ActionError {
    /// Conditions the caller must surface as a blocking prompt rather than a
    /// passing notice.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ActionError::NoSelection | ActionError::NoTimerStarted | ActionError::NothingToUndo
        )
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
