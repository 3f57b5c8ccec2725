//! Core error types for hearth-core.
//!
//! Validation failures are returned synchronously as [`EconomyError`] and
//! never leave partial state behind. Remote I/O failures are [`SyncError`];
//! the economy facade swallows them for background writes and only surfaces
//! them where a caller explicitly waits (account deletion).

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::model::Consumable;
use crate::sync::SyncError;

/// Core error type for hearth-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected economy operation
    #[error("{0}")]
    Economy(#[from] EconomyError),

    /// Remote store failure
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local mirror failure
    #[error("Mirror error: {0}")]
    Mirror(#[from] rusqlite::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an economy operation was refused.
///
/// The `Display` text is the reason shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EconomyError {
    #[error("insufficient funds: need {needed} coins, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("wager amount must be greater than zero")]
    InvalidWagerAmount,

    #[error("wager duration must be between {min} and {max} days (got {days})")]
    InvalidWagerDuration { days: u32, min: u32, max: u32 },

    #[error("a wager is already running")]
    WagerAlreadyActive,

    #[error("there are no active habits")]
    NoActiveHabits,

    #[error("no {0} left")]
    NoneLeft(Consumable),

    #[error("you can hold at most {max} of {kind}")]
    ConsumableCapReached { kind: Consumable, max: u32 },

    #[error("'{0}' is already owned")]
    AlreadyOwned(String),

    #[error("'{0}' has not been unlocked")]
    NotUnlocked(String),

    #[error("habit was already completed today")]
    AlreadyCompletedToday,

    #[error("habit slots are capped at {max}")]
    SlotCapReached { max: u32 },

    #[error("all {max} habit slots are in use")]
    HabitLimitReached { max: u32 },

    #[error("habit {0} not found")]
    HabitNotFound(Uuid),

    #[error("unknown shop item '{0}'")]
    UnknownItem(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
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

    /// Data directory could not be resolved
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
