//! Error types for LIFEGRID operations

use thiserror::Error;

/// Grid generation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Invalid granularity: {value:?} (expected week, month or year)")]
    InvalidGranularity { value: String },
}

/// Validation errors for identifiers and queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed block id {input:?}: {reason}")]
    MalformedBlockId { input: String, reason: String },

    #[error("Invalid date query {input:?} (expected YYYY-MM-DD, YYYY-MM or YYYY)")]
    InvalidDateQuery { input: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Persistence write failed for {store_key}: {reason}")]
    PersistenceWrite { store_key: String, reason: String },

    #[error("Persistence read failed for {store_key}: {reason}")]
    PersistenceRead { store_key: String, reason: String },

    #[error("Stored data for {store_key} is corrupt: {reason}")]
    Corrupt { store_key: String, reason: String },

    #[error("Store is not initialized: set a date of birth first")]
    Uninitialized,

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Master error type for all LIFEGRID errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifegridError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl LifegridError {
    /// True for a failed durable write whose in-memory mutation still stands.
    pub fn is_persistence_write(&self) -> bool {
        matches!(self, LifegridError::Storage(StorageError::PersistenceWrite { .. }))
    }
}

/// Result type alias for LIFEGRID operations.
pub type LifegridResult<T> = Result<T, LifegridError>;

// =============================================================================
// TESTS
// =============================================================================
