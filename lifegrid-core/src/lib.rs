//! LIFEGRID Core - Types and Grid Generation
//!
//! Pure data structures and computation for the life calendar. All other
//! crates depend on this. Nothing here performs I/O apart from reading a
//! configuration file on request.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod grid;
pub mod identity;
pub mod query;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{LifegridConfig, DEFAULT_DATA_DIR, DEFAULT_STORE_KEY};
pub use entities::{Block, BlockPatch, ProfilePatch, StoreRoot, UserProfile};
pub use enums::{Classification, Granularity, Visibility, VisibilityParseError};
pub use error::{
    ConfigError, GridError, LifegridError, LifegridResult, StorageError, ValidationError,
};
pub use grid::{
    generate, generate_from_str, generate_today, locate, parse_date_of_birth, period_start,
    GridSummary, Horizon, LifeGrid, TimeUnit, DEFAULT_HORIZON_YEARS, MAX_HORIZON_YEARS,
};
pub use identity::BlockId;
pub use query::{
    search_blocks, tag_counts, tag_suggestions, DateQuery, DEFAULT_TAG_SUGGESTION_LIMIT,
};

/// Calendar date type used throughout.
pub type Date = chrono::NaiveDate;
