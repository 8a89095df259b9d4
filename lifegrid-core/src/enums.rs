//! Enum types for LIFEGRID entities

use crate::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// GRANULARITY
// ============================================================================

/// Time resolution of the life grid.
///
/// Serialized in the plural form used by the persisted view mode
/// (`"weeks"`, `"months"`, `"years"`); parsing accepts either form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Granularity {
    #[default]
    #[serde(rename = "weeks", alias = "week")]
    Week,
    #[serde(rename = "months", alias = "month")]
    Month,
    #[serde(rename = "years", alias = "year")]
    Year,
}

impl Granularity {
    /// All granularities in grid order.
    pub const ALL: [Granularity; 3] = [Granularity::Week, Granularity::Month, Granularity::Year];

    /// Units per year of life at this granularity.
    pub fn units_per_year(&self) -> u32 {
        match self {
            Granularity::Week => 52,
            Granularity::Month => 12,
            Granularity::Year => 1,
        }
    }

    /// Cells per grid row when laid out for display.
    pub fn columns(&self) -> usize {
        match self {
            Granularity::Week => 52,
            Granularity::Month => 12,
            Granularity::Year => 10,
        }
    }

    /// Prefix used in block identifiers.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Parse from user-facing text (`week`, `weeks`, `Month`, ...).
    pub fn from_db_str(s: &str) -> Result<Self, GridError> {
        match s.trim().to_lowercase().as_str() {
            "week" | "weeks" => Ok(Granularity::Week),
            "month" | "months" => Ok(Granularity::Month),
            "year" | "years" => Ok(Granularity::Year),
            _ => Err(GridError::InvalidGranularity {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id_prefix())
    }
}

impl FromStr for Granularity {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Position of a time unit relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Classification {
    Past,
    Current,
    Future,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Past => "past",
            Classification::Current => "current",
            Classification::Future => "future",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VISIBILITY
// ============================================================================

/// Who may see a block. `Friends` is stored but not enforced anywhere yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Friends,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
            Visibility::Friends => "friends",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid visibility string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityParseError(pub String);

impl fmt::Display for VisibilityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid visibility: {}", self.0)
    }
}

impl std::error::Error for VisibilityParseError {}

impl FromStr for Visibility {
    type Err = VisibilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "friends" => Ok(Visibility::Friends),
            _ => Err(VisibilityParseError(s.to_string())),
        }
    }
}
