//! Identity types for LIFEGRID blocks
//!
//! A [`BlockId`] addresses one cell of the grid. The numbering is relative to
//! the date of birth: `year_0` is the first year of life, `month_3_11` the
//! twelfth month of the fourth year, `week_24_0` the first week of the
//! twenty-fifth year. The same id therefore always names the same position
//! in the sequence, whatever the calendar year.
//!
//! Text form is canonical: `parse(s).to_string() == s` for every accepted `s`.

use crate::{Granularity, ValidationError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a time unit's content.
///
/// Stored as granularity plus zero-based sequence index; ordering follows
/// granularity (week < month < year) and then grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId {
    granularity: Granularity,
    index: u32,
}

impl BlockId {
    /// Build from a granularity and a zero-based sequence index.
    pub fn from_index(granularity: Granularity, index: u32) -> Self {
        Self { granularity, index }
    }

    /// `week_<age>_<week>`, with `week` in `0..52`.
    pub fn week(age: u32, week: u32) -> Result<Self, ValidationError> {
        Self::from_coordinates(Granularity::Week, age, week, &format!("week_{}_{}", age, week))
    }

    /// `month_<age>_<month>`, with `month` in `0..12`.
    pub fn month(age: u32, month: u32) -> Result<Self, ValidationError> {
        Self::from_coordinates(Granularity::Month, age, month, &format!("month_{}_{}", age, month))
    }

    /// `year_<age>`.
    pub fn year(age: u32) -> Self {
        Self::from_index(Granularity::Year, age)
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Zero-based position in the lifespan sequence.
    pub fn sequence_index(&self) -> u32 {
        self.index
    }

    /// Whole years of life preceding this unit.
    pub fn age(&self) -> u32 {
        self.index / self.granularity.units_per_year()
    }

    /// Week or month within the year of life; `None` for year ids.
    pub fn unit_in_year(&self) -> Option<u32> {
        match self.granularity {
            Granularity::Year => None,
            g => Some(self.index % g.units_per_year()),
        }
    }

    /// Parse the canonical text form.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let malformed = |reason: &str| ValidationError::MalformedBlockId {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = input.split('_');
        let prefix = parts.next().unwrap_or_default();
        let granularity = match prefix {
            "week" => Granularity::Week,
            "month" => Granularity::Month,
            "year" => Granularity::Year,
            _ => return Err(malformed("unknown prefix (expected week, month or year)")),
        };

        let numbers = parts
            .map(|p| {
                parse_coordinate(p).ok_or_else(|| {
                    malformed("coordinates must be unsigned decimals without leading zeros")
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        match (granularity, numbers.as_slice()) {
            (Granularity::Year, [age]) => Ok(Self::year(*age)),
            (Granularity::Year, _) => Err(malformed("year ids take exactly one coordinate")),
            (g, [age, unit]) => Self::from_coordinates(g, *age, *unit, input),
            (_, _) => Err(malformed("week and month ids take exactly two coordinates")),
        }
    }

    fn from_coordinates(
        granularity: Granularity,
        age: u32,
        unit: u32,
        input: &str,
    ) -> Result<Self, ValidationError> {
        let per_year = granularity.units_per_year();
        if unit >= per_year {
            return Err(ValidationError::MalformedBlockId {
                input: input.to_string(),
                reason: format!("{} coordinate must be below {}", granularity, per_year),
            });
        }
        let index = age
            .checked_mul(per_year)
            .and_then(|base| base.checked_add(unit))
            .ok_or_else(|| ValidationError::MalformedBlockId {
                input: input.to_string(),
                reason: "coordinate out of range".to_string(),
            })?;
        Ok(Self { granularity, index })
    }
}

fn parse_coordinate(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit_in_year() {
            Some(unit) => write!(f, "{}_{}_{}", self.granularity.id_prefix(), self.age(), unit),
            None => write!(f, "{}_{}", self.granularity.id_prefix(), self.age()),
        }
    }
}

impl FromStr for BlockId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for BlockId {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BlockId::parse(&raw).map_err(de::Error::custom)
    }
}
