//! Search over stored blocks: by date, by content, and tag suggestions.

use crate::{grid, Block, BlockId, Granularity, Horizon, ValidationError};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Default number of tag suggestions offered while typing.
pub const DEFAULT_TAG_SUGGESTION_LIMIT: usize = 8;

// ============================================================================
// DATE QUERY
// ============================================================================

/// A calendar date typed into the search bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateQuery {
    /// `YYYY-MM-DD`, resolved to a week.
    Day(NaiveDate),
    /// `YYYY-MM`, resolved to a month.
    Month { year: i32, month: u32 },
    /// `YYYY`, resolved to a year.
    Year(i32),
}

impl DateQuery {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDateQuery {
            input: input.to_string(),
        };
        let parts: Vec<&str> = input.trim().split('-').collect();
        let widths: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        if !parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(invalid());
        }

        match widths.as_slice() {
            [4] => {
                let year = parts[0].parse().map_err(|_| invalid())?;
                Ok(DateQuery::Year(year))
            }
            [4, 2] => {
                let year = parts[0].parse().map_err(|_| invalid())?;
                let month = parts[1].parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(DateQuery::Month { year, month })
            }
            [4, 2, 2] => {
                let year = parts[0].parse().map_err(|_| invalid())?;
                let month = parts[1].parse().map_err(|_| invalid())?;
                let day = parts[2].parse().map_err(|_| invalid())?;
                NaiveDate::from_ymd_opt(year, month, day)
                    .map(DateQuery::Day)
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }

    /// Granularity a query of this precision resolves to.
    pub fn granularity(&self) -> Granularity {
        match self {
            DateQuery::Day(_) => Granularity::Week,
            DateQuery::Month { .. } => Granularity::Month,
            DateQuery::Year(_) => Granularity::Year,
        }
    }

    /// First day of the queried period.
    pub fn first_day(&self) -> Option<NaiveDate> {
        match *self {
            DateQuery::Day(date) => Some(date),
            DateQuery::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            DateQuery::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    /// Unit containing the first day of the queried period.
    pub fn locate(&self, date_of_birth: NaiveDate, horizon: Horizon) -> Option<BlockId> {
        grid::locate(date_of_birth, self.granularity(), horizon, self.first_day()?)
    }
}

// ============================================================================
// CONTENT SEARCH
// ============================================================================

fn block_matches(block: &Block, needle: &str) -> bool {
    let hit = |s: &String| s.to_lowercase().contains(needle);
    block.text.to_lowercase().contains(needle)
        || block.images.iter().any(hit)
        || block.videos.iter().any(hit)
        || block.spotify.iter().any(hit)
        || block.tags.iter().any(hit)
}

/// Ids of blocks whose text, media references or tags contain `query`,
/// case-insensitively, in grid order. Blank queries match nothing.
pub fn search_blocks(blocks: &BTreeMap<BlockId, Block>, query: &str) -> Vec<BlockId> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    blocks
        .iter()
        .filter(|(_, block)| block_matches(block, &needle))
        .map(|(id, _)| *id)
        .collect()
}

// ============================================================================
// TAGS
// ============================================================================

/// Every tag with its usage count, most used first, ties alphabetical.
pub fn tag_counts(blocks: &BTreeMap<BlockId, Block>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in blocks.values().flat_map(|b| b.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Tags to offer while the user types `input` into a block's tag field.
///
/// Tags already on the block (`exclude`) are skipped.
pub fn tag_suggestions(
    blocks: &BTreeMap<BlockId, Block>,
    input: &str,
    exclude: &[String],
    limit: usize,
) -> Vec<String> {
    let needle = input.trim().to_lowercase();
    tag_counts(blocks)
        .into_iter()
        .map(|(tag, _)| tag)
        .filter(|tag| !exclude.contains(tag))
        .filter(|tag| needle.is_empty() || tag.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
