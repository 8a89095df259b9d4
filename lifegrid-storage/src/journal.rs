//! Watermark and change journal for store mutations.
//!
//! Every committed mutation appends one [`StoreChange`] and advances the
//! watermark, so a renderer holding an older watermark can ask what changed
//! instead of diffing the whole root.
//!
//! The journal keeps at most its retention count of entries and drops the
//! oldest beyond that. Callers that fall behind see the gap through
//! [`ChangeJournal::oldest_sequence`] and should re-render in full.

use chrono::{DateTime, Utc};
use lifegrid_core::BlockId;
use std::collections::VecDeque;

/// Entries retained before the oldest are dropped.
pub const DEFAULT_JOURNAL_RETENTION: usize = 1024;

/// A point in the mutation history. Sequence zero is the empty journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub sequence: u64,
    pub observed_at: DateTime<Utc>,
}

impl Watermark {
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            observed_at: Utc::now(),
        }
    }

    pub fn zero() -> Self {
        Self {
            sequence: 0,
            observed_at: DateTime::UNIX_EPOCH,
        }
    }

    pub fn is_newer_than(&self, other: &Watermark) -> bool {
        self.sequence > other.sequence
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::zero()
    }
}

/// What a committed mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    BlockUpserted(BlockId),
    BlockDeleted(BlockId),
    ProfileUpdated,
    DateOfBirthSet,
    ViewModeSet,
    /// The whole root was replaced by an import.
    Replaced,
    /// The store was reset to its uninitialized state.
    Reset,
}

impl StoreChange {
    /// Block the change applies to, if any.
    pub fn block_id(&self) -> Option<BlockId> {
        match self {
            StoreChange::BlockUpserted(id) | StoreChange::BlockDeleted(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether every cached view of the store is stale after this change.
    pub fn invalidates_all(&self) -> bool {
        matches!(
            self,
            StoreChange::Replaced | StoreChange::Reset | StoreChange::DateOfBirthSet
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub watermark: Watermark,
    pub change: StoreChange,
}

/// In-memory log of store changes, bounded by its retention count.
#[derive(Debug)]
pub struct ChangeJournal {
    sequence: u64,
    retention: usize,
    log: VecDeque<JournalEntry>,
}

impl Default for ChangeJournal {
    fn default() -> Self {
        Self::with_retention(DEFAULT_JOURNAL_RETENTION)
    }
}

impl ChangeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal keeping at most `retention` entries (at least one).
    pub fn with_retention(retention: usize) -> Self {
        Self {
            sequence: 0,
            retention: retention.max(1),
            log: VecDeque::new(),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Append a change and return the watermark it was recorded at.
    pub fn record(&mut self, change: StoreChange) -> Watermark {
        self.sequence += 1;
        let watermark = Watermark::new(self.sequence);
        self.log.push_back(JournalEntry { watermark, change });
        while self.log.len() > self.retention {
            self.log.pop_front();
        }
        watermark
    }

    pub fn current_watermark(&self) -> Watermark {
        self.log
            .back()
            .map(|entry| entry.watermark)
            .unwrap_or_else(|| Watermark {
                sequence: self.sequence,
                ..Watermark::zero()
            })
    }

    pub fn has_changes_since(&self, watermark: &Watermark) -> bool {
        self.sequence > watermark.sequence
    }

    /// Entries recorded after `watermark`, oldest first.
    ///
    /// Entries pruned away are not reported; compare against
    /// [`oldest_sequence`](Self::oldest_sequence) to detect the gap.
    pub fn changes_since(&self, watermark: &Watermark) -> Vec<JournalEntry> {
        self.log
            .iter()
            .filter(|entry| entry.watermark.sequence > watermark.sequence)
            .cloned()
            .collect()
    }

    /// Whether [`changes_since`](Self::changes_since) still reports every
    /// change after `watermark`.
    pub fn covers(&self, watermark: &Watermark) -> bool {
        if !self.has_changes_since(watermark) {
            return true;
        }
        self.oldest_sequence()
            .is_some_and(|oldest| oldest <= watermark.sequence + 1)
    }

    /// Sequence of the oldest retained entry.
    pub fn oldest_sequence(&self) -> Option<u64> {
        self.log.front().map(|entry| entry.watermark.sequence)
    }

    /// Drop entries at or before `watermark`. Returns how many were removed.
    pub fn prune_before(&mut self, watermark: &Watermark) -> usize {
        let before = self.log.len();
        self.log
            .retain(|entry| entry.watermark.sequence > watermark.sequence);
        before - self.log.len()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
