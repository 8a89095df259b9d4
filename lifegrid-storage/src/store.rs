//! Block store: the root aggregate plus the port it persists through.

use crate::codec::{decode_root, encode_root};
use crate::journal::{ChangeJournal, JournalEntry, StoreChange, Watermark};
use crate::PersistencePort;
use chrono::NaiveDate;
use lifegrid_core::{
    search_blocks, tag_counts, tag_suggestions, Block, BlockId, BlockPatch, DateQuery,
    Granularity, Horizon, LifeGrid, LifegridConfig, LifegridError, LifegridResult, ProfilePatch,
    StorageError, StoreRoot, UserProfile,
};

/// Owns one user's [`StoreRoot`] and writes it wholesale after every
/// mutation.
///
/// A failed write leaves the in-memory mutation in place and marks the
/// store dirty; [`flush`](Self::flush) retries.
#[derive(Debug)]
pub struct BlockStore<P: PersistencePort> {
    port: P,
    store_key: String,
    root: StoreRoot,
    journal: ChangeJournal,
    dirty: bool,
}

impl<P: PersistencePort> BlockStore<P> {
    /// Rehydrate the root saved under `store_key`, or start uninitialized.
    pub fn open(port: P, store_key: impl Into<String>) -> LifegridResult<Self> {
        let store_key = store_key.into();

        let root = match port.load_root(&store_key)? {
            Some(blob) => {
                let decoded = decode_root(&store_key, &blob)?;
                for key in &decoded.dropped_keys {
                    tracing::warn!(
                        store_key = %store_key,
                        block_key = %key,
                        "Dropping block with unrecognized key"
                    );
                }
                decoded.root
            }
            None => StoreRoot::default(),
        };

        tracing::info!(
            store_key = %store_key,
            initialized = root.is_initialized(),
            blocks = root.blocks.len(),
            "Opened block store"
        );

        Ok(Self {
            port,
            store_key,
            root,
            journal: ChangeJournal::new(),
            dirty: false,
        })
    }

    /// [`open`](Self::open) under the configured store key.
    pub fn from_config(port: P, config: &LifegridConfig) -> LifegridResult<Self> {
        Self::open(port, config.store_key.clone())
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn root(&self) -> &StoreRoot {
        &self.root
    }

    pub fn is_initialized(&self) -> bool {
        self.root.is_initialized()
    }

    /// True when the last mutation has not reached the port.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.root.date_of_birth
    }

    pub fn profile(&self) -> &UserProfile {
        &self.root.profile
    }

    pub fn view_mode(&self) -> Granularity {
        self.root.view_mode
    }

    pub fn get_block(&self, id: &BlockId) -> Option<&Block> {
        self.root.blocks.get(id)
    }

    /// Stored blocks in grid order.
    pub fn blocks(&self) -> impl Iterator<Item = (&BlockId, &Block)> {
        self.root.blocks.iter()
    }

    pub fn block_count(&self) -> usize {
        self.root.blocks.len()
    }

    /// Copy of the root, for backups and exports.
    pub fn export_root(&self) -> StoreRoot {
        self.root.clone()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn search(&self, query: &str) -> Vec<BlockId> {
        search_blocks(&self.root.blocks, query)
    }

    /// Every tag in use with its count, most used first.
    pub fn tags(&self) -> Vec<(String, usize)> {
        tag_counts(&self.root.blocks)
    }

    /// Tag suggestions for the block `id`, skipping tags it already has.
    pub fn tag_suggestions(&self, id: &BlockId, input: &str, limit: usize) -> Vec<String> {
        let exclude = self
            .root
            .blocks
            .get(id)
            .map(|block| block.tags.as_slice())
            .unwrap_or(&[]);
        tag_suggestions(&self.root.blocks, input, exclude, limit)
    }

    /// Resolve a `YYYY[-MM[-DD]]` query to the unit it falls in.
    pub fn find_by_date(&self, query: &str, horizon: Horizon) -> LifegridResult<Option<BlockId>> {
        let date_of_birth = self.require_date_of_birth()?;
        let query = DateQuery::parse(query)?;
        Ok(query.locate(date_of_birth, horizon))
    }

    pub fn grid(
        &self,
        granularity: Granularity,
        horizon: Horizon,
        today: NaiveDate,
    ) -> LifegridResult<LifeGrid> {
        let date_of_birth = self.require_date_of_birth()?;
        LifeGrid::build(date_of_birth, granularity, horizon, today)
    }

    /// Grid at the persisted view mode.
    pub fn view_grid(&self, horizon: Horizon, today: NaiveDate) -> LifegridResult<LifeGrid> {
        self.grid(self.root.view_mode, horizon, today)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn set_date_of_birth(&mut self, date_of_birth: NaiveDate) -> LifegridResult<()> {
        if !self.root.is_initialized() {
            tracing::info!(store_key = %self.store_key, "Initializing block store");
        }
        self.root.date_of_birth = Some(date_of_birth);
        self.commit(StoreChange::DateOfBirthSet)
    }

    pub fn set_profile(&mut self, patch: &ProfilePatch) -> LifegridResult<UserProfile> {
        self.root.profile.apply(patch);
        let profile = self.root.profile.clone();
        self.commit(StoreChange::ProfileUpdated)?;
        Ok(profile)
    }

    pub fn set_view_mode(&mut self, granularity: Granularity) -> LifegridResult<()> {
        self.root.view_mode = granularity;
        self.commit(StoreChange::ViewModeSet)
    }

    /// Merge `patch` into the block at `id`, creating it from defaults when
    /// absent. Returns the block as stored.
    pub fn upsert_block(&mut self, id: BlockId, patch: &BlockPatch) -> LifegridResult<Block> {
        self.require_initialized()?;
        let block = self.root.blocks.entry(id).or_default();
        block.apply(patch);
        let block = block.clone();
        self.commit(StoreChange::BlockUpserted(id))?;
        Ok(block)
    }

    /// Remove the block at `id`. Absent ids are a no-op and write nothing.
    pub fn delete_block(&mut self, id: &BlockId) -> LifegridResult<Option<Block>> {
        self.require_initialized()?;
        let Some(removed) = self.root.blocks.remove(id) else {
            return Ok(None);
        };
        self.commit(StoreChange::BlockDeleted(*id))?;
        Ok(Some(removed))
    }

    /// Replace the whole root, as an import does.
    ///
    /// An initialized store only accepts initialized roots; clearing the
    /// date of birth goes through [`BlockStore::reset`].
    pub fn import_root(&mut self, root: StoreRoot) -> LifegridResult<()> {
        if self.root.is_initialized() && !root.is_initialized() {
            tracing::warn!(
                store_key = %self.store_key,
                "Refusing to import a root without a date of birth"
            );
            return Err(StorageError::Uninitialized.into());
        }
        tracing::info!(
            store_key = %self.store_key,
            blocks = root.blocks.len(),
            "Importing store root"
        );
        self.root = root;
        self.commit(StoreChange::Replaced)
    }

    /// Return to the uninitialized state and delete the durable copy.
    pub fn reset(&mut self) -> LifegridResult<()> {
        self.root = StoreRoot::default();
        let watermark = self.journal.record(StoreChange::Reset);
        tracing::info!(
            store_key = %self.store_key,
            revision = watermark.sequence,
            "Resetting block store"
        );

        match self.port.delete_root(&self.store_key) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                tracing::warn!(
                    store_key = %self.store_key,
                    error = %e,
                    "Failed to delete persisted store root"
                );
                Err(self.write_failure(e))
            }
        }
    }

    /// Write the root if the last write failed. No-op when clean.
    pub fn flush(&mut self) -> LifegridResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let watermark = self.journal.current_watermark();
        self.persist(watermark)
    }

    // ========================================================================
    // CHANGE JOURNAL
    // ========================================================================

    pub fn current_watermark(&self) -> Watermark {
        self.journal.current_watermark()
    }

    pub fn has_changes_since(&self, watermark: &Watermark) -> bool {
        self.journal.has_changes_since(watermark)
    }

    pub fn changes_since(&self, watermark: &Watermark) -> Vec<JournalEntry> {
        self.journal.changes_since(watermark)
    }

    /// False once the journal has dropped changes made after `watermark`;
    /// the caller must then rebuild from [`BlockStore::root`].
    pub fn changes_complete_since(&self, watermark: &Watermark) -> bool {
        self.journal.covers(watermark)
    }

    pub fn prune_changes_before(&mut self, watermark: &Watermark) -> usize {
        self.journal.prune_before(watermark)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn require_initialized(&self) -> LifegridResult<()> {
        self.require_date_of_birth().map(|_| ())
    }

    fn require_date_of_birth(&self) -> LifegridResult<NaiveDate> {
        self.root
            .date_of_birth
            .ok_or_else(|| StorageError::Uninitialized.into())
    }

    fn commit(&mut self, change: StoreChange) -> LifegridResult<()> {
        let watermark = self.journal.record(change);
        self.dirty = true;
        self.persist(watermark)
    }

    fn persist(&mut self, watermark: Watermark) -> LifegridResult<()> {
        let written = encode_root(&self.store_key, &self.root).and_then(|blob| {
            self.port
                .save_root(&self.store_key, &blob)
                .map(|()| blob.len())
        });

        match written {
            Ok(bytes) => {
                self.dirty = false;
                tracing::debug!(
                    store_key = %self.store_key,
                    bytes,
                    revision = watermark.sequence,
                    "Persisted store root"
                );
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                tracing::warn!(
                    store_key = %self.store_key,
                    error = %e,
                    revision = watermark.sequence,
                    "Failed to persist store root; keeping in-memory state"
                );
                Err(self.write_failure(e))
            }
        }
    }

    fn write_failure(&self, error: LifegridError) -> LifegridError {
        if error.is_persistence_write() {
            return error;
        }
        StorageError::PersistenceWrite {
            store_key: self.store_key.clone(),
            reason: error.to_string(),
        }
        .into()
    }
}
