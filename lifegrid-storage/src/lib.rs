//! LIFEGRID Storage - Block Store and Persistence Ports
//!
//! The [`BlockStore`] owns the root aggregate and writes it wholesale through
//! a [`PersistencePort`] after every mutation. The concrete medium (memory,
//! a JSON file, browser storage behind FFI) is whatever port is injected.

pub mod codec;
pub mod file;
pub mod journal;
pub mod store;

pub use codec::{decode_root, encode_root, DecodedRoot, ENVELOPE_VERSION};
pub use file::FilePersistence;
pub use journal::{
    ChangeJournal, JournalEntry, StoreChange, Watermark, DEFAULT_JOURNAL_RETENTION,
};
pub use store::BlockStore;

use lifegrid_core::{LifegridResult, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ============================================================================
// PERSISTENCE PORT
// ============================================================================

/// Durable storage for serialized store roots, keyed by store name.
pub trait PersistencePort: Send + Sync {
    /// Load the blob saved under `key`, or `None` if nothing was saved.
    fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>>;

    /// Replace the blob saved under `key`.
    fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()>;

    /// Remove the blob saved under `key`. Removing a missing key succeeds.
    fn delete_root(&self, key: &str) -> LifegridResult<()>;
}

impl<P: PersistencePort + ?Sized> PersistencePort for Box<P> {
    fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>> {
        (**self).load_root(key)
    }

    fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()> {
        (**self).save_root(key, blob)
    }

    fn delete_root(&self, key: &str) -> LifegridResult<()> {
        (**self).delete_root(key)
    }
}

impl<P: PersistencePort + ?Sized> PersistencePort for Arc<P> {
    fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>> {
        (**self).load_root(key)
    }

    fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()> {
        (**self).save_root(key, blob)
    }

    fn delete_root(&self, key: &str) -> LifegridResult<()> {
        (**self).delete_root(key)
    }
}

// ============================================================================
// MEMORY PERSISTENCE
// ============================================================================

/// In-memory persistence. Clones share the same underlying map, so a test
/// can keep a handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    writes: Arc<RwLock<u64>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob as if a previous session had saved it.
    pub fn with_blob(key: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        let persistence = Self::new();
        if let Ok(mut blobs) = persistence.blobs.write() {
            blobs.insert(key.into(), blob.into());
        }
        persistence
    }

    /// Current blob under `key`, decoded as UTF-8 for assertions.
    pub fn blob_as_string(&self, key: &str) -> Option<String> {
        let blobs = self.blobs.read().ok()?;
        blobs
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Number of successful `save_root` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.read().map(|w| *w).unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(key))
            .unwrap_or(false)
    }
}

impl PersistencePort for MemoryPersistence {
    fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>> {
        let blobs = self.blobs.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()> {
        let mut blobs = self.blobs.write().map_err(|_| StorageError::LockPoisoned)?;
        blobs.insert(key.to_string(), blob.to_vec());
        let mut writes = self.writes.write().map_err(|_| StorageError::LockPoisoned)?;
        *writes += 1;
        Ok(())
    }

    fn delete_root(&self, key: &str) -> LifegridResult<()> {
        let mut blobs = self.blobs.write().map_err(|_| StorageError::LockPoisoned)?;
        blobs.remove(key);
        Ok(())
    }
}
