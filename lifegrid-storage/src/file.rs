//! File-backed persistence: one `<key>.json` per store under a directory.

use crate::PersistencePort;
use lifegrid_core::{LifegridConfig, LifegridResult, StorageError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &LifegridConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the blob for `key` lives at.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", key))
    }
}

impl PersistencePort for FilePersistence {
    fn load_root(&self, key: &str) -> LifegridResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::PersistenceRead {
                store_key: key.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn save_root(&self, key: &str, blob: &[u8]) -> LifegridResult<()> {
        let write_err = |e: std::io::Error| StorageError::PersistenceWrite {
            store_key: key.to_string(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        // Rename over the target so a crash mid-write leaves the old blob.
        let temp = self.temp_path_for(key);
        fs::write(&temp, blob).map_err(write_err)?;
        fs::rename(&temp, self.path_for(key)).map_err(write_err)?;
        Ok(())
    }

    fn delete_root(&self, key: &str) -> LifegridResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::PersistenceWrite {
                store_key: key.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}
