//! Storage for the previous fetch's results.
//!
//! The pipeline diffs every fetch against exactly one [`Snapshot`]: the one
//! written by the fetch before it. Stores swap the whole value at once, so a
//! reader sees either the old snapshot or the new one, never a mix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::error::DipwatchError;
use crate::models::DerivedRecord;

/// Fixed key the serialized snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "crypto_data";

/// Derived records of the most recent successful fetch, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: HashMap<String, DerivedRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the stored record for a symbol.
    pub fn get(&self, symbol: &str) -> Option<&DerivedRecord> {
        self.records.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.records.contains_key(symbol)
    }
}

impl FromIterator<DerivedRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = DerivedRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.ticker.symbol.clone(), record))
                .collect(),
        }
    }
}

/// Session-scoped key-value storage for a single [`Snapshot`].
pub trait SnapshotStore: Send + Sync {
    /// Returns the stored snapshot, or an empty one if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`DipwatchError::Storage`] if the stored value cannot be read.
    fn load(&self) -> Result<Snapshot>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DipwatchError::Storage`] if the value cannot be written.
    fn save(&self, snapshot: Snapshot) -> Result<()>;

    /// Discards the stored snapshot, ending the session.
    ///
    /// # Errors
    ///
    /// Returns [`DipwatchError::Storage`] if the value cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// Snapshot store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Snapshot> {
        let guard = self
            .inner
            .read()
            .map_err(|_| DipwatchError::Storage("snapshot lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: Snapshot) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| DipwatchError::Storage("snapshot lock poisoned".to_string()))?;
        *guard = snapshot;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(Snapshot::new())
    }
}

/// Snapshot store backed by a JSON file in a session directory.
///
/// The snapshot survives restarts that reuse the same directory. Writes go
/// to a temporary file that is renamed over the previous one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store writing `<dir>/crypto_data.json`.
    ///
    /// # Errors
    ///
    /// Returns [`DipwatchError::Storage`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            DipwatchError::Storage(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            path: dir.join(format!("{SNAPSHOT_KEY}.json")),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Snapshot> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(e) => {
                return Err(DipwatchError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&contents).map_err(|e| {
            DipwatchError::Storage(format!("corrupt snapshot {}: {e}", self.path.display()))
        })
    }

    fn save(&self, snapshot: Snapshot) -> Result<()> {
        let json = serde_json::to_string(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| {
            DipwatchError::Storage(format!("failed to write {}: {e}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            DipwatchError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        debug!(records = snapshot.len(), path = %self.path.display(), "Saved snapshot");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DipwatchError::Storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
