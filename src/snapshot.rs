//! Band snapshots and the saved-formation library.
//!
//! Snapshots are JSON documents with a format version, so sandbox-mode
//! creations survive between sessions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::band::{BandMember, BandStore};
use crate::error::LoadError;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A frozen copy of every member in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Members in roster order.
    pub members: Vec<BandMember>,
}

impl Snapshot {
    /// Capture the current state of a store.
    #[must_use]
    pub fn capture(store: &BandStore, name: Option<&str>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            name: name.map(str::to_string),
            members: store.get_all_members().to_vec(),
        }
    }

    /// Rebuild a store from this snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown version or duplicate member ids.
    pub fn to_store(&self) -> Result<BandStore, LoadError> {
        self.check_version()?;
        BandStore::from_members(self.members.clone())
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is unknown.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), members = self.members.len(), "snapshot saved");
        Ok(())
    }

    /// Read a snapshot from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn check_version(&self) -> Result<(), LoadError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(LoadError::UnsupportedVersion(self.version))
        }
    }
}

/// Named formations saved from sandbox mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormationLibrary {
    formations: Vec<Snapshot>,
}

impl FormationLibrary {
    /// An empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Save the current band under `name`. Returns the new entry's index,
    /// or `None` for an empty band.
    pub fn save(&mut self, name: &str, store: &BandStore) -> Option<usize> {
        if store.is_empty() {
            return None;
        }
        self.formations.push(Snapshot::capture(store, Some(name)));
        Some(self.formations.len() - 1)
    }

    /// Saved formations in the order they were saved.
    #[must_use]
    pub fn list(&self) -> &[Snapshot] {
        &self.formations
    }

    /// A saved formation by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.formations.get(index)
    }

    /// Remove a saved formation.
    pub fn delete(&mut self, index: usize) -> Option<Snapshot> {
        (index < self.formations.len()).then(|| self.formations.remove(index))
    }

    /// Number of saved formations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formations.len()
    }

    /// Whether nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formations.is_empty()
    }

    /// Read a library file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds an unknown
    /// snapshot version.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let library: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        for snapshot in &library.formations {
            snapshot.check_version()?;
        }
        Ok(library)
    }

    /// Write the library to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    pub fn save_to(&self, path: &Path) -> Result<(), LoadError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
