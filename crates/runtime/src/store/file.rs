//! JSON file-backed [`StateStore`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PersistedBrain, Result, StateStore};

/// Keeps the persisted brain in a single JSON document.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous state intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates the parent directory if needed. The file itself is written on
    /// the first save.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedBrain>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let state = serde_json::from_slice(&bytes)?;
        debug!(
            target: "runtime::store",
            path = %self.path.display(),
            "loaded brain state"
        );
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedBrain) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(
            target: "runtime::store",
            path = %self.path.display(),
            "saved brain state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use game_core::Position;

    use super::*;
    use crate::store::{Home, StoreError};

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("brain.json")).expect("store");
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("nested/brain.json")).expect("store");
        let state = PersistedBrain {
            home: Some(Home {
                position: Position::new(10.0, -20.0, "main"),
                radius: 150.0,
            }),
            stopped: true,
        };

        store.save(&state).expect("save");
        assert_eq!(store.load(), Ok(Some(state)));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brain.json");
        fs::write(&path, b"{not json").expect("write");

        let store = JsonFileStore::new(&path).expect("store");
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
