//! Persistence for the little brain state that must survive a restart.
//!
//! Only the home anchor and the stop flag are stored; everything else is
//! rebuilt from host snapshots on startup.
mod file;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use game_core::Position;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors surfaced by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Json(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Anchor the bot returns to when resting or wandering too far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub position: Position,
    pub radius: f64,
}

/// Brain fields persisted across restarts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedBrain {
    pub home: Option<Home>,
    pub stopped: bool,
}

/// Character-scoped get/set storage for [`PersistedBrain`].
pub trait StateStore: Send + Sync {
    /// Returns `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedBrain>>;

    fn save(&self, state: &PersistedBrain) -> Result<()>;
}
