//! In-memory [`StateStore`] for tests and ephemeral runs.

use std::sync::{Mutex, PoisonError};

use super::{PersistedBrain, Result, StateStore};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedBrain>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`, as if saved by an earlier run.
    pub fn with_state(state: PersistedBrain) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedBrain>> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, state: &PersistedBrain) -> Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}
