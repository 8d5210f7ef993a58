//! Combat estimates used for target selection.
//!
//! Pure functions over entity snapshots; nothing here talks to the host.
mod difficulty;

pub use difficulty::{MAX_DIFFICULTY, difficulty};
