//! Worker tasks that back the runtime orchestration.
//!
//! The pathfinding worker keeps expensive searches off the tasks that drive
//! movement and skills.

mod pathfind;

pub use pathfind::PathfinderHandle;
