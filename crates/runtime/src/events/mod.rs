//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers (status displays,
//! tests) subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{BrainEvent, MovementEvent, SkillEvent};
