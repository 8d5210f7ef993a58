//! Asynchronous bot runtime on top of `game-core`.
//!
//! This crate turns the pure planning primitives of `game-core` into a bot
//! that acts through a [`Host`]: cancellable tasks, a pathfinding worker, a
//! movement engine, a skill autouse scheduler, and the decision loop that
//! drives them. Consumers embed [`Runtime`] and talk to its layers through
//! cloneable handles.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the error types every layer returns
//! - [`task`] provides cancellable tasks and single-occupant slots
//! - [`movement`], [`skills`] and [`brain`] are the three acting layers
//! - [`events`] provides the topic-based event bus for status publication
//! - [`store`] persists the little brain state that survives restarts
//! - [`host`] is the boundary to the game client
pub mod api;
pub mod brain;
pub mod events;
pub mod host;
pub mod movement;
pub mod runtime;
pub mod skills;
pub mod store;
pub mod task;

mod workers;

pub use api::{ActionRejected, MovementError, Result, RuntimeError};
pub use brain::{Brain, BrainState, Decision, Mode};
pub use events::{BrainEvent, Event, EventBus, MovementEvent, SkillEvent, Topic};
pub use host::{Host, HostEvent};
pub use movement::{Destination, MoveOptions, MoveOutcome, MoveTarget, Movement, PathOptions};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use skills::{ActiveAutouse, Condition, SkillScheduler};
pub use store::{Home, JsonFileStore, MemoryStore, PersistedBrain, StateStore, StoreError};
pub use task::{Task, TaskContext, TaskSlot};
pub use workers::PathfinderHandle;
