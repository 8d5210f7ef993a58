//! Value types describing where things are and what they look like.
//!
//! Everything here is a snapshot: the host owns entity lifecycles and the bot
//! only reads them.
mod entity;
mod position;

pub use entity::{Entity, EntityKind};
pub use position::{Position, Waypoint, distance_between};
