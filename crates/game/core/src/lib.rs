//! Pure game logic shared by the bot runtime and offline tools.
//!
//! `game-core` holds everything that can be computed from a world snapshot
//! without waiting on the host: positions and entity snapshots, swept-box
//! collision, the grid pathfinder, skill tables, the combat difficulty
//! estimate, and the tuning knobs for every layer. Nothing here is async.
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod geometry;
pub mod pathfind;
pub mod state;

pub use combat::{MAX_DIFFICULTY, difficulty};
pub use config::{BotConfig, BrainConfig, MovementConfig, PathfindConfig, SkillConfig};
pub use env::{
    Door, HorizontalSegment, MapGeometry, NpcLocation, SkillDef, SkillTable, Teleporter,
    VerticalSegment, World,
};
pub use error::PathfindError;
pub use geometry::{Aabb, Hitbox, MovingBox, box_distance, can_move, will_collide};
pub use pathfind::{Arrival, PathRequest, Pathfinder, Search, SearchProgress};
pub use state::{Entity, EntityKind, Position, Waypoint, distance_between};
