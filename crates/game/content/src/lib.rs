//! Data files and loaders for static world data and bot configuration.
//!
//! - World data (maps, wall segments, doors, teleporters, NPCs, skills) in RON
//! - Bot tuning ([`game_core::BotConfig`]) in TOML
//!
//! The bundled `data/` directory holds a small reference world used by tests
//! and local runs; real deployments load the host's export instead.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult, WorldLoader};
