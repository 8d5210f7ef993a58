//! The boundary between the bot and the game client it drives.
//!
//! Everything behind [`Host`] is owned by the game: entity snapshots are
//! refreshed continuously, and every primitive action is an opaque remote
//! call that may be refused with an [`ActionRejected`] reason.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

use game_core::Entity;

use crate::api::ActionRejected;

/// Game events pushed by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    Hit {
        target: String,
        attacker: String,
        damage: f64,
    },
    /// The controlled character arrived on `map`.
    NewMap { map: String },
    Death { id: String },
    Other(String),
}

/// Primitives provided by the game client.
#[async_trait]
pub trait Host: Send + Sync {
    /// Latest snapshot of the controlled character.
    fn character(&self) -> Entity;

    /// Every other visible entity on the character's map.
    fn entities(&self) -> Vec<Entity>;

    /// Looks `id` up among the character, visible entities and party.
    fn entity(&self, id: &str) -> Option<Entity> {
        let me = self.character();
        if me.id == id {
            return Some(me);
        }
        self.entities()
            .into_iter()
            .chain(self.party())
            .find(|entity| entity.id == id)
    }

    /// Party members, excluding the controlled character.
    fn party(&self) -> Vec<Entity> {
        Vec::new()
    }

    /// When the cooldown group becomes usable; `None` if it already is.
    fn ready_at(&self, group: &str) -> Option<Instant>;

    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;

    /// Halts any primitive movement in flight.
    fn stop(&self);

    /// Walks in a straight line, resolving on arrival.
    async fn move_to(&self, x: f64, y: f64) -> Result<(), ActionRejected>;

    /// Uses a door or teleporter toward `map`, arriving at `spawn`.
    async fn transport(&self, map: &str, spawn: usize) -> Result<(), ActionRejected>;

    async fn use_skill(
        &self,
        skill: &str,
        target: Option<&str>,
        args: &[String],
    ) -> Result<(), ActionRejected>;
}
