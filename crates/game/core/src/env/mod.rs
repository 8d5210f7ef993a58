//! Read-only world data provided by the host at startup.
//!
//! [`World`] bundles per-map geometry, door and teleporter tables, NPC
//! locations, and skill definitions. It is loaded once and shared for the
//! lifetime of the process.
mod map;
mod skills;

use std::collections::HashMap;

pub use map::{Door, HorizontalSegment, MapGeometry, NpcLocation, Teleporter, VerticalSegment};
pub use skills::{SkillDef, SkillTable};

use crate::geometry::{self, Hitbox};
use crate::state::Position;

/// Static world data: every map the bot may visit plus the skill table.
#[derive(Clone, Debug, Default)]
pub struct World {
    maps: HashMap<String, MapGeometry>,
    pub skills: SkillTable,
}

impl World {
    pub fn new(maps: impl IntoIterator<Item = MapGeometry>, skills: SkillTable) -> Self {
        Self {
            maps: maps.into_iter().map(|map| (map.name.clone(), map)).collect(),
            skills,
        }
    }

    pub fn insert_map(&mut self, map: MapGeometry) {
        self.maps.insert(map.name.clone(), map);
    }

    pub fn map(&self, name: &str) -> Option<&MapGeometry> {
        self.maps.get(name)
    }

    /// Returns the stored key for `name`, borrowed for the world's lifetime.
    pub fn map_key(&self, name: &str) -> Option<&str> {
        self.maps.get_key_value(name).map(|(key, _)| key.as_str())
    }

    pub fn maps(&self) -> impl Iterator<Item = &MapGeometry> {
        self.maps.values()
    }

    /// Straight-line walkability check; `false` across maps or on unknown maps.
    pub fn can_move(&self, hitbox: &Hitbox, here: &Position, there: &Position) -> bool {
        self.map(&here.map)
            .is_some_and(|geometry| geometry::can_move(geometry, hitbox, here, there))
    }

    /// Finds a named NPC on any map.
    pub fn locate_npc(&self, name: &str) -> Option<Position> {
        self.maps.values().find_map(|map| map.npc(name))
    }

    /// Default arrival point of a map (spawn 0).
    pub fn map_entrance(&self, name: &str) -> Option<Position> {
        self.map(name).and_then(|map| map.spawn(0))
    }
}
