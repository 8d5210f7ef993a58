//! World data loader.
//!
//! Reads map geometry, connectivity and skill definitions from a RON file.
//! Wall segments are written as tuples: vertical `(x, y1, y2)` and
//! horizontal `(y, x1, x2)`.

use std::path::Path;

use game_core::{
    Aabb, Door, HorizontalSegment, MapGeometry, NpcLocation, SkillDef, SkillTable, Teleporter,
    VerticalSegment, World,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// World data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorldDataRon {
    maps: Vec<MapDataRon>,
    #[serde(default)]
    skills: Vec<SkillDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    name: String,
    bounds: Aabb,
    #[serde(default)]
    x_lines: Vec<(f64, f64, f64)>,
    #[serde(default)]
    y_lines: Vec<(f64, f64, f64)>,
    spawns: Vec<(f64, f64)>,
    #[serde(default)]
    doors: Vec<Door>,
    #[serde(default)]
    teleporters: Vec<Teleporter>,
    #[serde(default)]
    npcs: Vec<NpcLocation>,
}

impl MapDataRon {
    fn into_geometry(self) -> LoadResult<MapGeometry> {
        if self.spawns.is_empty() {
            anyhow::bail!("Map '{}' has no spawn points", self.name);
        }

        let x_lines = self
            .x_lines
            .into_iter()
            .map(|(x, y1, y2)| VerticalSegment::new(x, y1, y2))
            .collect();
        let y_lines = self
            .y_lines
            .into_iter()
            .map(|(y, x1, x2)| HorizontalSegment::new(y, x1, x2))
            .collect();

        let mut map = MapGeometry::new(self.name, self.bounds, x_lines, y_lines, self.spawns);
        map.doors = self.doors;
        map.teleporters = self.teleporters;
        map.npcs = self.npcs;
        Ok(map)
    }
}

/// Loader for [`World`] from RON files.
pub struct WorldLoader;

impl WorldLoader {
    pub fn load(path: &Path) -> LoadResult<World> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parses world data and checks that every door and teleporter points at
    /// a known map and spawn.
    pub fn parse(content: &str) -> LoadResult<World> {
        let data: WorldDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse world RON: {}", e))?;

        let maps = data
            .maps
            .into_iter()
            .map(MapDataRon::into_geometry)
            .collect::<LoadResult<Vec<_>>>()?;
        let world = World::new(maps, SkillTable::new(data.skills));

        for map in world.maps() {
            let exits = map
                .doors
                .iter()
                .map(|door| (door.to_map.as_str(), door.to_spawn))
                .chain(map.teleporters.iter().flat_map(|teleporter| {
                    teleporter
                        .places
                        .iter()
                        .map(|(place, spawn)| (place.as_str(), *spawn))
                }));
            for (to_map, spawn) in exits {
                let valid = world
                    .map(to_map)
                    .is_some_and(|target| spawn < target.spawns.len());
                if !valid {
                    anyhow::bail!(
                        "Map '{}' links to unknown destination {}:{}",
                        map.name,
                        to_map,
                        spawn
                    );
                }
            }
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use game_core::{Hitbox, Position};

    use super::*;

    const BUNDLED: &str = include_str!("../../data/world.ron");

    #[test]
    fn bundled_world_parses() {
        let world = WorldLoader::parse(BUNDLED).expect("world");

        let main = world.map("main").expect("main map");
        assert!(!main.x_lines.is_empty());
        assert!(main.x_lines.windows(2).all(|w| w[0].x <= w[1].x));
        assert_eq!(main.doors[0].to_map, "cave");

        assert_eq!(world.skills.cooldown_group("use_hp"), "use_hp");
        assert_eq!(world.skills.cooldown_group("use_mp"), "use_hp");
        assert!(world.locate_npc("transporter").is_some());
    }

    #[test]
    fn walls_are_respected_after_loading() {
        let world = WorldLoader::parse(BUNDLED).expect("world");
        let here = Position::new(0.0, 0.0, "main");
        assert!(!world.can_move(&Hitbox::DEFAULT, &here, &Position::new(100.0, 0.0, "main")));
        assert!(world.can_move(&Hitbox::DEFAULT, &here, &Position::new(0.0, 100.0, "main")));
    }

    #[test]
    fn dangling_door_is_rejected() {
        let content = r#"(
            maps: [(
                name: "main",
                bounds: (min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 100.0),
                spawns: [(50.0, 50.0)],
                doors: [(
                    region: (min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0),
                    to_map: "nowhere",
                    to_spawn: 0,
                )],
            )],
        )"#;
        let error = WorldLoader::parse(content).unwrap_err();
        assert!(error.to_string().contains("nowhere"));
    }

    #[test]
    fn map_without_spawn_is_rejected() {
        let content = r#"(
            maps: [(
                name: "void",
                bounds: (min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0),
                spawns: [],
            )],
        )"#;
        assert!(WorldLoader::parse(content).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(BUNDLED.as_bytes()).expect("write");

        let world = WorldLoader::load(file.path()).expect("world");
        assert!(world.map("cave").is_some());
    }

    #[test]
    fn missing_file_is_an_error() {
        let error = WorldLoader::load(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(error.to_string().contains("Failed to read file"));
    }
}
