use crate::geometry::Aabb;
use crate::state::Position;

/// Vertical wall at `x`, spanning `y1..=y2`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerticalSegment {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
}

impl VerticalSegment {
    pub fn new(x: f64, y1: f64, y2: f64) -> Self {
        Self {
            x,
            y1: y1.min(y2),
            y2: y1.max(y2),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y1, self.x, self.y2)
    }
}

/// Horizontal wall at `y`, spanning `x1..=x2`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HorizontalSegment {
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
}

impl HorizontalSegment {
    pub fn new(y: f64, x1: f64, x2: f64) -> Self {
        Self {
            y,
            x1: x1.min(x2),
            x2: x1.max(x2),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x1, self.y, self.x2, self.y)
    }
}

/// A map exit: walking into `region` and invoking the transport primitive
/// lands on `to_map` at spawn `to_spawn`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Door {
    pub region: Aabb,
    pub to_map: String,
    pub to_spawn: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub locked: bool,
}

/// A transporter NPC offering a fixed table of destinations.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Teleporter {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// `(map, spawn index)` pairs reachable from this NPC.
    pub places: Vec<(String, usize)>,
}

/// A named non-player character used as a movement destination.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpcLocation {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Static collision geometry and connectivity of a single map.
///
/// Wall lists are kept sorted by their fixed coordinate so collision tests
/// can binary-search to the relevant range.
#[derive(Clone, Debug, PartialEq)]
pub struct MapGeometry {
    pub name: String,
    pub bounds: Aabb,
    pub x_lines: Vec<VerticalSegment>,
    pub y_lines: Vec<HorizontalSegment>,
    pub spawns: Vec<(f64, f64)>,
    pub doors: Vec<Door>,
    pub teleporters: Vec<Teleporter>,
    pub npcs: Vec<NpcLocation>,
}

impl MapGeometry {
    pub fn new(
        name: impl Into<String>,
        bounds: Aabb,
        mut x_lines: Vec<VerticalSegment>,
        mut y_lines: Vec<HorizontalSegment>,
        spawns: Vec<(f64, f64)>,
    ) -> Self {
        x_lines.sort_by(|a, b| a.x.total_cmp(&b.x));
        y_lines.sort_by(|a, b| a.y.total_cmp(&b.y));
        Self {
            name: name.into(),
            bounds,
            x_lines,
            y_lines,
            spawns,
            doors: Vec::new(),
            teleporters: Vec::new(),
            npcs: Vec::new(),
        }
    }

    /// Obstacle-free map spanning `bounds`, with one spawn at its center.
    pub fn open(name: impl Into<String>, bounds: Aabb) -> Self {
        let center = bounds.center();
        Self::new(name, bounds, Vec::new(), Vec::new(), vec![center])
    }

    pub fn with_door(mut self, door: Door) -> Self {
        self.doors.push(door);
        self
    }

    pub fn with_teleporter(mut self, teleporter: Teleporter) -> Self {
        self.teleporters.push(teleporter);
        self
    }

    pub fn with_npc(mut self, npc: NpcLocation) -> Self {
        self.npcs.push(npc);
        self
    }

    pub fn spawn(&self, index: usize) -> Option<Position> {
        self.spawns
            .get(index)
            .map(|&(x, y)| Position::new(x, y, self.name.clone()))
    }

    pub fn npc(&self, name: &str) -> Option<Position> {
        self.npcs
            .iter()
            .map(|npc| (npc.name.as_str(), npc.x, npc.y))
            .chain(self.teleporters.iter().map(|t| (t.name.as_str(), t.x, t.y)))
            .find(|(candidate, _, _)| *candidate == name)
            .map(|(_, x, y)| Position::new(x, y, self.name.clone()))
    }
}
