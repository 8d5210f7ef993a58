//! Resumable weighted A* over a quantized grid plus door/teleporter edges.
//!
//! The search is driven in bounded slices via [`Search::step`], so an async
//! caller can yield between slices without affecting the result.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;
use tracing::trace;

use super::{Arrival, PathRequest};
use crate::config::PathfindConfig;
use crate::env::{MapGeometry, World};
use crate::error::PathfindError;
use crate::geometry::{Hitbox, box_distance, segment_clear};
use crate::state::{Position, Waypoint};

const DIRECTIONS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, 1.0),
    (-1.0, 1.0),
    (-1.0, 0.0),
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
];

/// Outcome of one slice of search work.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchProgress {
    /// Budget spent; call [`Search::step`] again.
    Pending,
    /// Raw (unsimplified) path from the origin.
    Found(Vec<Waypoint>),
    Failed(PathfindError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeKey<'w> {
    map: &'w str,
    x: i64,
    y: i64,
}

#[derive(Debug)]
struct Node<'w> {
    map: &'w str,
    x: f64,
    y: f64,
    spawn: Option<usize>,
    g: f64,
    parent: Option<usize>,
    closed: bool,
}

type OpenEntry = Reverse<(OrderedFloat<f64>, usize, usize)>;

/// In-progress search for one [`PathRequest`].
pub struct Search<'w> {
    world: &'w World,
    hitbox: Hitbox,
    config: PathfindConfig,
    origin: Position,
    goal: Position,
    goal_map: &'w str,
    arrival: Arrival,
    cross_map: bool,
    nodes: Vec<Node<'w>>,
    index: HashMap<NodeKey<'w>, usize>,
    open: BinaryHeap<OpenEntry>,
    pushes: usize,
    expansions: usize,
    max_expansions: usize,
}

impl<'w> Search<'w> {
    pub fn new(
        world: &'w World,
        hitbox: Hitbox,
        config: PathfindConfig,
        request: &PathRequest,
    ) -> Result<Self, PathfindError> {
        let origin_map = world
            .map_key(&request.origin.map)
            .ok_or_else(|| PathfindError::UnknownMap(request.origin.map.clone()))?;
        if world
            .map(origin_map)
            .is_some_and(|map| !map.bounds.contains_point(request.origin.x, request.origin.y))
        {
            return Err(PathfindError::OriginBlocked(request.origin.to_string()));
        }
        let goal_map = world
            .map_key(&request.goal.map)
            .ok_or_else(|| PathfindError::UnknownMap(request.goal.map.clone()))?;

        if !request.cross_map && origin_map != goal_map {
            return Err(PathfindError::CrossMapDisallowed {
                from: origin_map.to_string(),
                to: goal_map.to_string(),
            });
        }

        let max_expansions = request.max_expansions.unwrap_or(config.max_expansions);
        let mut search = Self {
            world,
            hitbox,
            config,
            origin: request.origin.clone(),
            goal: request.goal.clone(),
            goal_map,
            arrival: request.arrival,
            cross_map: request.cross_map,
            nodes: Vec::new(),
            index: HashMap::new(),
            open: BinaryHeap::new(),
            pushes: 0,
            expansions: 0,
            max_expansions,
        };

        let (x, y) = (request.origin.x, request.origin.y);
        search.relax(None, origin_map, x, y, None, 0.0);
        Ok(search)
    }

    /// Node expansions performed so far.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Performs at most `budget` expansions.
    pub fn step(&mut self, budget: usize) -> SearchProgress {
        for _ in 0..budget.max(1) {
            let Some(Reverse((_, _, id))) = self.open.pop() else {
                return SearchProgress::Failed(PathfindError::NoPath {
                    from: self.origin.to_string(),
                    to: self.goal.to_string(),
                });
            };
            if self.nodes[id].closed {
                continue;
            }
            self.nodes[id].closed = true;

            if let Some(path) = self.arrive(id) {
                trace!(
                    target: "game_core::pathfind",
                    expansions = self.expansions,
                    waypoints = path.len(),
                    "path found"
                );
                return SearchProgress::Found(path);
            }

            self.expansions += 1;
            if self.expansions > self.max_expansions {
                return SearchProgress::Failed(PathfindError::BudgetExhausted {
                    expansions: self.max_expansions,
                });
            }
            self.expand(id);
        }
        SearchProgress::Pending
    }

    /// Runs the search to completion.
    pub fn run(&mut self) -> Result<Vec<Waypoint>, PathfindError> {
        loop {
            match self.step(usize::MAX) {
                SearchProgress::Pending => continue,
                SearchProgress::Found(path) => return Ok(path),
                SearchProgress::Failed(error) => return Err(error),
            }
        }
    }

    fn arrive(&self, id: usize) -> Option<Vec<Waypoint>> {
        let node = &self.nodes[id];
        if node.map != self.goal_map {
            return None;
        }
        let distance = (node.x - self.goal.x).hypot(node.y - self.goal.y);
        match self.arrival {
            Arrival::Within(range) if distance <= range => Some(self.reconstruct(id, None)),
            Arrival::Within(_) => None,
            Arrival::Exact if distance <= f64::EPSILON => Some(self.reconstruct(id, None)),
            Arrival::Exact => {
                if distance > self.config.step * 1.5 {
                    return None;
                }
                let geometry = self.world.map(node.map)?;
                segment_clear(
                    geometry,
                    &self.hitbox,
                    (node.x, node.y),
                    (self.goal.x, self.goal.y),
                )
                .then(|| self.reconstruct(id, Some(&self.goal)))
            }
        }
    }

    fn expand(&mut self, id: usize) {
        let world = self.world;
        let (map, x, y) = {
            let node = &self.nodes[id];
            (node.map, node.x, node.y)
        };
        let Some(geometry) = world.map(map) else {
            return;
        };

        let step = self.step_size(map, x, y);
        for (dx, dy) in DIRECTIONS {
            let nx = snap(x + dx * step, step);
            let ny = snap(y + dy * step, step);
            if key(map, nx, ny) == key(map, x, y) {
                continue;
            }
            if !segment_clear(geometry, &self.hitbox, (x, y), (nx, ny)) {
                continue;
            }
            let cost = (nx - x).hypot(ny - y);
            self.relax(Some(id), map, nx, ny, None, cost);
        }

        if self.cross_map {
            self.expand_transitions(id, geometry, x, y);
        }
    }

    fn expand_transitions(&mut self, id: usize, geometry: &'w MapGeometry, x: f64, y: f64) {
        let world = self.world;
        let bounds = self.hitbox.at(x, y);
        let cost = self.config.transition_cost;

        // Transitions onto the current map would skip walls; walking covers it.
        for door in &geometry.doors {
            if door.locked
                || door.to_map == geometry.name
                || box_distance(&bounds, &door.region) > self.config.door_range
            {
                continue;
            }
            if let Some((to_map, sx, sy)) = spawn_point(world, &door.to_map, door.to_spawn) {
                self.relax(Some(id), to_map, sx, sy, Some(door.to_spawn), cost);
            }
        }

        for teleporter in &geometry.teleporters {
            if (teleporter.x - x).hypot(teleporter.y - y) > self.config.teleporter_range {
                continue;
            }
            for (place, spawn) in &teleporter.places {
                if *place == geometry.name {
                    continue;
                }
                if let Some((to_map, sx, sy)) = spawn_point(world, place, *spawn) {
                    self.relax(Some(id), to_map, sx, sy, Some(*spawn), cost);
                }
            }
        }
    }

    fn step_size(&self, map: &str, x: f64, y: f64) -> f64 {
        let near_origin = map == self.origin.map
            && (x - self.origin.x).hypot(y - self.origin.y) <= self.config.fine_radius;
        if near_origin {
            self.config.step / 2.0
        } else {
            self.config.step
        }
    }

    fn heuristic(&self, map: &str, x: f64, y: f64) -> f64 {
        if map == self.goal_map {
            self.config.heuristic_weight * (x - self.goal.x).hypot(y - self.goal.y)
        } else {
            self.config.cross_map_penalty
        }
    }

    fn relax(
        &mut self,
        parent: Option<usize>,
        map: &'w str,
        x: f64,
        y: f64,
        spawn: Option<usize>,
        cost: f64,
    ) {
        let g = parent.map_or(0.0, |p| self.nodes[p].g) + cost;
        let key = key(map, x, y);

        let id = match self.index.get(&key) {
            Some(&id) => {
                let node = &mut self.nodes[id];
                if node.closed || g >= node.g {
                    return;
                }
                node.g = g;
                node.parent = parent;
                node.spawn = spawn;
                id
            }
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    map,
                    x,
                    y,
                    spawn,
                    g,
                    parent,
                    closed: false,
                });
                self.index.insert(key, id);
                id
            }
        };

        let f = g + self.heuristic(map, x, y);
        self.open.push(Reverse((OrderedFloat(f), self.pushes, id)));
        self.pushes += 1;
    }

    fn reconstruct(&self, id: usize, tail: Option<&Position>) -> Vec<Waypoint> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.nodes[current].parent;
        }

        let mut path: Vec<Waypoint> = chain
            .into_iter()
            .rev()
            .map(|i| {
                let node = &self.nodes[i];
                Waypoint {
                    position: Position::new(node.x, node.y, node.map),
                    spawn: node.spawn,
                }
            })
            .collect();
        if let Some(goal) = tail {
            path.push(Waypoint::at(goal.clone()));
        }
        path
    }
}

fn snap(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

fn key(map: &str, x: f64, y: f64) -> NodeKey<'_> {
    NodeKey {
        map,
        x: x.round() as i64,
        y: y.round() as i64,
    }
}

fn spawn_point<'w>(world: &'w World, map: &str, spawn: usize) -> Option<(&'w str, f64, f64)> {
    let key = world.map_key(map)?;
    let &(x, y) = world.map(map)?.spawns.get(spawn)?;
    Some((key, x, y))
}
