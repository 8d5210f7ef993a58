//! Grid pathfinding across maps.
//!
//! [`Pathfinder`] owns the static inputs of a search (world, hitbox, tuning);
//! each [`PathRequest`] becomes a [`Search`] that can be stepped in slices or
//! run to completion. Returned paths start at the origin and satisfy
//! `can_move` between every consecutive same-map pair.
mod search;
mod simplify;

pub use search::{Search, SearchProgress};
pub use simplify::simplify;

use crate::config::PathfindConfig;
use crate::env::World;
use crate::error::PathfindError;
use crate::geometry::Hitbox;
use crate::state::{Position, Waypoint};

/// When a search may stop.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arrival {
    /// Any node within this many pixels of the goal.
    Within(f64),
    /// The literal goal, reached by a final direct move test.
    Exact,
}

/// One pathfinding query. The goal is a coordinate snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRequest {
    pub origin: Position,
    pub goal: Position,
    pub arrival: Arrival,
    /// Allow door and teleporter edges.
    pub cross_map: bool,
    /// Overrides [`PathfindConfig::max_expansions`].
    pub max_expansions: Option<usize>,
}

impl PathRequest {
    pub fn new(origin: Position, goal: Position) -> Self {
        Self {
            origin,
            goal,
            arrival: Arrival::Exact,
            cross_map: true,
            max_expansions: None,
        }
    }

    pub fn within(mut self, range: f64) -> Self {
        self.arrival = Arrival::Within(range);
        self
    }

    pub fn exact(mut self) -> Self {
        self.arrival = Arrival::Exact;
        self
    }

    pub fn same_map_only(mut self) -> Self {
        self.cross_map = false;
        self
    }

    pub fn max_expansions(mut self, expansions: usize) -> Self {
        self.max_expansions = Some(expansions);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Pathfinder<'w> {
    world: &'w World,
    hitbox: Hitbox,
    config: PathfindConfig,
}

impl<'w> Pathfinder<'w> {
    pub fn new(world: &'w World, hitbox: Hitbox, config: PathfindConfig) -> Self {
        Self {
            world,
            hitbox,
            config,
        }
    }

    pub fn config(&self) -> &PathfindConfig {
        &self.config
    }

    /// Starts a resumable search. Fails fast on unknown maps and on
    /// cross-map goals when `request.cross_map` is off.
    pub fn search(&self, request: &PathRequest) -> Result<Search<'w>, PathfindError> {
        Search::new(self.world, self.hitbox, self.config.clone(), request)
    }

    /// Searches to completion and simplifies the result.
    pub fn find_path(&self, request: &PathRequest) -> Result<Vec<Waypoint>, PathfindError> {
        let raw = self.search(request)?.run()?;
        Ok(self.simplify(&raw))
    }

    pub fn simplify(&self, path: &[Waypoint]) -> Vec<Waypoint> {
        simplify(self.world, &self.hitbox, self.config.max_segment_length, path)
    }
}
