use std::fmt;

/// A point in world space, qualified by the map it belongs to.
///
/// Positions on different maps share a coordinate system in name only;
/// every distance or collision helper checks `map` first and refuses to
/// compare across maps.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub map: String,
}

impl Position {
    pub fn new(x: f64, y: f64, map: impl Into<String>) -> Self {
        Self {
            x,
            y,
            map: map.into(),
        }
    }

    /// Returns a copy moved to `(x, y)` on the same map.
    pub fn with_xy(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            map: self.map.clone(),
        }
    }

    /// Returns a copy displaced by `(dx, dy)` on the same map.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        self.with_xy(self.x + dx, self.y + dy)
    }

    pub fn same_map(&self, other: &Position) -> bool {
        self.map == other.map
    }

    /// Euclidean distance, or `None` when the positions are on different maps.
    pub fn distance(&self, other: &Position) -> Option<f64> {
        distance_between(self, other)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}) @ {}", self.x, self.y, self.map)
    }
}

/// Distance between two positions; `None` when they are on different maps.
pub fn distance_between(a: &Position, b: &Position) -> Option<f64> {
    if a.map != b.map {
        return None;
    }
    Some((a.x - b.x).hypot(a.y - b.y))
}

/// One stop in a planned path.
///
/// `spawn` is set when reaching this waypoint requires a map transition
/// through a door or teleporter; it names the destination spawn index.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub position: Position,
    pub spawn: Option<usize>,
}

impl Waypoint {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            spawn: None,
        }
    }

    pub fn transition(position: Position, spawn: usize) -> Self {
        Self {
            position,
            spawn: Some(spawn),
        }
    }

    pub fn is_transition(&self) -> bool {
        self.spawn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_on_same_map() {
        let a = Position::new(0.0, 0.0, "main");
        let b = Position::new(3.0, 4.0, "main");
        assert_eq!(a.distance(&b), Some(5.0));
    }

    #[test]
    fn distance_across_maps_is_absent() {
        let a = Position::new(0.0, 0.0, "main");
        let b = Position::new(0.0, 0.0, "halloween");
        assert_eq!(distance_between(&a, &b), None);
    }
}
