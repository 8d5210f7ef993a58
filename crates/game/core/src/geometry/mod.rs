//! Axis-aligned boxes and the swept-box collision tests built on them.
//!
//! All functions here are pure. Map-level queries (`can_move`) live in
//! [`collision`] and take the static geometry of one map.
pub mod collision;

pub use collision::{MovingBox, box_distance, can_move, segment_clear, sweep, will_collide};

/// Axis-aligned bounding box in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box with its top-left corner at `(x, y)`.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Character footprint relative to its position.
///
/// The box spans `x - h ..= x + h` horizontally and `y - v ..= y + vn`
/// vertically (screen coordinates, y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hitbox {
    pub h: f64,
    pub v: f64,
    pub vn: f64,
}

impl Hitbox {
    pub const DEFAULT: Self = Self {
        h: 8.0,
        v: 7.0,
        vn: 2.0,
    };

    pub const fn new(h: f64, v: f64, vn: f64) -> Self {
        Self { h, v, vn }
    }

    pub fn at(&self, x: f64, y: f64) -> Aabb {
        Aabb::new(x - self.h, y - self.v, x + self.h, y + self.vn)
    }
}

impl Default for Hitbox {
    fn default() -> Self {
        Self::DEFAULT
    }
}
