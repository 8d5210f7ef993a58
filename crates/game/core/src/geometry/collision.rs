//! Swept-box collision against static map segments and other movers.
//!
//! Every test reduces to one box moving by a displacement over `t ∈ [0, 1]`
//! against one static box, using per-axis entry/exit times (slab method).
//! Two moving boxes are handled by working in the frame of the second one.

use super::{Aabb, Hitbox};
use crate::env::MapGeometry;
use crate::state::Position;

/// Extra seconds added to the look-ahead window of [`will_collide`] so that a
/// contact landing exactly on the horizon is still reported.
pub const COLLISION_TIME_FUDGE: f64 = 0.05;

/// A box together with its velocity in pixels per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovingBox {
    pub bounds: Aabb,
    pub vx: f64,
    pub vy: f64,
}

impl MovingBox {
    pub fn new(bounds: Aabb, vx: f64, vy: f64) -> Self {
        Self { bounds, vx, vy }
    }
}

/// Entry/exit times of a moving interval against a static one along one axis.
///
/// Returns `None` when the intervals can never overlap on this axis.
fn axis_window(a_min: f64, a_max: f64, d: f64, b_min: f64, b_max: f64) -> Option<(f64, f64)> {
    if d == 0.0 {
        if a_max > b_min && a_min < b_max {
            Some((f64::NEG_INFINITY, f64::INFINITY))
        } else {
            None
        }
    } else if d > 0.0 {
        Some(((b_min - a_max) / d, (b_max - a_min) / d))
    } else {
        Some(((b_max - a_min) / d, (b_min - a_max) / d))
    }
}

/// Sweeps `moving` by `(dx, dy)` against the static `obstacle`.
///
/// Returns the normalized time of first contact when the latest per-axis
/// entry is no later than the earliest exit and falls within `[0, 1]`.
/// Boxes already interpenetrating at `t = 0` do not count as a new contact.
pub fn sweep(moving: &Aabb, dx: f64, dy: f64, obstacle: &Aabb) -> Option<f64> {
    let (x_entry, x_exit) = axis_window(
        moving.min_x,
        moving.max_x,
        dx,
        obstacle.min_x,
        obstacle.max_x,
    )?;
    let (y_entry, y_exit) = axis_window(
        moving.min_y,
        moving.max_y,
        dy,
        obstacle.min_y,
        obstacle.max_y,
    )?;

    let entry = x_entry.max(y_entry);
    let exit = x_exit.min(y_exit);

    if entry <= exit && (0.0..=1.0).contains(&entry) {
        Some(entry)
    } else {
        None
    }
}

/// Whether a character with `hitbox` can walk in a straight line from
/// `here` to `there` without crossing any wall segment of `geometry`.
///
/// Always `false` across maps.
pub fn can_move(
    geometry: &MapGeometry,
    hitbox: &Hitbox,
    here: &Position,
    there: &Position,
) -> bool {
    if here.map != there.map || here.map != geometry.name {
        return false;
    }
    segment_clear(geometry, hitbox, (here.x, here.y), (there.x, there.y))
}

/// Map-local form of [`can_move`] on raw coordinates.
pub fn segment_clear(
    geometry: &MapGeometry,
    hitbox: &Hitbox,
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
) -> bool {
    if !geometry.bounds.contains_point(x1, y1) {
        return false;
    }

    let start = hitbox.at(x0, y0);
    let dx = x1 - x0;
    let dy = y1 - y0;
    let region = start.union(&start.translate(dx, dy));

    // Vertical walls sorted by x: only those inside the swept region's x-range.
    let lo = geometry.x_lines.partition_point(|s| s.x < region.min_x);
    let hi = geometry.x_lines.partition_point(|s| s.x <= region.max_x);
    for wall in &geometry.x_lines[lo..hi] {
        if wall.y2 < region.min_y || wall.y1 > region.max_y {
            continue;
        }
        if sweep(&start, dx, dy, &wall.bounds()).is_some() {
            return false;
        }
    }

    let lo = geometry.y_lines.partition_point(|s| s.y < region.min_y);
    let hi = geometry.y_lines.partition_point(|s| s.y <= region.max_y);
    for wall in &geometry.y_lines[lo..hi] {
        if wall.x2 < region.min_x || wall.x1 > region.max_x {
            continue;
        }
        if sweep(&start, dx, dy, &wall.bounds()).is_some() {
            return false;
        }
    }

    true
}

/// Whether two boxes moving at constant velocity touch within `t_max` seconds.
///
/// Evaluated in `b`'s frame: `a` moves by `(va - vb) * t`, `b` stands still.
pub fn will_collide(a: &MovingBox, b: &MovingBox, t_max: f64) -> bool {
    let horizon = t_max.max(0.0) + COLLISION_TIME_FUDGE;
    let dx = (a.vx - b.vx) * horizon;
    let dy = (a.vy - b.vy) * horizon;
    sweep(&a.bounds, dx, dy, &b.bounds).is_some() || overlaps(&a.bounds, &b.bounds)
}

fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.max_x > b.min_x && a.min_x < b.max_x && a.max_y > b.min_y && a.min_y < b.max_y
}

/// Gap between two boxes; `0.0` when they touch or overlap.
pub fn box_distance(a: &Aabb, b: &Aabb) -> f64 {
    let dx = (a.min_x - b.max_x).max(b.min_x - a.max_x).max(0.0);
    let dy = (a.min_y - b.max_y).max(b.min_y - a.max_y).max(0.0);
    dx.hypot(dy)
}
