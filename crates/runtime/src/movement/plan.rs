//! Pure geometry used to pick where the next primitive move goes.

use std::f64::consts::TAU;

use game_core::{Entity, Hitbox, MovementConfig, Position, World};

/// Where `target` will be when `me` gets there, extrapolating its current
/// velocity over our own travel time.
pub fn lead_point(me: &Entity, target: &Entity) -> Position {
    if !target.is_moving() || me.speed <= 0.0 {
        return target.position.clone();
    }
    let Some(distance) = me.position.distance(&target.position) else {
        return target.position.clone();
    };
    let eta = distance / me.speed;
    target.position.offset(target.vx * eta, target.vy * eta)
}

/// Shortens the hop from `from` to `to` to at most `max_distance`.
pub fn clamp_travel(from: &Position, to: &Position, max_distance: f64) -> Position {
    let Some(distance) = from.distance(to) else {
        return to.clone();
    };
    if distance <= max_distance || distance <= f64::EPSILON {
        return to.clone();
    }
    let max_distance = max_distance.max(0.0);
    from.with_xy(
        from.x + (to.x - from.x) * max_distance / distance,
        from.y + (to.y - from.y) * max_distance / distance,
    )
}

/// Radius to circle a hostile at: a little further than now, but never
/// beyond the configured fraction of our attack range.
pub fn stand_off(distance: f64, range: f64, config: &MovementConfig) -> f64 {
    (distance + config.kite_buffer).min(config.kite_range_ratio * range)
}

/// First walkable point on the circle of `radius` around `center`, starting
/// at `angle` and advancing clockwise by `step` until a full turn is tried.
pub fn circle_point(
    world: &World,
    hitbox: &Hitbox,
    from: &Position,
    center: &Position,
    radius: f64,
    angle: f64,
    step: f64,
) -> Option<Position> {
    let step = if step > 0.0 { step } else { TAU / 16.0 };
    let attempts = (TAU / step).ceil() as usize;
    (0..attempts)
        .map(|i| angle + step * i as f64)
        .map(|a| center.offset(radius * a.cos(), radius * a.sin()))
        .find(|point| world.can_move(hitbox, from, point))
}

#[cfg(test)]
mod tests {
    use game_core::{Aabb, MapGeometry, SkillTable, VerticalSegment};

    use super::*;

    fn at(x: f64, y: f64) -> Position {
        Position::new(x, y, "main")
    }

    #[test]
    fn stationary_target_is_not_led() {
        let me = Entity::character("me", "ranger", at(0.0, 0.0));
        let target = Entity::monster("goo", "goo", at(100.0, 0.0));
        assert_eq!(lead_point(&me, &target), at(100.0, 0.0));
    }

    #[test]
    fn moving_target_is_led_by_travel_time() {
        let mut me = Entity::character("me", "ranger", at(0.0, 0.0));
        me.speed = 50.0;
        let mut target = Entity::monster("bat", "bat", at(100.0, 0.0));
        target.vy = 10.0;
        // Two seconds to cover 100px at 50px/s.
        assert_eq!(lead_point(&me, &target), at(100.0, 20.0));
    }

    #[test]
    fn long_hops_are_clamped() {
        let clamped = clamp_travel(&at(0.0, 0.0), &at(300.0, 400.0), 50.0);
        assert_eq!(clamped, at(30.0, 40.0));
        assert_eq!(clamp_travel(&at(0.0, 0.0), &at(3.0, 4.0), 50.0), at(3.0, 4.0));
    }

    #[test]
    fn stand_off_respects_range_ratio() {
        let config = MovementConfig::default();
        assert_eq!(stand_off(10.0, 100.0, &config), 30.0);
        assert_eq!(stand_off(90.0, 100.0, &config), 80.0);
    }

    #[test]
    fn blocked_circle_point_is_skipped() {
        let main = MapGeometry::new(
            "main",
            Aabb::new(-500.0, -500.0, 500.0, 500.0),
            vec![VerticalSegment::new(40.0, -100.0, 100.0)],
            Vec::new(),
            vec![(0.0, 0.0)],
        );
        let world = World::new([main], SkillTable::default());
        let center = at(0.0, 0.0);
        let from = at(-10.0, 0.0);

        let point = circle_point(&world, &Hitbox::DEFAULT, &from, &center, 60.0, 0.0, 0.5)
            .expect("some free point");
        assert!(point.x < 40.0);
        assert!(world.can_move(&Hitbox::DEFAULT, &from, &point));
    }
}
