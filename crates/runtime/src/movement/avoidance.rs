//! Ring search for a reachable destination that does not run into other
//! movers.

use std::f64::consts::TAU;

use rand::Rng;
use tracing::debug;

use game_core::{Aabb, Entity, MovementConfig, MovingBox, Position, World, will_collide};

/// Returns `dest` if it is reachable and collision free, otherwise the first
/// acceptable point found on rings of growing radius around it.
///
/// A candidate must be walkable from `me`, cover at least half of the
/// originally intended distance, and not collide with any of `others`. The
/// collision requirement is dropped once the ring radius passes
/// `avoid_relax_radius`. If no ring yields a candidate the original `dest`
/// is returned unchanged.
pub fn avoid_collisions<R: Rng + ?Sized>(
    world: &World,
    config: &MovementConfig,
    me: &Entity,
    others: &[Entity],
    dest: &Position,
    rng: &mut R,
) -> Position {
    let Some(intended) = me.position.distance(dest) else {
        return dest.clone();
    };
    if world.can_move(&me.hitbox, &me.position, dest) && !collides(config, me, others, dest) {
        return dest.clone();
    }

    let min_travel = intended / 2.0;
    let growth = config.avoid_growth.max(1.05);
    let mut radius = config.avoid_initial_radius.max(1.0);
    while radius <= config.avoid_max_radius {
        let strict = radius <= config.avoid_relax_radius;
        for _ in 0..config.avoid_samples.max(1) {
            let angle = rng.random_range(0.0..TAU);
            let candidate = dest.offset(radius * angle.cos(), radius * angle.sin());
            let acceptable = me
                .position
                .distance(&candidate)
                .is_some_and(|travel| travel >= min_travel)
                && world.can_move(&me.hitbox, &me.position, &candidate)
                && !(strict && collides(config, me, others, &candidate));
            if acceptable {
                debug!(
                    target: "runtime::movement",
                    radius,
                    dest = %dest,
                    chosen = %candidate,
                    "avoided collision"
                );
                return candidate;
            }
        }
        radius *= growth;
    }

    debug!(
        target: "runtime::movement",
        dest = %dest,
        "no avoidance candidate, moving anyway"
    );
    dest.clone()
}

/// Whether walking from `me` toward `dest` at full speed meets another
/// mover within the configured horizon. A mover already overlapping `me`
/// only counts while the two are closing in on each other.
fn collides(config: &MovementConfig, me: &Entity, others: &[Entity], dest: &Position) -> bool {
    let Some(distance) = me.position.distance(dest) else {
        return false;
    };
    let (vx, vy) = if distance > f64::EPSILON {
        (
            (dest.x - me.position.x) / distance * me.speed,
            (dest.y - me.position.y) / distance * me.speed,
        )
    } else {
        (0.0, 0.0)
    };
    let horizon = config
        .collision_horizon_secs
        .min(if me.speed > 0.0 { distance / me.speed } else { 0.0 });
    let bounds = me.bounds();
    let mover = MovingBox::new(bounds, vx, vy);

    others
        .iter()
        .filter(|other| {
            other.id != me.id && other.is_alive() && other.position.same_map(&me.position)
        })
        .any(|other| {
            let other_bounds = other.bounds();
            if overlapping(&bounds, &other_bounds) {
                let (ax, ay) = bounds.center();
                let (bx, by) = other_bounds.center();
                return (vx - other.vx) * (bx - ax) + (vy - other.vy) * (by - ay) > 0.0;
            }
            let obstacle = MovingBox::new(other_bounds, other.vx, other.vy);
            will_collide(&mover, &obstacle, horizon)
        })
}

fn overlapping(a: &Aabb, b: &Aabb) -> bool {
    a.min_x < b.max_x && b.min_x < a.max_x && a.min_y < b.max_y && b.min_y < a.max_y
}

#[cfg(test)]
mod tests {
    use game_core::{MapGeometry, SkillTable, VerticalSegment};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn world() -> World {
        let main = MapGeometry::new(
            "main",
            Aabb::new(-1000.0, -1000.0, 1000.0, 1000.0),
            vec![VerticalSegment::new(100.0, -40.0, 40.0)],
            Vec::new(),
            vec![(0.0, 0.0)],
        );
        World::new([main], SkillTable::default())
    }

    fn at(x: f64, y: f64) -> Position {
        Position::new(x, y, "main")
    }

    fn me() -> Entity {
        Entity::character("me", "warrior", at(0.0, 0.0))
    }

    #[test]
    fn clear_destination_is_kept() {
        let mut rng = StdRng::seed_from_u64(7);
        let dest = at(0.0, 200.0);
        let config = MovementConfig::default();
        let chosen = avoid_collisions(&world(), &config, &me(), &[], &dest, &mut rng);
        assert_eq!(chosen, dest);
    }

    #[test]
    fn stacked_ally_does_not_block_moving_away() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = MovementConfig::default();
        let ally = Entity::character("ally", "priest", at(4.0, 0.0));
        let dest = at(-300.0, 300.0);

        let chosen = avoid_collisions(&world(), &config, &me(), &[ally], &dest, &mut rng);
        assert_eq!(chosen, dest);
    }

    #[test]
    fn stacked_ally_blocks_walking_through_it() {
        let config = MovementConfig::default();
        let ally = Entity::character("ally", "priest", at(4.0, 0.0));
        assert!(collides(&config, &me(), &[ally], &at(60.0, 0.0)));
    }

    #[test]
    fn blocked_destination_is_replaced_by_reachable_point() {
        let world = world();
        let config = MovementConfig::default();
        let me = me();
        let dest = at(200.0, 0.0);

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = avoid_collisions(&world, &config, &me, &[], &dest, &mut rng);
            assert_ne!(chosen, dest, "seed {seed}");
            assert!(world.can_move(&me.hitbox, &me.position, &chosen));
            let travel = me.position.distance(&chosen).expect("same map");
            assert!(travel >= 100.0, "seed {seed}: {travel}");
        }
    }

    #[test]
    fn oncoming_mover_is_avoided() {
        let world = world();
        let config = MovementConfig::default();
        let me = me();
        let dest = at(0.0, 80.0);
        let mut blocker = Entity::monster("wall", "golem", at(0.0, 40.0));
        blocker.vy = -50.0;

        let mut rng = StdRng::seed_from_u64(3);
        let chosen = avoid_collisions(&world, &config, &me, &[blocker.clone()], &dest, &mut rng);
        assert_ne!(chosen, dest);
        let relaxed = chosen.distance(&dest).unwrap_or(0.0) > config.avoid_relax_radius;
        assert!(!collides(&config, &me, &[blocker], &chosen) || relaxed);
    }

    #[test]
    fn unreachable_everywhere_falls_back_to_dest() {
        let config = MovementConfig {
            avoid_max_radius: 5.0,
            ..MovementConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let dest = at(200.0, 0.0);
        let chosen = avoid_collisions(&world(), &config, &me(), &[], &dest, &mut rng);
        assert_eq!(chosen, dest);
    }
}
