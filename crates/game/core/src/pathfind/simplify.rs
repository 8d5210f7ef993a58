use crate::env::World;
use crate::geometry::Hitbox;
use crate::state::Waypoint;

/// Greedy segment merging.
///
/// From each anchor, extends the hop to the furthest later waypoint that is
/// still directly walkable and no longer than `max_segment`. Transition
/// waypoints and map changes are never skipped over. The output keeps the
/// first and last waypoints and is never longer than the input.
pub fn simplify(
    world: &World,
    hitbox: &Hitbox,
    max_segment: f64,
    path: &[Waypoint],
) -> Vec<Waypoint> {
    let Some(first) = path.first() else {
        return Vec::new();
    };

    let mut out = vec![first.clone()];
    let mut anchor = 0;
    while anchor + 1 < path.len() {
        let mut furthest = anchor + 1;
        for candidate in anchor + 2..path.len() {
            if path[candidate - 1].is_transition() || path[candidate].is_transition() {
                break;
            }
            let from = &path[anchor].position;
            let to = &path[candidate].position;
            let Some(length) = from.distance(to) else {
                break;
            };
            if length > max_segment || !world.can_move(hitbox, from, to) {
                break;
            }
            furthest = candidate;
        }
        out.push(path[furthest].clone());
        anchor = furthest;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MapGeometry, SkillTable, VerticalSegment};
    use crate::geometry::Aabb;
    use crate::state::Position;

    fn world() -> World {
        let main = MapGeometry::new(
            "main",
            Aabb::new(-500.0, -500.0, 500.0, 500.0),
            vec![VerticalSegment::new(50.0, -20.0, 20.0)],
            Vec::new(),
            vec![(0.0, 0.0)],
        );
        let cave = MapGeometry::open("cave", Aabb::new(-100.0, -100.0, 100.0, 100.0));
        World::new([main, cave], SkillTable::default())
    }

    fn line(points: &[(f64, f64)]) -> Vec<Waypoint> {
        points
            .iter()
            .map(|&(x, y)| Waypoint::at(Position::new(x, y, "main")))
            .collect()
    }

    #[test]
    fn collinear_points_collapse() {
        let world = world();
        let path = line(&[(0.0, 100.0), (16.0, 100.0), (32.0, 100.0), (48.0, 100.0)]);
        let out = simplify(&world, &Hitbox::DEFAULT, 320.0, &path);
        assert_eq!(out, vec![path[0].clone(), path[3].clone()]);
    }

    #[test]
    fn blocked_shortcut_keeps_corner() {
        let world = world();
        let path = line(&[(0.0, 0.0), (0.0, 40.0), (100.0, 40.0), (100.0, 0.0)]);
        let out = simplify(&world, &Hitbox::DEFAULT, 320.0, &path);

        assert!(out.len() <= path.len());
        assert_eq!(out.first(), path.first());
        assert_eq!(out.last(), path.last());
        for pair in out.windows(2) {
            assert!(world.can_move(&Hitbox::DEFAULT, &pair[0].position, &pair[1].position));
        }
    }

    #[test]
    fn segment_length_is_capped() {
        let world = world();
        let path = line(&[(0.0, 100.0), (100.0, 100.0), (200.0, 100.0), (300.0, 100.0)]);
        let out = simplify(&world, &Hitbox::DEFAULT, 150.0, &path);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn transitions_are_preserved() {
        let world = world();
        let mut path = line(&[(0.0, 100.0), (16.0, 100.0)]);
        path.push(Waypoint::transition(Position::new(0.0, 0.0, "cave"), 0));
        path.push(Waypoint::at(Position::new(16.0, 0.0, "cave")));
        path.push(Waypoint::at(Position::new(32.0, 0.0, "cave")));

        let out = simplify(&world, &Hitbox::DEFAULT, 320.0, &path);
        assert_eq!(out.len(), 4);
        assert_eq!(out[1], path[1]);
        assert_eq!(out[2], path[2]);
        assert_eq!(out[3], path[4]);
    }

    #[test]
    fn empty_path_stays_empty() {
        assert!(simplify(&world(), &Hitbox::DEFAULT, 320.0, &[]).is_empty());
    }
}
