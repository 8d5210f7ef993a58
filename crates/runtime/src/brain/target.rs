//! Target selection for the Find step.

use game_core::{BrainConfig, Entity, difficulty};

/// A chosen target together with its difficulty score.
#[derive(Clone, Debug, PartialEq)]
pub struct Pick {
    pub entity: Entity,
    pub difficulty: f64,
}

/// Picks the next monster to fight, in order of preference:
///
/// 1. a monster attacking `me`
/// 2. a monster attacking a party member
/// 3. a configured priority type, in configuration order
/// 4. an untargeted monster whose difficulty lies in the configured band
///
/// Within each tier the nearest monster wins. Only living monsters on
/// `me`'s map are considered.
pub fn select_target(
    config: &BrainConfig,
    me: &Entity,
    party: &[Entity],
    entities: &[Entity],
) -> Option<Pick> {
    let monsters: Vec<&Entity> = entities
        .iter()
        .filter(|entity| entity.is_monster() && entity.is_alive())
        .filter(|entity| entity.position.same_map(&me.position))
        .collect();
    let ours = |monster: &Entity| {
        monster.target.is_none()
            || monster.is_targeting(&me.id)
            || party.iter().any(|member| monster.is_targeting(&member.id))
    };

    let attacking_me = nearest(me, monsters.iter().copied().filter(|m| m.is_targeting(&me.id)));
    let attacking_party = || {
        nearest(
            me,
            monsters
                .iter()
                .copied()
                .filter(|m| party.iter().any(|member| m.is_targeting(&member.id))),
        )
    };
    let priority = || {
        config.priority_monsters.iter().find_map(|mtype| {
            nearest(
                me,
                monsters
                    .iter()
                    .copied()
                    .filter(|m| m.mtype() == Some(mtype.as_str()) && ours(m)),
            )
        })
    };
    let in_band = || {
        nearest(
            me,
            monsters.iter().copied().filter(|m| {
                let score = difficulty(me, m);
                m.target.is_none()
                    && score >= config.min_difficulty
                    && score <= config.max_difficulty
            }),
        )
    };

    attacking_me
        .or_else(attacking_party)
        .or_else(priority)
        .or_else(in_band)
        .map(|entity| Pick {
            difficulty: difficulty(me, entity),
            entity: entity.clone(),
        })
}

fn nearest<'a>(me: &Entity, candidates: impl Iterator<Item = &'a Entity>) -> Option<&'a Entity> {
    candidates
        .filter_map(|candidate| me.distance_to(candidate).map(|d| (d, candidate)))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use game_core::Position;

    use super::*;

    fn at(x: f64, y: f64) -> Position {
        Position::new(x, y, "main")
    }

    fn me() -> Entity {
        Entity::character("me", "warrior", at(0.0, 0.0))
    }

    fn monster(id: &str, mtype: &str, x: f64) -> Entity {
        let mut monster = Entity::monster(id, mtype, at(x, 0.0));
        monster.hp = 20.0;
        monster.max_hp = 20.0;
        monster.attack = 1.0;
        monster
    }

    fn targeting(mut monster: Entity, target: &str) -> Entity {
        monster.target = Some(target.into());
        monster
    }

    #[test]
    fn attacker_beats_everything() {
        let config = BrainConfig {
            priority_monsters: vec!["phoenix".into()],
            ..BrainConfig::default()
        };
        let entities = vec![
            monster("near", "goo", 10.0),
            monster("bird", "phoenix", 20.0),
            targeting(monster("angry", "goo", 300.0), "me"),
        ];
        let pick = select_target(&config, &me(), &[], &entities).expect("pick");
        assert_eq!(pick.entity.id, "angry");
    }

    #[test]
    fn party_attackers_come_next() {
        let friend = Entity::character("friend", "priest", at(50.0, 0.0));
        let entities = vec![
            monster("near", "goo", 10.0),
            targeting(monster("bully", "goo", 200.0), "friend"),
        ];
        let pick = select_target(&BrainConfig::default(), &me(), &[friend], &entities);
        assert_eq!(pick.map(|p| p.entity.id), Some("bully".to_string()));
    }

    #[test]
    fn priority_types_follow_configured_order() {
        let config = BrainConfig {
            priority_monsters: vec!["goldenbat".into(), "phoenix".into()],
            ..BrainConfig::default()
        };
        let entities = vec![
            monster("near", "goo", 10.0),
            monster("bird", "phoenix", 20.0),
            monster("bat", "goldenbat", 400.0),
        ];
        let pick = select_target(&config, &me(), &[], &entities);
        assert_eq!(pick.map(|p| p.entity.id), Some("bat".to_string()));
    }

    #[test]
    fn nearest_monster_in_band_otherwise() {
        let mut dragon = monster("dragon", "dragon", 5.0);
        dragon.hp = 100_000.0;
        dragon.max_hp = 100_000.0;
        dragon.attack = 500.0;
        let entities = vec![
            dragon,
            targeting(monster("taken", "goo", 8.0), "stranger"),
            monster("far", "goo", 90.0),
            monster("close", "goo", 30.0),
        ];
        let pick = select_target(&BrainConfig::default(), &me(), &[], &entities).expect("pick");
        assert_eq!(pick.entity.id, "close");
        assert!(pick.difficulty <= BrainConfig::default().max_difficulty);
    }

    #[test]
    fn other_maps_and_corpses_are_ignored() {
        let mut dead = monster("dead", "goo", 10.0);
        dead.dead = true;
        let mut away = monster("away", "goo", 10.0);
        away.position.map = "cave".into();
        assert_eq!(select_target(&BrainConfig::default(), &me(), &[], &[dead, away]), None);
    }
}
