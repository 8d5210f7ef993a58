use crate::state::Entity;

/// Highest (worst) difficulty score.
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Scores how risky it is for `me` to fight `them`, from 0 (trivial) to 10.
///
/// Both sides trade blows at their current DPS until the faster kill lands.
/// Half the score is the share of our health we would lose, half is the share
/// of their health we would fail to remove. Damage dealt by each side is
/// capped at the other's remaining health.
pub fn difficulty(me: &Entity, them: &Entity) -> f64 {
    let my_dps = me.dps();
    let their_dps = them.dps();
    if me.hp <= 0.0 || (my_dps <= 0.0 && their_dps <= 0.0) {
        return MAX_DIFFICULTY;
    }
    if them.hp <= 0.0 {
        return 0.0;
    }

    let time_to_kill_them = if my_dps > 0.0 {
        them.hp / my_dps
    } else {
        f64::INFINITY
    };
    let time_to_kill_me = if their_dps > 0.0 {
        me.hp / their_dps
    } else {
        f64::INFINITY
    };
    let fight = time_to_kill_them.min(time_to_kill_me);

    let taken = (their_dps * fight).min(me.hp) / me.hp;
    let not_dealt = 1.0 - (my_dps * fight).min(them.hp) / them.hp;

    let score = MAX_DIFFICULTY * (0.5 * taken + 0.5 * not_dealt);
    if score.is_nan() {
        MAX_DIFFICULTY
    } else {
        score.clamp(0.0, MAX_DIFFICULTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Position;

    fn fighter(hp: f64, attack: f64) -> Entity {
        let mut entity = Entity::character("me", "warrior", Position::new(0.0, 0.0, "main"));
        entity.hp = hp;
        entity.max_hp = hp;
        entity.attack = attack;
        entity
    }

    fn monster(hp: f64, attack: f64) -> Entity {
        let mut entity = Entity::monster("m", "goo", Position::new(10.0, 0.0, "main"));
        entity.hp = hp;
        entity.max_hp = hp;
        entity.attack = attack;
        entity
    }

    #[test]
    fn harmless_monster_is_trivial() {
        assert_eq!(difficulty(&fighter(100.0, 10.0), &monster(50.0, 0.0)), 0.0);
    }

    #[test]
    fn even_fight_scores_midway() {
        // Both die at the same instant: all our hp taken, all theirs dealt.
        assert_eq!(difficulty(&fighter(100.0, 10.0), &monster(100.0, 10.0)), 5.0);
    }

    #[test]
    fn overmatched_fight_scores_high() {
        let score = difficulty(&fighter(100.0, 1.0), &monster(1000.0, 50.0));
        assert!(score > 9.0, "{score}");
    }

    #[test]
    fn score_stays_in_bounds() {
        for hp in [1.0, 10.0, 500.0, 10_000.0] {
            for attack in [0.1, 5.0, 80.0, 3_000.0] {
                let score = difficulty(&fighter(hp, attack), &monster(hp * 2.0, attack / 3.0));
                assert!((0.0..=MAX_DIFFICULTY).contains(&score), "{score}");
            }
        }
    }

    #[test]
    fn no_damage_either_way_is_rejected() {
        assert_eq!(difficulty(&fighter(100.0, 0.0), &monster(100.0, 0.0)), MAX_DIFFICULTY);
    }
}
