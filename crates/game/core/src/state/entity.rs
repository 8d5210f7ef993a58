use crate::geometry::{Aabb, Hitbox};
use crate::state::Position;

/// Distinguishes player characters from monsters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    /// A player character; `class` is the host's class identifier.
    Character { class: String },
    /// A monster; `mtype` is the host's monster type identifier.
    Monster { mtype: String },
}

/// Per-tick snapshot of a character or monster as reported by the host.
///
/// Snapshots are never mutated by the bot; the host refreshes them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub position: Position,
    /// Current velocity in pixels per second.
    pub vx: f64,
    pub vy: f64,
    /// Movement speed in pixels per second.
    pub speed: f64,
    pub hp: f64,
    pub max_hp: f64,
    pub mp: f64,
    pub max_mp: f64,
    /// Name of the entity this one is attacking, if any.
    pub target: Option<String>,
    pub dead: bool,
    /// Attack range in pixels.
    pub range: f64,
    /// Damage per hit.
    pub attack: f64,
    /// Hits per second.
    pub frequency: f64,
    pub hitbox: Hitbox,
}

impl Entity {
    /// Character snapshot at full health with no velocity or target.
    pub fn character(id: impl Into<String>, class: impl Into<String>, position: Position) -> Self {
        Self::with_kind(
            id.into(),
            EntityKind::Character {
                class: class.into(),
            },
            position,
        )
    }

    /// Monster snapshot at full health with no velocity or target.
    pub fn monster(id: impl Into<String>, mtype: impl Into<String>, position: Position) -> Self {
        Self::with_kind(
            id.into(),
            EntityKind::Monster {
                mtype: mtype.into(),
            },
            position,
        )
    }

    fn with_kind(id: String, kind: EntityKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            vx: 0.0,
            vy: 0.0,
            speed: 50.0,
            hp: 100.0,
            max_hp: 100.0,
            mp: 100.0,
            max_mp: 100.0,
            target: None,
            dead: false,
            range: 50.0,
            attack: 10.0,
            frequency: 1.0,
            hitbox: Hitbox::DEFAULT,
        }
    }

    pub fn is_monster(&self) -> bool {
        matches!(self.kind, EntityKind::Monster { .. })
    }

    pub fn is_character(&self) -> bool {
        matches!(self.kind, EntityKind::Character { .. })
    }

    /// Monster type, or `None` for characters.
    pub fn mtype(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Monster { mtype } => Some(mtype),
            EntityKind::Character { .. } => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && self.hp > 0.0
    }

    pub fn hp_ratio(&self) -> f64 {
        ratio(self.hp, self.max_hp)
    }

    pub fn mp_ratio(&self) -> f64 {
        ratio(self.mp, self.max_mp)
    }

    /// Damage per second this entity deals with basic attacks.
    pub fn dps(&self) -> f64 {
        self.attack * self.frequency
    }

    pub fn is_moving(&self) -> bool {
        self.vx != 0.0 || self.vy != 0.0
    }

    pub fn is_targeting(&self, id: &str) -> bool {
        self.target.as_deref() == Some(id)
    }

    /// Bounding box at the entity's current position.
    pub fn bounds(&self) -> Aabb {
        self.hitbox.at(self.position.x, self.position.y)
    }

    pub fn distance_to(&self, other: &Entity) -> Option<f64> {
        self.position.distance(&other.position)
    }
}

fn ratio(current: f64, maximum: f64) -> f64 {
    if maximum <= 0.0 {
        return 0.0;
    }
    (current / maximum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_clamped() {
        let mut entity = Entity::character("rogue", "rogue", Position::new(0.0, 0.0, "main"));
        entity.hp = 150.0;
        entity.max_mp = 0.0;
        assert_eq!(entity.hp_ratio(), 1.0);
        assert_eq!(entity.mp_ratio(), 0.0);
    }

    #[test]
    fn dead_flag_overrides_health() {
        let mut goo = Entity::monster("m1", "goo", Position::new(0.0, 0.0, "main"));
        assert!(goo.is_alive());
        goo.dead = true;
        assert!(!goo.is_alive());
        assert_eq!(goo.mtype(), Some("goo"));
    }
}
