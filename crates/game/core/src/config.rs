//! Tunable parameters for every layer of the bot.
//!
//! Each section has conservative defaults; loaders fill in only what a
//! config file overrides.
use std::time::Duration;

/// Top-level configuration, one section per subsystem.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BotConfig {
    pub pathfind: PathfindConfig,
    pub movement: MovementConfig,
    pub skills: SkillConfig,
    pub brain: BrainConfig,
}

/// Grid search parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PathfindConfig {
    /// Grid spacing in pixels.
    pub step: f64,
    /// Within this distance of the origin the step is halved.
    pub fine_radius: f64,
    /// Multiplier on the Euclidean heuristic (weighted A*).
    pub heuristic_weight: f64,
    /// Heuristic charged for a node on a different map than the goal.
    pub cross_map_penalty: f64,
    /// Cost of a door or teleporter edge.
    pub transition_cost: f64,
    /// Maximum gap between the hitbox and a door region to use the door.
    pub door_range: f64,
    /// Maximum distance to a teleporter NPC to use it.
    pub teleporter_range: f64,
    /// Node expansions before the search gives up.
    pub max_expansions: usize,
    /// Node expansions between cooperative yields.
    pub expansions_per_yield: usize,
    /// Longest hop the simplifier may produce.
    pub max_segment_length: f64,
    /// Default arrival radius for "close enough" searches.
    pub default_range: f64,
}

impl Default for PathfindConfig {
    fn default() -> Self {
        Self {
            step: 16.0,
            fine_radius: 64.0,
            heuristic_weight: 1.2,
            cross_map_penalty: 10_000.0,
            transition_cost: 1.0,
            door_range: 40.0,
            teleporter_range: 75.0,
            max_expansions: 40_000,
            expansions_per_yield: 500,
            max_segment_length: 320.0,
            default_range: 32.0,
        }
    }
}

/// Movement engine parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MovementConfig {
    /// Extrapolate moving targets by their velocity.
    pub lead_targets: bool,
    /// First ring radius of the avoidance search.
    pub avoid_initial_radius: f64,
    /// Ring radius multiplier per step.
    pub avoid_growth: f64,
    /// Avoidance gives up beyond this radius.
    pub avoid_max_radius: f64,
    /// Random angular samples per ring.
    pub avoid_samples: usize,
    /// Beyond this radius, candidates may collide with other movers.
    pub avoid_relax_radius: f64,
    /// Look-ahead in seconds when predicting collisions with other entities.
    pub collision_horizon_secs: f64,
    /// Pixels added to the current distance when choosing a kite stand-off.
    pub kite_buffer: f64,
    /// Fraction of attack range used as the maximum kite stand-off.
    pub kite_range_ratio: f64,
    /// Clockwise angular step around the target per kite iteration (radians).
    pub kite_angle_step: f64,
    pub kite_interval_ms: u64,
    /// How long to wait for the host to report a map change.
    pub transition_timeout_ms: u64,
    /// Waypoints closer than this are treated as reached.
    pub arrive_tolerance: f64,
}

impl MovementConfig {
    pub fn kite_interval(&self) -> Duration {
        Duration::from_millis(self.kite_interval_ms)
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            lead_targets: true,
            avoid_initial_radius: 10.0,
            avoid_growth: 1.5,
            avoid_max_radius: 800.0,
            avoid_samples: 8,
            avoid_relax_radius: 400.0,
            collision_horizon_secs: 1.0,
            kite_buffer: 20.0,
            kite_range_ratio: 0.8,
            kite_angle_step: std::f64::consts::FRAC_PI_8,
            kite_interval_ms: 250,
            transition_timeout_ms: 5_000,
            arrive_tolerance: 2.0,
        }
    }
}

/// Skill scheduler parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SkillConfig {
    /// Pause after a transient cast failure.
    pub retry_backoff_ms: u64,
    pub attack_skill: String,
    pub hp_potion_skill: String,
    pub mp_potion_skill: String,
    /// Drink HP potions below this ratio.
    pub regen_hp_ratio: f64,
    /// Drink MP potions below this ratio.
    pub regen_mp_ratio: f64,
}

impl SkillConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ms: 250,
            attack_skill: "attack".into(),
            hp_potion_skill: "use_hp".into(),
            mp_potion_skill: "use_mp".into(),
            regen_hp_ratio: 0.6,
            regen_mp_ratio: 0.4,
        }
    }
}

/// Decision loop thresholds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BrainConfig {
    pub tick_interval_ms: u64,
    /// At or below this health ratio, away from home, the bot panics.
    pub critical_hp_ratio: f64,
    /// Below this health ratio the bot goes home to rest.
    pub rest_hp_ratio: f64,
    /// Resting ends at this health ratio.
    pub rest_done_ratio: f64,
    /// Skill used to heal party members; `None` disables healing.
    pub heal_skill: Option<String>,
    /// Party members below this ratio need healing.
    pub heal_ratio: f64,
    /// Escape skill used when panicking (e.g. a town teleport).
    pub panic_skill: Option<String>,
    /// Item skill consumed when the escape skill is unavailable.
    pub recovery_skill: String,
    /// Kite instead of trading blows at or above this difficulty.
    pub kite_difficulty: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    /// Monster types attacked first, in order of preference.
    pub priority_monsters: Vec<String>,
    /// Character to stay close to.
    pub leader: Option<String>,
    pub leader_distance: f64,
    /// Wandering bound around the home anchor.
    pub home_radius: f64,
    /// Within this distance of home the bot is considered safe.
    pub safe_radius: f64,
    pub find_interval_ms: u64,
    /// Damage above this fraction of max health interrupts the current step.
    pub interrupt_damage_ratio: f64,
    /// Poll interval while resting.
    pub rest_poll_ms: u64,
}

impl BrainConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn find_interval(&self) -> Duration {
        Duration::from_millis(self.find_interval_ms)
    }

    pub fn rest_poll(&self) -> Duration {
        Duration::from_millis(self.rest_poll_ms)
    }
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            critical_hp_ratio: 0.25,
            rest_hp_ratio: 0.5,
            rest_done_ratio: 0.9,
            heal_skill: None,
            heal_ratio: 0.7,
            panic_skill: None,
            recovery_skill: "use_hp".into(),
            kite_difficulty: 5.0,
            min_difficulty: 0.0,
            max_difficulty: 6.0,
            priority_monsters: Vec::new(),
            leader: None,
            leader_distance: 200.0,
            home_radius: 400.0,
            safe_radius: 100.0,
            find_interval_ms: 1_000,
            interrupt_damage_ratio: 0.1,
            rest_poll_ms: 500,
        }
    }
}
