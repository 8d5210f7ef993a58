//! The priority chain that turns a world snapshot into a [`Decision`].

use behavior_tree::{Behavior, Status, action, condition, guard, selector};
use serde::{Deserialize, Serialize};

use game_core::{BrainConfig, Entity};

use crate::store::Home;

/// Coarse behavior selected by a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    Panic,
    Heal,
    Attack,
    Rest,
    ReturnToLeader,
    Find,
}

/// What the next step should do.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Panic,
    Heal { patient: String },
    Attack { target: String },
    Rest,
    ReturnToLeader { leader: Entity },
    Find,
}

impl Decision {
    pub fn mode(&self) -> Mode {
        match self {
            Decision::Panic => Mode::Panic,
            Decision::Heal { .. } => Mode::Heal,
            Decision::Attack { .. } => Mode::Attack,
            Decision::Rest => Mode::Rest,
            Decision::ReturnToLeader { .. } => Mode::ReturnToLeader,
            Decision::Find => Mode::Find,
        }
    }
}

/// Snapshot the decision tree reads, and the slot it writes its answer to.
#[derive(Clone, Debug)]
pub struct Blackboard {
    pub me: Entity,
    pub party: Vec<Entity>,
    /// Current target, if it is still visible.
    pub target: Option<Entity>,
    pub home: Option<Home>,
    pub decision: Option<Decision>,
}

impl Blackboard {
    pub fn new(me: Entity, party: Vec<Entity>, target: Option<Entity>, home: Option<Home>) -> Self {
        Self {
            me,
            party,
            target,
            home,
            decision: None,
        }
    }

    fn near_home(&self, radius: f64) -> bool {
        self.home.as_ref().is_some_and(|home| {
            self.me
                .position
                .distance(&home.position)
                .is_some_and(|distance| distance <= radius)
        })
    }

    /// Living member (or self) on our map with the lowest health ratio below
    /// `ratio`.
    fn patient(&self, ratio: f64) -> Option<&Entity> {
        std::iter::once(&self.me)
            .chain(&self.party)
            .filter(|member| member.is_alive() && member.position.same_map(&self.me.position))
            .filter(|member| member.hp_ratio() < ratio)
            .min_by(|a, b| a.hp_ratio().total_cmp(&b.hp_ratio()))
    }

    fn decide(&mut self, decision: Decision) -> Status {
        self.decision = Some(decision);
        Status::Success
    }
}

/// Priority-ordered predicate chain; the first applicable branch wins.
pub struct DecisionTree {
    root: Box<dyn Behavior<Blackboard>>,
}

impl DecisionTree {
    pub fn new(config: &BrainConfig) -> Self {
        let critical = config.critical_hp_ratio;
        let safe_radius = config.safe_radius;
        let heals = config.heal_skill.is_some();
        let heal_ratio = config.heal_ratio;
        let rest_ratio = config.rest_hp_ratio;
        let leader = config.leader.clone();
        let leader_distance = config.leader_distance;

        let root = selector(vec![
            guard(
                condition(move |board: &Blackboard| {
                    board.me.hp_ratio() <= critical && !board.near_home(safe_radius)
                }),
                action(|board: &mut Blackboard| board.decide(Decision::Panic)),
            ),
            guard(
                condition(move |_: &Blackboard| heals),
                action(move |board: &mut Blackboard| {
                    match board.patient(heal_ratio).map(|p| p.id.clone()) {
                        Some(patient) => board.decide(Decision::Heal { patient }),
                        None => Status::Failure,
                    }
                }),
            ),
            action(|board: &mut Blackboard| {
                match board.target.as_ref().filter(|t| t.is_alive()).map(|t| t.id.clone()) {
                    Some(target) => board.decide(Decision::Attack { target }),
                    None => Status::Failure,
                }
            }),
            guard(
                condition(move |board: &Blackboard| board.me.hp_ratio() < rest_ratio),
                action(|board: &mut Blackboard| board.decide(Decision::Rest)),
            ),
            action(move |board: &mut Blackboard| {
                let Some(name) = leader.as_deref() else {
                    return Status::Failure;
                };
                let Some(found) = board.party.iter().find(|member| member.id == name) else {
                    return Status::Failure;
                };
                let lost = board
                    .me
                    .distance_to(found)
                    .is_none_or(|distance| distance > leader_distance);
                if lost {
                    let leader = found.clone();
                    board.decide(Decision::ReturnToLeader { leader })
                } else {
                    Status::Failure
                }
            }),
            action(|board: &mut Blackboard| board.decide(Decision::Find)),
        ]);
        Self { root }
    }

    pub fn decide(&self, board: &mut Blackboard) -> Decision {
        board.decision = None;
        self.root.tick(board);
        board.decision.take().unwrap_or(Decision::Find)
    }
}
