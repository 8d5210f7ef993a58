//! Event types for different topics.

use serde::{Deserialize, Serialize};

use game_core::Position;

use crate::brain::Mode;
use crate::movement::MoveOutcome;
use crate::store::Home;

/// Decision loop status changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrainEvent {
    /// A tick selected a different step than the previous one
    ModeChanged { mode: Mode },

    /// Target set or cleared, with its difficulty when set
    TargetChanged {
        target: Option<String>,
        difficulty: Option<f64>,
    },

    /// Autonomous behavior halted until resumed
    Stopped { reason: String },

    Resumed,

    HomeSet { home: Home },
}

/// Movement task lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementEvent {
    Started {
        task: String,
        destination: Option<Position>,
    },

    /// `outcome` carries the error text when the task failed
    Finished {
        task: String,
        outcome: Result<MoveOutcome, String>,
    },
}

/// Autouse registrations and individual casts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillEvent {
    AutouseStarted {
        skill: String,
        group: String,
        target: Option<String>,
    },

    AutouseEnded { skill: String, group: String },

    Cast {
        skill: String,
        target: Option<String>,
    },

    CastFailed { skill: String, reason: String },
}
