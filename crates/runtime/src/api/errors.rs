//! Unified error types surfaced by the runtime API.
//!
//! Planning failures come from `game-core`; everything the host can refuse is
//! an [`ActionRejected`]. All variants are cheap to clone so a task outcome
//! can be handed to every awaiter.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::PathfindError;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Pathfind(#[from] PathfindError),

    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error("task cancelled")]
    Cancelled,

    #[error("task '{name}' panicked")]
    TaskPanicked { name: String },

    #[error("host rejected action: {0}")]
    Host(#[from] ActionRejected),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("pathfinding worker channel closed")]
    WorkerClosed,

    #[error("pathfinding worker reply channel closed")]
    WorkerReply(#[source] oneshot::error::RecvError),

    #[error("worker task failed: {0}")]
    WorkerJoin(String),

    #[error("runtime builder is missing the {0}")]
    MissingComponent(&'static str),
}

impl RuntimeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RuntimeError::Cancelled)
    }
}

/// Reasons the host gives for refusing a primitive action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionRejected {
    #[error("not in range")]
    NotInRange,

    #[error("insufficient resource")]
    InsufficientResource,

    #[error("interrupted")]
    Interrupted,

    #[error("target not found")]
    NotFound,

    #[error("on cooldown")]
    Cooldown,

    #[error("{0}")]
    Failed(String),
}

impl ActionRejected {
    /// Whether retrying the same action can never succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionRejected::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("timed out waiting to arrive on map '{map}'")]
    TransitionTimeout { map: String },

    #[error("move rejected: {0}")]
    Rejected(ActionRejected),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_terminal() {
        assert!(ActionRejected::NotFound.is_terminal());
        for reason in [
            ActionRejected::NotInRange,
            ActionRejected::InsufficientResource,
            ActionRejected::Interrupted,
            ActionRejected::Cooldown,
            ActionRejected::Failed("busy".into()),
        ] {
            assert!(!reason.is_terminal(), "{reason}");
        }
    }

    #[test]
    fn pathfind_errors_convert() {
        let error: RuntimeError = PathfindError::UnknownMap("void".into()).into();
        assert_eq!(error.to_string(), "unknown map 'void'");
    }
}
