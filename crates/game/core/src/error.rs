//! Planning failures surfaced by the pathfinder.
//!
//! These are structural: a caller that receives one should abandon the
//! current intent rather than retry the same request.

/// Why a path could not be produced.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathfindError {
    #[error("no path found from {from} to {to}")]
    NoPath { from: String, to: String },

    #[error("destination on map '{to}' is outside current map '{from}'")]
    CrossMapDisallowed { from: String, to: String },

    #[error("search budget of {expansions} expansions exhausted")]
    BudgetExhausted { expansions: usize },

    #[error("unknown map '{0}'")]
    UnknownMap(String),

    #[error("origin {0} lies outside its map")]
    OriginBlocked(String),
}
