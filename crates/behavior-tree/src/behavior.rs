//! Core behavior trait.

use crate::Status;

/// A decision node evaluated against a blackboard `C`.
///
/// Nodes are shared between ticks and must not hold per-tick state; anything
/// a node wants to remember belongs on the blackboard.
pub trait Behavior<C>: Send + Sync {
    fn tick(&self, ctx: &mut C) -> Status;
}

impl<C> Behavior<C> for Box<dyn Behavior<C>> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (**self).tick(ctx)
    }
}
