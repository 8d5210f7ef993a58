//! Decorator nodes.

use crate::{Behavior, Status};

/// Ticks `child` only when `condition` succeeds.
///
/// Reads as "when X, do Y" inside a priority chain.
pub struct Guard<C> {
    condition: Box<dyn Behavior<C>>,
    child: Box<dyn Behavior<C>>,
}

impl<C> Guard<C> {
    pub fn new(condition: Box<dyn Behavior<C>>, child: Box<dyn Behavior<C>>) -> Self {
        Self { condition, child }
    }
}

impl<C> Behavior<C> for Guard<C> {
    fn tick(&self, ctx: &mut C) -> Status {
        if self.condition.tick(ctx).is_failure() {
            return Status::Failure;
        }
        self.child.tick(ctx)
    }
}
