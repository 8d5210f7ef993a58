//! Leaf nodes backed by closures.

use std::marker::PhantomData;

use crate::{Behavior, Status};

/// Read-only predicate over the blackboard.
pub struct Condition<C, F> {
    predicate: F,
    _ctx: PhantomData<fn(&C)>,
}

impl<C, F> Condition<C, F>
where
    F: Fn(&C) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _ctx: PhantomData,
        }
    }
}

impl<C, F> Behavior<C> for Condition<C, F>
where
    F: Fn(&C) -> bool + Send + Sync,
{
    fn tick(&self, ctx: &mut C) -> Status {
        Status::from_bool((self.predicate)(ctx))
    }
}

/// Node that may write to the blackboard.
pub struct Action<C, F> {
    run: F,
    _ctx: PhantomData<fn(&mut C)>,
}

impl<C, F> Action<C, F>
where
    F: Fn(&mut C) -> Status + Send + Sync,
{
    pub fn new(run: F) -> Self {
        Self {
            run,
            _ctx: PhantomData,
        }
    }
}

impl<C, F> Behavior<C> for Action<C, F>
where
    F: Fn(&mut C) -> Status + Send + Sync,
{
    fn tick(&self, ctx: &mut C) -> Status {
        (self.run)(ctx)
    }
}
