//! Small priority decision trees for tick-driven bots.
//!
//! A tree is re-evaluated from the root on every tick against a blackboard
//! context. Evaluation is synchronous and never suspends: leaves inspect the
//! blackboard and record a decision, and the caller acts on that decision
//! afterwards (possibly asynchronously).
//!
//! - [`Behavior`]: core trait for all nodes
//! - [`Status`]: Success or Failure, no Running state
//! - Composite node: [`Selector`]
//! - Decorator node: [`Guard`]
//! - Leaves: [`Condition`], [`Action`]
//! - [`builder`]: boxed shorthand constructors for composing trees

pub mod behavior;
pub mod builder;
pub mod composite;
pub mod decorator;
pub mod leaf;
pub mod status;

pub use behavior::Behavior;
pub use builder::{action, condition, guard, selector};
pub use composite::Selector;
pub use decorator::Guard;
pub use leaf::{Action, Condition};
pub use status::Status;

#[cfg(test)]
mod tests {
    use crate::{Behavior, Status, action, condition, guard, selector};

    #[test]
    fn root_exports_compose_a_tree() {
        let tree = selector(vec![
            guard(condition(|hp: &u32| *hp < 30), action(|_: &mut u32| Status::Success)),
            action(|hp: &mut u32| {
                *hp -= 1;
                Status::Failure
            }),
        ]);

        let mut hp = 20;
        assert_eq!(tree.tick(&mut hp), Status::Success);
        assert_eq!(hp, 20);

        let mut hp = 50;
        assert_eq!(tree.tick(&mut hp), Status::Failure);
        assert_eq!(hp, 49);
    }
}
