//! Composite behavior nodes.
//!
//! [`Selector`] is the priority chain: the first child that succeeds wins
//! and later children are not evaluated.

use crate::{Behavior, Status};

/// Ticks children left to right until one succeeds.
pub struct Selector<C> {
    children: Vec<Box<dyn Behavior<C>>>,
}

impl<C> Selector<C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Box<dyn Behavior<C>>>) -> Self {
        assert!(
            !children.is_empty(),
            "Selector must have at least one child"
        );
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_success() {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Blackboard {
        visited: Vec<&'static str>,
    }

    struct Visit(&'static str, Status);
    impl Behavior<Blackboard> for Visit {
        fn tick(&self, ctx: &mut Blackboard) -> Status {
            ctx.visited.push(self.0);
            self.1
        }
    }

    fn visit(name: &'static str, status: Status) -> Box<dyn Behavior<Blackboard>> {
        Box::new(Visit(name, status))
    }

    #[test]
    fn selector_stops_on_first_success() {
        let sel = Selector::new(vec![
            visit("panic", Status::Failure),
            visit("attack", Status::Success),
            visit("find", Status::Success),
        ]);
        let mut ctx = Blackboard::default();
        assert_eq!(sel.tick(&mut ctx), Status::Success);
        assert_eq!(ctx.visited, ["panic", "attack"]);
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let sel = Selector::new(vec![
            visit("a", Status::Failure),
            visit("b", Status::Failure),
        ]);
        let mut ctx = Blackboard::default();
        assert_eq!(sel.tick(&mut ctx), Status::Failure);
        assert_eq!(ctx.visited, ["a", "b"]);
    }
}
