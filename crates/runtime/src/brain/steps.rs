//! What each [`Decision`] does once selected.
//!
//! Steps are short: they start or reuse long-running movement and autouse
//! tasks, wait at most a tick or until an arrival, and return so the next
//! tick can re-decide. Every wait honors cancellation of the step and the
//! brain's interrupt flag.
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

use game_core::{Entity, Position};

use super::{Decision, Inner, select_target};
use crate::api::{Result, RuntimeError};
use crate::movement::{Destination, MoveOptions, MoveOutcome, MoveTarget, PathOptions};
use crate::skills::Condition;
use crate::task::{Task, TaskContext};

/// Share of the skill or attack range to close to before stopping.
const APPROACH_RATIO: f64 = 0.9;

impl Inner {
    pub(super) async fn execute(&self, ctx: &TaskContext, decision: Decision) -> Result<()> {
        match decision {
            Decision::Panic => self.panic(ctx).await,
            Decision::Heal { patient } => self.heal(ctx, &patient).await,
            Decision::Attack { target } => self.attack(ctx, &target).await,
            Decision::Rest => self.rest(ctx).await,
            Decision::ReturnToLeader { leader } => self.return_to_leader(ctx, &leader).await,
            Decision::Find => self.find(ctx).await,
        }
    }

    /// Drops everything, escapes, retreats home and recovers. The retreat
    /// ignores interrupts; being hit is why we are here.
    async fn panic(&self, ctx: &TaskContext) -> Result<()> {
        self.movement.stop();
        self.skills.cancel_all();

        let escaped = match &self.config.panic_skill {
            Some(skill) => self.cast_once(ctx, skill, None).await?,
            None => false,
        };
        if !escaped {
            self.cast_once(ctx, &self.config.recovery_skill, None).await?;
        }

        if let Some(home) = self.home() {
            self.go_to(ctx, home.position, self.config.safe_radius / 2.0, false)
                .await?;
        }
        self.recover(ctx, self.config.rest_done_ratio, false).await
    }

    async fn heal(&self, ctx: &TaskContext, patient: &str) -> Result<()> {
        let Some(skill) = self.config.heal_skill.clone() else {
            return Ok(());
        };
        let Some(patient) = self.host.entity(patient).filter(Entity::is_alive) else {
            return Ok(());
        };

        let host = Arc::clone(&self.host);
        let id = patient.id.clone();
        let ratio = self.config.heal_ratio;
        let needs_healing: Condition = Arc::new(move || {
            host.entity(&id)
                .is_some_and(|entity| entity.is_alive() && entity.hp_ratio() < ratio)
        });
        let casting = self
            .skills
            .autouse(&skill, Some(&patient.id), &[], Some(needs_healing));

        let me = self.host.character();
        let range = self
            .world
            .skills
            .get(&skill)
            .and_then(|def| def.range)
            .unwrap_or(me.range);
        match me.distance_to(&patient) {
            Some(distance) if distance > range => {
                let options =
                    MoveOptions::default().max_distance(distance - range * APPROACH_RATIO);
                let task = self.movement.approach(MoveTarget::Entity(patient), options);
                self.settle(ctx, task, true).await?;
            }
            Some(_) => {
                self.until_done(ctx, &casting, self.config.tick_interval())
                    .await?;
            }
            None => {
                self.go_to(ctx, patient.position, range * APPROACH_RATIO, true)
                    .await?;
            }
        }
        Ok(())
    }

    async fn attack(&self, ctx: &TaskContext, target: &str) -> Result<()> {
        let Some(target) = self.host.entity(target).filter(Entity::is_alive) else {
            debug!(target: "runtime::brain", target = %target, "target gone");
            self.set_target(None);
            return Ok(());
        };
        let skill = self.skill_config.attack_skill.clone();
        self.skills.autouse(&skill, Some(&target.id), &[], None);

        let difficulty = self.lock().target_difficulty.unwrap_or_default();
        if difficulty >= self.config.kite_difficulty {
            return self.kite(ctx, &target, &skill).await;
        }

        let me = self.host.character();
        match me.distance_to(&target) {
            Some(distance) if distance > me.range => {
                let options = MoveOptions::default()
                    .max_distance(distance - me.range * APPROACH_RATIO)
                    .avoid();
                let task = self.movement.approach(MoveTarget::Entity(target), options);
                self.settle(ctx, task, true).await?;
            }
            Some(_) => {
                self.wait(ctx, self.config.tick_interval()).await?;
            }
            None => {
                debug!(target: "runtime::brain", target = %target.id, "target left the map");
                self.set_target(None);
            }
        }
        Ok(())
    }

    /// Keeps a kite task running on `target` across ticks.
    async fn kite(&self, ctx: &TaskContext, target: &Entity, skill: &str) -> Result<()> {
        let name = format!("kite:{}", target.id);
        let task = match self.movement.current() {
            Some(task) if task.name() == name && !task.is_finished() => task,
            _ => {
                info!(target: "runtime::brain", target = %target.id, "kiting");
                self.movement.kite(&target.id)
            }
        };

        let outcome = tokio::select! {
            _ = ctx.cancelled() => return Err(RuntimeError::Cancelled),
            _ = self.interrupted() => {
                task.cancel();
                return Ok(());
            }
            _ = time::sleep(self.config.tick_interval()) => return Ok(()),
            outcome = task.result() => outcome?,
        };
        if outcome == MoveOutcome::EngagedElsewhere {
            info!(
                target: "runtime::brain",
                target = %target.id,
                "target engaged elsewhere, dropping"
            );
            self.skills.cancel(self.skills.cooldown_group(skill));
            self.set_target(None);
        }
        Ok(())
    }

    async fn rest(&self, ctx: &TaskContext) -> Result<()> {
        if let Some(home) = self.home() {
            let me = self.host.character();
            let away = me
                .position
                .distance(&home.position)
                .is_none_or(|distance| distance > self.config.safe_radius);
            if away {
                let outcome = self
                    .go_to(ctx, home.position, self.config.safe_radius / 2.0, true)
                    .await?;
                if outcome != MoveOutcome::Arrived {
                    return Ok(());
                }
            }
        }
        self.recover(ctx, self.config.rest_done_ratio, true).await
    }

    async fn return_to_leader(&self, ctx: &TaskContext, leader: &Entity) -> Result<()> {
        debug!(target: "runtime::brain", leader = %leader.id, "returning to leader");
        self.go_to(
            ctx,
            leader.position.clone(),
            self.config.leader_distance / 2.0,
            true,
        )
        .await?;
        Ok(())
    }

    async fn find(&self, ctx: &TaskContext) -> Result<()> {
        let me = self.host.character();
        if let Some(home) = self.home()
            && me
                .position
                .distance(&home.position)
                .is_none_or(|distance| distance > home.radius)
        {
            debug!(target: "runtime::brain", "outside home radius, returning");
            self.go_to(ctx, home.position, self.config.safe_radius / 2.0, true)
                .await?;
            return Ok(());
        }

        if self.lock().target.is_some() {
            debug!(target: "runtime::brain", "dropping stale target");
            self.set_target(None);
        }
        let party = self.host.party();
        let entities = self.host.entities();
        match select_target(&self.config, &me, &party, &entities) {
            Some(pick) => {
                info!(
                    target: "runtime::brain",
                    target = %pick.entity.id,
                    difficulty = pick.difficulty,
                    "target selected"
                );
                self.set_target(Some(&pick.entity.id));
            }
            None => {
                self.wait(ctx, self.config.find_interval()).await?;
            }
        }
        Ok(())
    }

    /// Waits on a movement task. Cancelling the step or (when
    /// `interruptible`) an interrupt cancels the movement too.
    async fn settle(
        &self,
        ctx: &TaskContext,
        task: Task<MoveOutcome>,
        interruptible: bool,
    ) -> Result<MoveOutcome> {
        tokio::select! {
            _ = ctx.cancelled() => {
                task.cancel();
                Err(RuntimeError::Cancelled)
            }
            _ = self.interrupted(), if interruptible => {
                task.cancel();
                Ok(MoveOutcome::Interrupted)
            }
            outcome = task.result() => outcome,
        }
    }

    /// Sleeps for `duration`. `Ok(false)` when interrupted first.
    async fn wait(&self, ctx: &TaskContext, duration: Duration) -> Result<bool> {
        tokio::select! {
            _ = ctx.cancelled() => Err(RuntimeError::Cancelled),
            _ = self.interrupted() => Ok(false),
            _ = time::sleep(duration) => Ok(true),
        }
    }

    /// Like [`Inner::wait`], but also returns early when `task` ends.
    async fn until_done(&self, ctx: &TaskContext, task: &Task<()>, limit: Duration) -> Result<()> {
        tokio::select! {
            _ = ctx.cancelled() => Err(RuntimeError::Cancelled),
            _ = self.interrupted() => Ok(()),
            _ = task.result() => Ok(()),
            _ = time::sleep(limit) => Ok(()),
        }
    }

    async fn go_to(
        &self,
        ctx: &TaskContext,
        position: Position,
        within: f64,
        interruptible: bool,
    ) -> Result<MoveOutcome> {
        let task = self.movement.pathfind_move(
            Destination::Point(position),
            PathOptions::within(within),
            MoveOptions::default(),
        )?;
        self.settle(ctx, task, interruptible).await
    }

    /// Casts `skill` once. Host refusals are logged and reported as `false`.
    async fn cast_once(
        &self,
        ctx: &TaskContext,
        skill: &str,
        target: Option<&str>,
    ) -> Result<bool> {
        let cast = tokio::select! {
            _ = ctx.cancelled() => return Err(RuntimeError::Cancelled),
            cast = self.skills.use_skill(skill, target, &[]) => cast,
        };
        match cast {
            Ok(()) => Ok(true),
            Err(RuntimeError::Host(reason)) => {
                warn!(target: "runtime::brain", skill, %reason, "cast refused");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// Waits for health to reach `done_ratio`, leaving potions to the regen
    /// loop. With `abort_on_drop`, any loss of health ends the wait so the
    /// next tick can react.
    async fn recover(&self, ctx: &TaskContext, done_ratio: f64, abort_on_drop: bool) -> Result<()> {
        let mut last = self.host.character().hp_ratio();
        loop {
            if last >= done_ratio {
                debug!(target: "runtime::brain", ratio = last, "recovered");
                return Ok(());
            }
            if !self.wait(ctx, self.config.rest_poll()).await? {
                return Ok(());
            }
            let ratio = self.host.character().hp_ratio();
            if abort_on_drop && ratio < last {
                info!(target: "runtime::brain", ratio, "health dropping, abandoning rest");
                return Ok(());
            }
            last = ratio;
        }
    }
}
