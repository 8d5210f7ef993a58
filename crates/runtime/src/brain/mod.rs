//! Decision loop ("brain").
//!
//! Every tick snapshots the world into a [`Blackboard`], runs the
//! [`DecisionTree`], and executes the chosen step as its own task. Structural
//! failures (no path, unknown location, host refusals) abandon the current
//! intent; anything else, including a panic inside the step, stops
//! autonomous behavior until [`Brain::resume`] is called.
mod decide;
mod steps;
mod target;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use game_core::{BotConfig, BrainConfig, Position, SkillConfig, World, difficulty};

pub use decide::{Blackboard, Decision, DecisionTree, Mode};
pub use target::{Pick, select_target};

use crate::api::{Result, RuntimeError};
use crate::events::{BrainEvent, EventBus};
use crate::host::{Host, HostEvent};
use crate::movement::Movement;
use crate::skills::{Condition, SkillScheduler};
use crate::store::{Home, PersistedBrain, StateStore};
use crate::task::{Task, TaskContext, TaskSlot};

/// Mutable brain fields. Only the brain writes them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrainState {
    /// Mode chosen by the latest tick.
    pub mode: Option<Mode>,
    pub target: Option<String>,
    /// Difficulty of `target`, recomputed whenever the target changes.
    pub target_difficulty: Option<f64>,
    pub home: Option<Home>,
    pub stopped: bool,
    pub stop_reason: Option<String>,
}

struct Inner {
    host: Arc<dyn Host>,
    world: Arc<World>,
    movement: Movement,
    skills: SkillScheduler,
    config: BrainConfig,
    skill_config: SkillConfig,
    tree: DecisionTree,
    state: Mutex<BrainState>,
    store: Arc<dyn StateStore>,
    interrupt: AtomicBool,
    wake: Notify,
    step: TaskSlot<()>,
    background: Mutex<Vec<Task<()>>>,
    events: EventBus,
}

/// Handle to the decision loop. Clones share the same state.
#[derive(Clone)]
pub struct Brain {
    inner: Arc<Inner>,
}

impl Brain {
    /// Builds a brain, restoring the home anchor and stop flag from `store`.
    pub fn new(
        host: Arc<dyn Host>,
        world: Arc<World>,
        movement: Movement,
        skills: SkillScheduler,
        config: &BotConfig,
        store: Arc<dyn StateStore>,
        events: EventBus,
    ) -> Result<Self> {
        let persisted = store.load()?.unwrap_or_default();
        if persisted.stopped {
            info!(target: "runtime::brain", "restored in stopped state");
        }
        let state = BrainState {
            home: persisted.home,
            stopped: persisted.stopped,
            ..BrainState::default()
        };

        Ok(Self {
            inner: Arc::new(Inner {
                host,
                world,
                movement,
                skills,
                tree: DecisionTree::new(&config.brain),
                config: config.brain.clone(),
                skill_config: config.skills.clone(),
                state: Mutex::new(state),
                store,
                interrupt: AtomicBool::new(false),
                wake: Notify::new(),
                step: TaskSlot::default(),
                background: Mutex::new(Vec::new()),
                events,
            }),
        })
    }

    pub fn state(&self) -> BrainState {
        self.inner.lock().clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lock().stopped
    }

    /// Halts autonomous behavior: cancels the running step, all movement and
    /// every autouse.
    pub fn stop(&self, reason: impl Into<String>) {
        self.inner.stop(reason.into());
    }

    pub fn resume(&self) -> Result<()> {
        {
            let mut state = self.inner.lock();
            if !state.stopped {
                return Ok(());
            }
            state.stopped = false;
            state.stop_reason = None;
        }
        info!(target: "runtime::brain", "brain resumed");
        self.inner.events.publish(BrainEvent::Resumed);
        self.inner.persist()
    }

    /// Sets or clears the target and recomputes its difficulty.
    pub fn set_target(&self, target: Option<&str>) {
        self.inner.set_target(target);
    }

    pub fn set_home(&self, position: Position, radius: f64) -> Result<()> {
        let home = Home { position, radius };
        self.inner.lock().home = Some(home.clone());
        info!(target: "runtime::brain", home = %home.position, radius, "home set");
        self.inner.events.publish(BrainEvent::HomeSet { home });
        self.inner.persist()
    }

    /// Anchors home at the character's current position.
    pub fn set_home_here(&self) -> Result<()> {
        let position = self.inner.host.character().position;
        self.set_home(position, self.inner.config.home_radius)
    }

    /// Aborts the in-progress step at its next wait.
    pub fn interrupt(&self) {
        self.inner.interrupt();
    }

    /// Evaluates the decision tree against a fresh snapshot without acting.
    pub fn decide(&self) -> Decision {
        let mut board = self.inner.blackboard();
        self.inner.tree.decide(&mut board)
    }

    /// Runs one decision and its step to completion. Returns `None` while
    /// stopped.
    pub async fn tick(&self) -> Option<Mode> {
        if self.is_stopped() {
            return None;
        }
        self.inner.interrupt.store(false, Ordering::Release);

        let decision = self.decide();
        let mode = decision.mode();
        self.inner.enter(mode);

        let inner = Arc::clone(&self.inner);
        let task = self
            .inner
            .step
            .start(format!("step:{mode}"), move |ctx| async move {
                inner.execute(&ctx, decision).await
            });

        match task.result().await {
            Ok(()) | Err(RuntimeError::Cancelled) => {}
            Err(error) if abandons_intent(&error) => {
                warn!(target: "runtime::brain", %mode, %error, "step abandoned");
                if mode == Mode::Attack {
                    self.inner.set_target(None);
                }
            }
            Err(error) => {
                error!(target: "runtime::brain", %mode, %error, "step failed");
                self.stop(format!("{mode} step failed: {error}"));
            }
        }
        Some(mode)
    }

    /// Spawns the decision loop, the damage watch and the regen loop.
    /// Calling it again while they run has no effect.
    pub fn start(&self) {
        let mut background = self
            .inner
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if background.iter().any(|task| !task.is_finished()) {
            return;
        }
        background.clear();

        let brain = self.clone();
        background.push(Task::spawn("brain", move |ctx| async move {
            brain.run(&ctx).await
        }));
        let inner = Arc::clone(&self.inner);
        background.push(Task::spawn("panic_watch", move |ctx| async move {
            inner.watch_hits(&ctx).await
        }));
        let inner = Arc::clone(&self.inner);
        background.push(Task::spawn("regen", move |ctx| async move {
            inner.regen(&ctx).await
        }));
        info!(target: "runtime::brain", "decision loop started");
    }

    /// Cancels the background loops and everything they started.
    pub fn shutdown(&self) {
        let background: Vec<Task<()>> = self
            .inner
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in background {
            task.cancel();
        }
        self.inner.step.cancel();
        self.inner.movement.stop();
        self.inner.skills.cancel_all();
        info!(target: "runtime::brain", "decision loop shut down");
    }

    async fn run(&self, ctx: &TaskContext) -> Result<()> {
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                _ = self.tick() => {}
            }
            if !ctx.sleep(self.inner.config.tick_interval()).await {
                return Ok(());
            }
        }
    }
}

/// Errors after which the brain drops the current intent but keeps running.
fn abandons_intent(error: &RuntimeError) -> bool {
    matches!(
        error,
        RuntimeError::Pathfind(_) | RuntimeError::Movement(_) | RuntimeError::Host(_)
    )
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, BrainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) -> Result<()> {
        let snapshot = {
            let state = self.lock();
            PersistedBrain {
                home: state.home.clone(),
                stopped: state.stopped,
            }
        };
        self.store.save(&snapshot)?;
        Ok(())
    }

    fn home(&self) -> Option<Home> {
        self.lock().home.clone()
    }

    fn blackboard(&self) -> Blackboard {
        let (target, home) = {
            let state = self.lock();
            (state.target.clone(), state.home.clone())
        };
        let target = target.and_then(|id| self.host.entity(&id));
        Blackboard::new(self.host.character(), self.host.party(), target, home)
    }

    fn enter(&self, mode: Mode) {
        let changed = {
            let mut state = self.lock();
            let changed = state.mode != Some(mode);
            state.mode = Some(mode);
            changed
        };
        if changed {
            info!(target: "runtime::brain", %mode, "mode changed");
            self.events.publish(BrainEvent::ModeChanged { mode });
        }
    }

    fn stop(&self, reason: String) {
        {
            let mut state = self.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.stop_reason = Some(reason.clone());
        }
        self.step.cancel();
        self.movement.stop();
        self.skills.cancel_all();
        if let Err(error) = self.persist() {
            warn!(target: "runtime::brain", %error, "failed to persist stop flag");
        }
        warn!(target: "runtime::brain", %reason, "brain stopped");
        self.events.publish(BrainEvent::Stopped { reason });
    }

    fn set_target(&self, target: Option<&str>) {
        let me = self.host.character();
        let score = target
            .and_then(|id| self.host.entity(id))
            .map(|entity| difficulty(&me, &entity));
        {
            let mut state = self.lock();
            if state.target.as_deref() == target && state.target_difficulty == score {
                return;
            }
            state.target = target.map(str::to_string);
            state.target_difficulty = score;
        }
        debug!(target: "runtime::brain", target = ?target, difficulty = ?score, "target changed");
        self.events.publish(BrainEvent::TargetChanged {
            target: target.map(str::to_string),
            difficulty: score,
        });
    }

    fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Resolves once [`Inner::interrupt`] has been called since the last
    /// tick started.
    async fn interrupted(&self) {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.interrupt.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// Interrupts the current step when a single hit takes more than the
    /// configured share of max health.
    async fn watch_hits(&self, ctx: &TaskContext) -> Result<()> {
        let mut events = self.host.subscribe();
        loop {
            let event = tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                event = events.recv() => event,
            };
            match event {
                Ok(HostEvent::Hit {
                    target,
                    attacker,
                    damage,
                }) => {
                    let me = self.host.character();
                    if target == me.id && damage > self.config.interrupt_damage_ratio * me.max_hp {
                        info!(
                            target: "runtime::brain",
                            %attacker,
                            damage,
                            "heavy hit, interrupting"
                        );
                        self.interrupt();
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Keeps a potion autouse running while health or mana is low.
    async fn regen(&self, ctx: &TaskContext) -> Result<()> {
        loop {
            let stopped = self.lock().stopped;
            let potion = if stopped { None } else { self.regen_autouse() };
            if let Some(task) = potion {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok(()),
                    _ = task.result() => {}
                }
            }
            if !ctx.sleep(self.config.tick_interval()).await {
                return Ok(());
            }
        }
    }

    fn regen_autouse(&self) -> Option<Task<()>> {
        let me = self.host.character();
        let config = &self.skill_config;
        let host = Arc::clone(&self.host);
        if me.hp_ratio() < config.regen_hp_ratio {
            let ratio = config.regen_hp_ratio;
            let low: Condition = Arc::new(move || host.character().hp_ratio() < ratio);
            return Some(self.skills.autouse(&config.hp_potion_skill, None, &[], Some(low)));
        }
        if me.mp_ratio() < config.regen_mp_ratio {
            let ratio = config.regen_mp_ratio;
            let low: Condition = Arc::new(move || host.character().mp_ratio() < ratio);
            return Some(self.skills.autouse(&config.mp_potion_skill, None, &[], Some(low)));
        }
        None
    }
}
