//! High-level runtime orchestrator.
//!
//! The runtime owns the pathfinding worker, wires the movement engine, skill
//! scheduler and decision loop to one host and one event bus, and exposes a
//! builder-based API for embedding the bot.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use game_core::{BotConfig, World};

use crate::api::{Result, RuntimeError};
use crate::brain::Brain;
use crate::events::{Event, EventBus, Topic};
use crate::host::Host;
use crate::movement::Movement;
use crate::skills::SkillScheduler;
use crate::store::{MemoryStore, StateStore};
use crate::workers::PathfinderHandle;

/// Runtime configuration shared across the orchestrator and its layers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bot: BotConfig,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            event_buffer_size: 256,
        }
    }
}

/// A fully wired bot.
///
/// Every layer handle is cheap to clone and shares state with the runtime's
/// own copy.
pub struct Runtime {
    host: Arc<dyn Host>,
    world: Arc<World>,
    events: EventBus,
    pathfinder: PathfinderHandle,
    movement: Movement,
    skills: SkillScheduler,
    brain: Brain,
    pathfind_worker: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn host(&self) -> Arc<dyn Host> {
        Arc::clone(&self.host)
    }

    pub fn world(&self) -> Arc<World> {
        Arc::clone(&self.world)
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn pathfinder(&self) -> PathfinderHandle {
        self.pathfinder.clone()
    }

    pub fn movement(&self) -> Movement {
        self.movement.clone()
    }

    pub fn skills(&self) -> SkillScheduler {
        self.skills.clone()
    }

    pub fn brain(&self) -> Brain {
        self.brain.clone()
    }

    /// Starts the decision loop and its background tasks.
    pub fn start(&self) {
        self.brain.start();
    }

    /// Cancels every running task and stops the pathfinding worker.
    pub async fn shutdown(self) -> Result<()> {
        self.brain.shutdown();
        self.movement.stop();
        self.skills.cancel_all();

        // Clones of the pathfinder handle may outlive the runtime, so the
        // worker is aborted rather than drained.
        self.pathfind_worker.abort();
        match self.pathfind_worker.await {
            Ok(()) => {}
            Err(join) if join.is_cancelled() => {}
            Err(join) => return Err(RuntimeError::WorkerJoin(join.to_string())),
        }
        info!(target: "runtime", "runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`]. A host and world are required.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    host: Option<Arc<dyn Host>>,
    world: Option<Arc<World>>,
    store: Option<Arc<dyn StateStore>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            host: None,
            world: None,
            store: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces only the bot tuning, keeping other runtime settings.
    pub fn bot_config(mut self, bot: BotConfig) -> Self {
        self.config.bot = bot;
        self
    }

    pub fn host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn world(mut self, world: impl Into<Arc<World>>) -> Self {
        self.world = Some(world.into());
        self
    }

    /// Persistence for the home anchor and stop flag. Defaults to an
    /// in-memory store.
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Spawns the pathfinding worker and wires every layer. Must be called
    /// inside a tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let host = self.host.ok_or(RuntimeError::MissingComponent("host"))?;
        let world = self.world.ok_or(RuntimeError::MissingComponent("world"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn StateStore>);
        let bot = self.config.bot;

        let events = EventBus::with_capacity(self.config.event_buffer_size);
        let (pathfinder, pathfind_worker) =
            PathfinderHandle::spawn(Arc::clone(&world), bot.pathfind.clone());

        let movement = Movement::new(
            Arc::clone(&host),
            Arc::clone(&world),
            pathfinder.clone(),
            bot.movement.clone(),
            events.clone(),
        );
        let skills = SkillScheduler::new(
            Arc::clone(&host),
            world.skills.clone(),
            bot.skills.clone(),
            events.clone(),
        );
        let brain = Brain::new(
            Arc::clone(&host),
            Arc::clone(&world),
            movement.clone(),
            skills.clone(),
            &bot,
            store,
            events.clone(),
        )?;

        info!(target: "runtime", maps = world.maps().count(), "runtime built");
        Ok(Runtime {
            host,
            world,
            events,
            pathfinder,
            movement,
            skills,
            brain,
            pathfind_worker,
        })
    }
}
