//! Scriptable in-process host shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use game_content::WorldLoader;
use game_core::{Entity, Position, World};
use runtime::{ActionRejected, Host, HostEvent};

const WORLD: &str = include_str!("../../../game/content/data/world.ron");

/// The bundled reference world: `main` with a door to `cave`.
pub fn world() -> Arc<World> {
    Arc::new(WorldLoader::parse(WORLD).expect("bundled world parses"))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn on_main(x: f64, y: f64) -> Position {
    Position::new(x, y, "main")
}

pub fn character(id: &str, position: Position) -> Entity {
    Entity::character(id, "priest", position)
}

pub fn monster(id: &str, mtype: &str, position: Position) -> Entity {
    Entity::monster(id, mtype, position)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cast {
    pub skill: String,
    pub target: Option<String>,
}

struct State {
    me: Entity,
    entities: Vec<Entity>,
    party: Vec<Entity>,
    cooldowns: HashMap<String, Instant>,
    casts: Vec<Cast>,
    moves: Vec<Position>,
    transports: Vec<(String, usize)>,
    stops: usize,
    cast_cooldown: Duration,
    move_duration: Duration,
    refuse_casts: Option<ActionRejected>,
    panic_on_move: bool,
}

/// A host whose moves teleport (after an optional delay) and whose casts put
/// the skill's cooldown group on a fixed cooldown.
pub struct MockHost {
    world: Arc<World>,
    state: Mutex<State>,
    events: broadcast::Sender<HostEvent>,
}

impl MockHost {
    pub fn new(world: Arc<World>, me: Entity) -> Arc<Self> {
        Arc::new(Self {
            world,
            state: Mutex::new(State {
                me,
                entities: Vec::new(),
                party: Vec::new(),
                cooldowns: HashMap::new(),
                casts: Vec::new(),
                moves: Vec::new(),
                transports: Vec::new(),
                stops: 0,
                cast_cooldown: Duration::from_secs(1),
                move_duration: Duration::ZERO,
                refuse_casts: None,
                panic_on_move: false,
            }),
            events: broadcast::channel(64).0,
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_me(&self, update: impl FnOnce(&mut Entity)) {
        update(&mut self.state().me);
    }

    pub fn add_entity(&self, entity: Entity) {
        self.state().entities.push(entity);
    }

    pub fn update_entity(&self, id: &str, update: impl FnOnce(&mut Entity)) {
        if let Some(entity) = self.state().entities.iter_mut().find(|e| e.id == id) {
            update(entity);
        }
    }

    pub fn set_party(&self, party: Vec<Entity>) {
        self.state().party = party;
    }

    pub fn set_cooldown(&self, group: &str, until: Instant) {
        self.state().cooldowns.insert(group.to_string(), until);
    }

    pub fn set_move_duration(&self, duration: Duration) {
        self.state().move_duration = duration;
    }

    pub fn refuse_casts(&self, reason: Option<ActionRejected>) {
        self.state().refuse_casts = reason;
    }

    pub fn panic_on_move(&self, enabled: bool) {
        self.state().panic_on_move = enabled;
    }

    pub fn emit(&self, event: HostEvent) {
        let _ = self.events.send(event);
    }

    pub fn casts(&self) -> Vec<Cast> {
        self.state().casts.clone()
    }

    pub fn moves(&self) -> Vec<Position> {
        self.state().moves.clone()
    }

    pub fn transports(&self) -> Vec<(String, usize)> {
        self.state().transports.clone()
    }

    pub fn stops(&self) -> usize {
        self.state().stops
    }
}

#[async_trait]
impl Host for MockHost {
    fn character(&self) -> Entity {
        self.state().me.clone()
    }

    fn entities(&self) -> Vec<Entity> {
        self.state().entities.clone()
    }

    fn party(&self) -> Vec<Entity> {
        self.state().party.clone()
    }

    fn ready_at(&self, group: &str) -> Option<Instant> {
        self.state()
            .cooldowns
            .get(group)
            .copied()
            .filter(|ready| *ready > Instant::now())
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    fn stop(&self) {
        self.state().stops += 1;
    }

    async fn move_to(&self, x: f64, y: f64) -> Result<(), ActionRejected> {
        let (duration, destination) = {
            let mut state = self.state();
            if state.panic_on_move {
                drop(state);
                panic!("scripted move failure");
            }
            let destination = state.me.position.with_xy(x, y);
            state.moves.push(destination.clone());
            (state.move_duration, destination)
        };
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            time::sleep(duration).await;
        }
        self.state().me.position = destination;
        Ok(())
    }

    async fn transport(&self, map: &str, spawn: usize) -> Result<(), ActionRejected> {
        let arrival = self
            .world
            .map(map)
            .and_then(|geometry| geometry.spawn(spawn))
            .ok_or(ActionRejected::NotFound)?;
        {
            let mut state = self.state();
            state.transports.push((map.to_string(), spawn));
            state.me.position = arrival;
        }
        self.emit(HostEvent::NewMap {
            map: map.to_string(),
        });
        Ok(())
    }

    async fn use_skill(
        &self,
        skill: &str,
        target: Option<&str>,
        _args: &[String],
    ) -> Result<(), ActionRejected> {
        let group = self.world.skills.cooldown_group(skill).to_string();
        let mut state = self.state();
        if let Some(reason) = state.refuse_casts.clone() {
            return Err(reason);
        }
        let now = Instant::now();
        if state.cooldowns.get(&group).is_some_and(|ready| *ready > now) {
            return Err(ActionRejected::Cooldown);
        }
        let cooldown = state.cast_cooldown;
        state.cooldowns.insert(group, now + cooldown);
        state.casts.push(Cast {
            skill: skill.to_string(),
            target: target.map(str::to_string),
        });
        Ok(())
    }
}
