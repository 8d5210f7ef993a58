//! Movement engine: direct moves, path following, kiting and collision
//! avoidance on top of the host's straight-line move primitive.
//!
//! Every long-running movement runs as a [`Task`] in a single slot, so
//! starting a new one always cancels the previous one before it can issue
//! another primitive.
mod avoidance;
mod plan;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, info, warn};

use game_core::{Entity, MovementConfig, PathRequest, PathfindError, Position, Waypoint, World};

pub use avoidance::avoid_collisions;
pub use plan::{circle_point, clamp_travel, lead_point, stand_off};

use crate::api::{ActionRejected, MovementError, Result, RuntimeError};
use crate::events::{EventBus, MovementEvent};
use crate::host::{Host, HostEvent};
use crate::task::{Task, TaskContext, TaskSlot};
use crate::workers::PathfinderHandle;

/// How often a transition wait re-reads the character's map when no
/// `NewMap` event arrives.
const TRANSITION_POLL: Duration = Duration::from_millis(100);

/// Why a movement task ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MoveOutcome {
    /// Reached the final waypoint.
    Arrived,
    /// Ran out of distance budget, lost the target, or the character died.
    Stopped,
    /// The host interrupted the move primitive.
    Interrupted,
    /// A kited monster is fighting someone else.
    EngagedElsewhere,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveOptions {
    /// Total travel budget in pixels.
    pub max_distance: Option<f64>,
    /// Run collision avoidance before every primitive move.
    pub avoid: bool,
}

impl MoveOptions {
    pub fn max_distance(mut self, distance: f64) -> Self {
        self.max_distance = Some(distance);
        self
    }

    pub fn avoid(mut self) -> Self {
        self.avoid = true;
        self
    }
}

/// Target of a direct move.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveTarget {
    Point(Position),
    /// A possibly moving entity; led by its velocity when configured.
    Entity(Entity),
}

/// Named or literal pathfinding destination.
#[derive(Clone, Debug, PartialEq)]
pub enum Destination {
    Point(Position),
    Npc(String),
    /// The entrance (spawn 0) of a map.
    Map(String),
}

/// Search knobs for [`Movement::pathfind_move`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathOptions {
    /// Stop within this distance instead of at the exact goal.
    pub within: Option<f64>,
    pub same_map_only: bool,
    pub max_expansions: Option<usize>,
}

impl PathOptions {
    pub fn within(range: f64) -> Self {
        Self {
            within: Some(range),
            ..Self::default()
        }
    }
}

struct Inner {
    host: Arc<dyn Host>,
    world: Arc<World>,
    pathfinder: PathfinderHandle,
    config: MovementConfig,
    slot: TaskSlot<MoveOutcome>,
    events: EventBus,
    rng: Mutex<StdRng>,
}

/// Handle to the movement engine. Clones share the same task slot.
#[derive(Clone)]
pub struct Movement {
    inner: Arc<Inner>,
}

impl Movement {
    pub fn new(
        host: Arc<dyn Host>,
        world: Arc<World>,
        pathfinder: PathfinderHandle,
        config: MovementConfig,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                world,
                pathfinder,
                config,
                slot: TaskSlot::default(),
                events,
                rng: Mutex::new(StdRng::from_os_rng()),
            }),
        }
    }

    /// The movement task currently holding the slot, if any.
    pub fn current(&self) -> Option<Task<MoveOutcome>> {
        self.inner.slot.current()
    }

    /// Cancels the current movement task and halts the character.
    pub fn stop(&self) {
        if self.inner.slot.cancel() {
            debug!(target: "runtime::movement", "movement task cancelled");
        }
        self.inner.host.stop();
    }

    /// Issues one primitive move toward `target`.
    ///
    /// Moving entities are led by their velocity, the hop is clamped to
    /// `max_distance`, and collision avoidance runs when requested. A host
    /// interruption is reported as [`MoveOutcome::Interrupted`].
    pub async fn move_to(&self, target: MoveTarget, options: MoveOptions) -> Result<MoveOutcome> {
        let me = self.inner.host.character();
        let dest = self.inner.plan_direct(&me, &target, &options)?;
        match self.inner.host.move_to(dest.x, dest.y).await {
            Ok(()) => Ok(MoveOutcome::Arrived),
            Err(ActionRejected::Interrupted) => Ok(MoveOutcome::Interrupted),
            Err(reason) => Err(MovementError::Rejected(reason).into()),
        }
    }

    /// Runs [`Movement::move_to`] as the movement task, replacing any
    /// current one.
    pub fn approach(&self, target: MoveTarget, options: MoveOptions) -> Task<MoveOutcome> {
        let movement = self.clone();
        let destination = match &target {
            MoveTarget::Point(position) => position.clone(),
            MoveTarget::Entity(entity) => entity.position.clone(),
        };
        self.start("approach".into(), Some(destination), move |ctx| async move {
            tokio::select! {
                _ = ctx.cancelled() => Err(RuntimeError::Cancelled),
                moved = movement.move_to(target, options) => moved,
            }
        })
    }

    /// Walks `path` as the movement task, replacing any current one.
    pub fn follow_path(&self, path: Vec<Waypoint>, options: MoveOptions) -> Task<MoveOutcome> {
        let destination = path.last().map(|waypoint| waypoint.position.clone());
        let inner = Arc::clone(&self.inner);
        self.start("follow_path".into(), destination, move |ctx| async move {
            inner.walk(&ctx, path, &options).await
        })
    }

    /// Resolves `destination`, searches a path and follows it, all inside a
    /// single movement task.
    ///
    /// Unknown NPC or map names fail here, before any task is started.
    /// Search failures resolve the returned task with the planning error.
    pub fn pathfind_move(
        &self,
        destination: Destination,
        path_options: PathOptions,
        options: MoveOptions,
    ) -> Result<Task<MoveOutcome>> {
        let goal = self.inner.resolve(&destination)?;
        let inner = Arc::clone(&self.inner);
        let name = format!("pathfind_move:{goal}");
        let task = self.start(name, Some(goal.clone()), move |ctx| async move {
            let me = inner.host.character();
            let request = path_request(me.position.clone(), goal, &path_options);
            let path = tokio::select! {
                _ = ctx.cancelled() => return Err(RuntimeError::Cancelled),
                path = inner.pathfinder.find_path(me.hitbox, request) => path?,
            };
            inner.walk(&ctx, path, &options).await
        });
        Ok(task)
    }

    /// Circles a hostile entity at stand-off range, clockwise, until it dies,
    /// disappears, or turns out to be fighting someone else.
    pub fn kite(&self, target: &str) -> Task<MoveOutcome> {
        let inner = Arc::clone(&self.inner);
        let target = target.to_string();
        let destination = inner.host.entity(&target).map(|entity| entity.position);
        self.start(format!("kite:{target}"), destination, move |ctx| async move {
            inner.kite(&ctx, &target).await
        })
    }

    /// Adjusts `dest` around walls and other movers; see
    /// [`avoid_collisions`].
    pub fn collision_avoidance(&self, dest: &Position) -> Position {
        let me = self.inner.host.character();
        self.inner.avoid(&me, dest)
    }

    /// Resolves a named destination to coordinates.
    pub fn resolve(&self, destination: &Destination) -> Result<Position> {
        self.inner.resolve(destination)
    }

    fn start<F, Fut>(
        &self,
        name: String,
        destination: Option<Position>,
        body: F,
    ) -> Task<MoveOutcome>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: std::future::Future<Output = Result<MoveOutcome>> + Send + 'static,
    {
        info!(target: "runtime::movement", task = %name, "movement started");
        self.inner.events.publish(MovementEvent::Started {
            task: name.clone(),
            destination,
        });

        let events = self.inner.events.clone();
        self.inner.slot.start(name.clone(), move |ctx| {
            let run = body(ctx);
            async move {
                let result = run.await;
                debug!(target: "runtime::movement", task = %name, ?result, "movement finished");
                events.publish(MovementEvent::Finished {
                    task: name,
                    outcome: result.clone().map_err(|error| error.to_string()),
                });
                result
            }
        })
    }
}

fn path_request(origin: Position, goal: Position, options: &PathOptions) -> PathRequest {
    let mut request = PathRequest::new(origin, goal);
    if let Some(range) = options.within {
        request = request.within(range);
    }
    if options.same_map_only {
        request = request.same_map_only();
    }
    if let Some(expansions) = options.max_expansions {
        request = request.max_expansions(expansions);
    }
    request
}

impl Inner {
    fn resolve(&self, destination: &Destination) -> Result<Position> {
        let resolved = match destination {
            Destination::Point(position) => {
                if self.world.map(&position.map).is_none() {
                    return Err(PathfindError::UnknownMap(position.map.clone()).into());
                }
                Some(position.clone())
            }
            Destination::Npc(name) => self.world.locate_npc(name),
            Destination::Map(name) => self.world.map_entrance(name),
        };
        resolved.ok_or_else(|| {
            let name = match destination {
                Destination::Npc(name) | Destination::Map(name) => name.clone(),
                Destination::Point(position) => position.to_string(),
            };
            MovementError::UnknownLocation(name).into()
        })
    }

    fn plan_direct(
        &self,
        me: &Entity,
        target: &MoveTarget,
        options: &MoveOptions,
    ) -> Result<Position> {
        let mut dest = match target {
            MoveTarget::Point(position) => position.clone(),
            MoveTarget::Entity(entity) if self.config.lead_targets => lead_point(me, entity),
            MoveTarget::Entity(entity) => entity.position.clone(),
        };
        if !dest.same_map(&me.position) {
            return Err(PathfindError::CrossMapDisallowed {
                from: me.position.map.clone(),
                to: dest.map,
            }
            .into());
        }
        if let Some(max) = options.max_distance {
            dest = clamp_travel(&me.position, &dest, max);
        }
        if options.avoid {
            dest = self.avoid(me, &dest);
        }
        Ok(dest)
    }

    fn avoid(&self, me: &Entity, dest: &Position) -> Position {
        let others = self.host.entities();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        avoid_collisions(&self.world, &self.config, me, &others, dest, &mut *rng)
    }

    /// Issues one primitive move, racing it against cancellation and death.
    async fn step(
        &self,
        ctx: &TaskContext,
        deaths: &mut broadcast::Receiver<HostEvent>,
        id: &str,
        dest: &Position,
    ) -> Result<Option<MoveOutcome>> {
        tokio::select! {
            _ = ctx.cancelled() => Err(RuntimeError::Cancelled),
            _ = death_of(self.host.as_ref(), deaths, id) => {
                info!(target: "runtime::movement", "character died mid-path");
                Ok(Some(MoveOutcome::Stopped))
            }
            moved = self.host.move_to(dest.x, dest.y) => match moved {
                Ok(()) => Ok(None),
                Err(ActionRejected::Interrupted) => Ok(Some(MoveOutcome::Interrupted)),
                Err(reason) => Err(MovementError::Rejected(reason).into()),
            },
        }
    }

    async fn walk(
        &self,
        ctx: &TaskContext,
        path: Vec<Waypoint>,
        options: &MoveOptions,
    ) -> Result<MoveOutcome> {
        let mut deaths = self.host.subscribe();
        let mut arrivals = self.host.subscribe();
        let mut travelled = 0.0;

        for waypoint in path {
            ctx.check()?;
            let me = self.host.character();
            if !me.is_alive() {
                return Ok(MoveOutcome::Stopped);
            }

            if waypoint.is_transition() || !waypoint.position.same_map(&me.position) {
                let spawn = waypoint.spawn.unwrap_or(0);
                self.transition(ctx, &mut arrivals, &waypoint.position.map, spawn)
                    .await?;
                continue;
            }

            let Some(distance) = me.position.distance(&waypoint.position) else {
                continue;
            };
            if distance <= self.config.arrive_tolerance {
                continue;
            }

            let mut dest = waypoint.position;
            let mut exhausted = false;
            if let Some(max) = options.max_distance {
                let left = max - travelled;
                if left <= 0.0 {
                    return Ok(MoveOutcome::Stopped);
                }
                if distance > left {
                    dest = clamp_travel(&me.position, &dest, left);
                    exhausted = true;
                }
            }
            if options.avoid {
                dest = self.avoid(&me, &dest);
            }

            if let Some(outcome) = self.step(ctx, &mut deaths, &me.id, &dest).await? {
                return Ok(outcome);
            }
            travelled += me.position.distance(&dest).unwrap_or(0.0);
            if exhausted {
                debug!(target: "runtime::movement", travelled, "distance budget exhausted");
                return Ok(MoveOutcome::Stopped);
            }
        }
        Ok(MoveOutcome::Arrived)
    }

    /// Crosses to `map` through the host's transport primitive and waits for
    /// the character to show up there.
    async fn transition(
        &self,
        ctx: &TaskContext,
        arrivals: &mut broadcast::Receiver<HostEvent>,
        map: &str,
        spawn: usize,
    ) -> Result<()> {
        debug!(target: "runtime::movement", map, spawn, "transporting");
        tokio::select! {
            _ = ctx.cancelled() => return Err(RuntimeError::Cancelled),
            moved = self.host.transport(map, spawn) => {
                moved.map_err(MovementError::Rejected)?;
            }
        }

        let arrived = async {
            while self.host.character().position.map != map {
                if let Ok(Err(RecvError::Closed)) =
                    time::timeout(TRANSITION_POLL, arrivals.recv()).await
                {
                    time::sleep(TRANSITION_POLL).await;
                }
            }
        };
        tokio::select! {
            _ = ctx.cancelled() => Err(RuntimeError::Cancelled),
            waited = time::timeout(self.config.transition_timeout(), arrived) => {
                waited.map_err(|_| MovementError::TransitionTimeout { map: map.to_string() })?;
                Ok(())
            }
        }
    }

    async fn kite(&self, ctx: &TaskContext, target: &str) -> Result<MoveOutcome> {
        let mut deaths = self.host.subscribe();
        loop {
            ctx.check()?;
            let me = self.host.character();
            if !me.is_alive() {
                return Ok(MoveOutcome::Stopped);
            }
            let Some(hostile) = self.host.entity(target).filter(Entity::is_alive) else {
                return Ok(MoveOutcome::Stopped);
            };
            let Some(distance) = me.distance_to(&hostile) else {
                return Ok(MoveOutcome::Stopped);
            };

            let dest = if hostile.is_targeting(&me.id) {
                let radius = stand_off(distance, me.range, &self.config);
                let angle = (me.position.y - hostile.position.y)
                    .atan2(me.position.x - hostile.position.x)
                    + self.config.kite_angle_step;
                circle_point(
                    &self.world,
                    &me.hitbox,
                    &me.position,
                    &hostile.position,
                    radius,
                    angle,
                    self.config.kite_angle_step,
                )
            } else if distance > me.range {
                let closing = distance - me.range * self.config.kite_range_ratio;
                Some(clamp_travel(&me.position, &hostile.position, closing))
            } else if hostile.target.is_some() {
                debug!(target: "runtime::movement", target, "kite target engaged elsewhere");
                return Ok(MoveOutcome::EngagedElsewhere);
            } else {
                None
            };

            if let Some(dest) = dest {
                match self.step(ctx, &mut deaths, &me.id, &dest).await {
                    Ok(Some(MoveOutcome::Stopped)) => return Ok(MoveOutcome::Stopped),
                    Ok(_) => {}
                    Err(RuntimeError::Movement(MovementError::Rejected(reason))) => {
                        warn!(target: "runtime::movement", target, %reason, "kite move rejected");
                    }
                    Err(error) => return Err(error),
                }
            }

            if !ctx.sleep(self.config.kite_interval()).await {
                return Err(RuntimeError::Cancelled);
            }
        }
    }
}

/// Resolves once the host reports `id` dead. Lagged receivers fall back to
/// reading the character snapshot.
async fn death_of(host: &dyn Host, events: &mut broadcast::Receiver<HostEvent>, id: &str) {
    loop {
        match events.recv().await {
            Ok(HostEvent::Death { id: dead }) if dead == id => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {
                if !host.character().is_alive() {
                    return;
                }
            }
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
