//! Skill scheduler: cooldown-aware auto-casting with one active
//! registration per cooldown group.
//!
//! Registering an autouse for a group that already has one preempts it: the
//! old token is deactivated and its task cancelled before the new task is
//! spawned, so two loops never cast from the same group.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use game_core::{SkillConfig, SkillTable};

use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, SkillEvent};
use crate::host::Host;
use crate::task::{Task, TaskContext};

/// Extra gate evaluated before every cast; returning `false` ends the
/// autouse.
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

struct AutouseToken {
    id: u64,
    skill: String,
    target: Option<String>,
    args: Vec<String>,
    active: AtomicBool,
}

impl AutouseToken {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn matches(&self, skill: &str, target: Option<&str>, args: &[String]) -> bool {
        self.skill == skill && self.target.as_deref() == target && self.args == args
    }
}

struct Registration {
    token: Arc<AutouseToken>,
    task: Task<()>,
}

/// What currently occupies a cooldown group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveAutouse {
    pub skill: String,
    pub target: Option<String>,
}

struct Inner {
    host: Arc<dyn Host>,
    skills: SkillTable,
    config: SkillConfig,
    registry: Mutex<HashMap<String, Registration>>,
    next_id: AtomicU64,
    events: EventBus,
}

#[derive(Clone)]
pub struct SkillScheduler {
    inner: Arc<Inner>,
}

impl SkillScheduler {
    pub fn new(
        host: Arc<dyn Host>,
        skills: SkillTable,
        config: SkillConfig,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                skills,
                config,
                registry: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                events,
            }),
        }
    }

    pub fn cooldown_group<'a>(&'a self, skill: &'a str) -> &'a str {
        self.inner.skills.cooldown_group(skill)
    }

    /// Keeps casting `skill` whenever its cooldown group is ready.
    ///
    /// Re-registering an equivalent autouse (same skill, target and args)
    /// while it is active returns the running task untouched. Anything else
    /// preempts the group's current registration.
    pub fn autouse(
        &self,
        skill: &str,
        target: Option<&str>,
        args: &[String],
        condition: Option<Condition>,
    ) -> Task<()> {
        let group = self.cooldown_group(skill).to_string();
        let mut registry = self.inner.lock();

        if let Some(existing) = registry.get(&group)
            && existing.token.is_active()
            && existing.token.matches(skill, target, args)
        {
            return existing.task.clone();
        }

        if let Some(previous) = registry.remove(&group) {
            previous.token.deactivate();
            previous.task.cancel();
            info!(
                target: "runtime::skills",
                group = %group,
                previous = %previous.token.skill,
                next = skill,
                "autouse preempted"
            );
        }

        let token = Arc::new(AutouseToken {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            skill: skill.to_string(),
            target: target.map(str::to_string),
            args: args.to_vec(),
            active: AtomicBool::new(true),
        });
        self.inner.events.publish(SkillEvent::AutouseStarted {
            skill: skill.to_string(),
            group: group.clone(),
            target: token.target.clone(),
        });

        let inner = Arc::clone(&self.inner);
        let owned = Arc::clone(&token);
        let task_group = group.clone();
        let task = Task::spawn(format!("autouse:{skill}"), move |ctx| async move {
            let result = inner.run(&ctx, &owned, &task_group, condition).await;
            inner.release(&task_group, &owned);
            result
        });

        registry.insert(
            group,
            Registration {
                token,
                task: task.clone(),
            },
        );
        task
    }

    /// Waits until `skill`'s cooldown group is ready, cancelling any autouse
    /// on that group first so the two never wait on each other.
    pub async fn wait_until_ready(&self, skill: &str) {
        let group = self.cooldown_group(skill).to_string();
        self.cancel(&group);
        while let Some(ready) = self.inner.host.ready_at(&group) {
            if ready <= Instant::now() {
                break;
            }
            time::sleep_until(ready).await;
        }
    }

    /// Casts `skill` once, as soon as its group is ready.
    pub async fn use_skill(
        &self,
        skill: &str,
        target: Option<&str>,
        args: &[String],
    ) -> Result<()> {
        self.wait_until_ready(skill).await;
        match self.inner.host.use_skill(skill, target, args).await {
            Ok(()) => {
                self.inner.publish_cast(skill, target);
                Ok(())
            }
            Err(reason) => {
                self.inner.publish_failure(skill, &reason.to_string());
                Err(RuntimeError::Host(reason))
            }
        }
    }

    /// Ends the autouse occupying `group`. Returns whether there was one.
    pub fn cancel(&self, group: &str) -> bool {
        let Some(registration) = self.inner.lock().remove(group) else {
            return false;
        };
        registration.token.deactivate();
        registration.task.cancel();
        debug!(
            target: "runtime::skills",
            group,
            skill = %registration.token.skill,
            "autouse cancelled"
        );
        true
    }

    pub fn cancel_all(&self) {
        let drained: Vec<Registration> = self.inner.lock().drain().map(|(_, r)| r).collect();
        for registration in drained {
            registration.token.deactivate();
            registration.task.cancel();
        }
    }

    pub fn active(&self, group: &str) -> Option<ActiveAutouse> {
        self.inner
            .lock()
            .get(group)
            .filter(|registration| registration.token.is_active())
            .map(|registration| ActiveAutouse {
                skill: registration.token.skill.clone(),
                target: registration.token.target.clone(),
            })
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Registration>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(
        &self,
        ctx: &TaskContext,
        token: &AutouseToken,
        group: &str,
        condition: Option<Condition>,
    ) -> Result<()> {
        loop {
            while let Some(ready) = self.host.ready_at(group) {
                if ready <= Instant::now() {
                    break;
                }
                if !ctx.sleep_until(ready).await {
                    return Err(RuntimeError::Cancelled);
                }
            }

            if !token.is_active() || ctx.is_cancelled() {
                return Ok(());
            }
            if condition.as_ref().is_some_and(|holds| !holds()) {
                debug!(
                    target: "runtime::skills",
                    skill = %token.skill,
                    "autouse condition no longer holds"
                );
                return Ok(());
            }
            if let Some(target) = &token.target
                && !self.host.entity(target).is_some_and(|entity| entity.is_alive())
            {
                debug!(
                    target: "runtime::skills",
                    skill = %token.skill,
                    target,
                    "autouse target gone"
                );
                return Ok(());
            }

            match self
                .host
                .use_skill(&token.skill, token.target.as_deref(), &token.args)
                .await
            {
                Ok(()) => {
                    self.publish_cast(&token.skill, token.target.as_deref());
                    tokio::task::yield_now().await;
                }
                Err(reason) if reason.is_terminal() => {
                    self.publish_failure(&token.skill, &reason.to_string());
                    return Ok(());
                }
                Err(reason) => {
                    warn!(
                        target: "runtime::skills",
                        skill = %token.skill,
                        %reason,
                        "cast failed, backing off"
                    );
                    self.publish_failure(&token.skill, &reason.to_string());
                    if !ctx.sleep(self.config.retry_backoff()).await {
                        return Err(RuntimeError::Cancelled);
                    }
                }
            }
        }
    }

    /// Deactivates `token` and drops its registration if it still owns the
    /// group.
    fn release(&self, group: &str, token: &AutouseToken) {
        token.deactivate();
        let mut registry = self.lock();
        if registry
            .get(group)
            .is_some_and(|registration| registration.token.id == token.id)
        {
            registry.remove(group);
        }
        drop(registry);
        self.events.publish(SkillEvent::AutouseEnded {
            skill: token.skill.clone(),
            group: group.to_string(),
        });
    }

    fn publish_cast(&self, skill: &str, target: Option<&str>) {
        self.events.publish(SkillEvent::Cast {
            skill: skill.to_string(),
            target: target.map(str::to_string),
        });
    }

    fn publish_failure(&self, skill: &str, reason: &str) {
        self.events.publish(SkillEvent::CastFailed {
            skill: skill.to_string(),
            reason: reason.to_string(),
        });
    }
}
