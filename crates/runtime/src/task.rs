//! Cancellable units of asynchronous work.
//!
//! A [`Task`] runs its body on the tokio scheduler and resolves exactly once:
//! with the body's result, with [`RuntimeError::Cancelled`] if cancelled
//! first, or with [`RuntimeError::TaskPanicked`]. Cancellation is
//! cooperative. The body sees it through its [`TaskContext`] and is expected
//! to return at its next suspension point; awaiters are released immediately.
//!
//! [`TaskSlot`] holds "the current task" for a resource and cancels the old
//! occupant before spawning its replacement.
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, error};

use crate::api::{Result, RuntimeError};

struct Shared<T> {
    name: String,
    cancel: Arc<watch::Sender<bool>>,
    outcome: watch::Sender<Option<Result<T>>>,
}

impl<T> Shared<T> {
    /// Stores the outcome unless one is already set.
    fn resolve(&self, result: Result<T>) -> bool {
        self.outcome.send_if_modified(move |outcome| {
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(result);
            true
        })
    }
}

/// Handle to a spawned body. Clones share the same underlying task.
pub struct Task<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (cancel, _) = watch::channel(false);
        let (outcome, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            name: name.into(),
            cancel: Arc::new(cancel),
            outcome,
        });

        let ctx = TaskContext {
            cancel: Arc::clone(&shared.cancel),
        };
        let body = tokio::spawn(body(ctx));

        let supervisor = Arc::clone(&shared);
        tokio::spawn(async move {
            let result = match body.await {
                Ok(result) => result,
                Err(join) if join.is_panic() => {
                    error!(target: "runtime::task", task = %supervisor.name, "task panicked");
                    Err(RuntimeError::TaskPanicked {
                        name: supervisor.name.clone(),
                    })
                }
                Err(_) => Err(RuntimeError::Cancelled),
            };
            supervisor.resolve(result);
        });

        Self { shared }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shared.cancel.borrow()
    }

    /// Whether the outcome is settled (completed, failed, or cancelled).
    pub fn is_finished(&self) -> bool {
        self.shared.outcome.borrow().is_some()
    }

    /// Requests cancellation. Returns `false` if the task had already
    /// resolved or been cancelled.
    pub fn cancel(&self) -> bool {
        let accepted = self.shared.resolve(Err(RuntimeError::Cancelled));
        if accepted {
            self.shared.cancel.send_replace(true);
            debug!(target: "runtime::task", task = %self.shared.name, "cancelled");
        }
        accepted
    }

    /// Waits for the single outcome of this task.
    pub async fn result(&self) -> Result<T> {
        let mut outcome = self.shared.outcome.subscribe();
        match outcome.wait_for(Option::is_some).await {
            Ok(resolved) => (*resolved).clone().unwrap_or(Err(RuntimeError::Cancelled)),
            Err(_) => Err(RuntimeError::Cancelled),
        }
    }
}

/// The body's view of its own task.
#[derive(Clone)]
pub struct TaskContext {
    cancel: Arc<watch::Sender<bool>>,
}

impl TaskContext {
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(RuntimeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.subscribe();
        let _ = cancel.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleeps for `duration`; returns `false` if cancelled first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.sleep_until(Instant::now() + duration).await
    }

    pub async fn sleep_until(&self, deadline: Instant) -> bool {
        tokio::select! {
            _ = self.cancelled() => false,
            _ = time::sleep_until(deadline) => !self.is_cancelled(),
        }
    }
}

/// Holder of at most one live task.
pub struct TaskSlot<T> {
    current: Mutex<Option<Task<T>>>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl<T> TaskSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cancels the current occupant, then spawns `body` in its place.
    pub fn start<F, Fut>(&self, name: impl Into<String>, body: F) -> Task<T>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let task = Task::spawn(name, body);
        *current = Some(task.clone());
        task
    }

    /// Cancels and clears the current occupant.
    pub fn cancel(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some_and(|task| task.cancel())
    }

    pub fn current(&self) -> Option<Task<T>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
