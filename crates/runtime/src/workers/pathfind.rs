//! Background pathfinding.
//!
//! Searches run on their own task and hand control back to the scheduler
//! every `expansions_per_yield` node expansions, so a long search never
//! starves the movement and skill loops. Requests and replies are
//! correlated by a job id.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use game_core::{
    Hitbox, PathRequest, PathfindConfig, PathfindError, Pathfinder, SearchProgress, Waypoint, World,
};

use crate::api::{Result, RuntimeError};

const QUEUE_CAPACITY: usize = 32;

/// One queued search.
pub struct PathJob {
    pub id: u64,
    pub request: PathRequest,
    pub hitbox: Hitbox,
    pub reply: oneshot::Sender<std::result::Result<Vec<Waypoint>, PathfindError>>,
}

/// Owns the world data and serves [`PathJob`]s one at a time.
pub struct PathfindWorker {
    world: Arc<World>,
    config: PathfindConfig,
    jobs: mpsc::Receiver<PathJob>,
}

impl PathfindWorker {
    pub fn new(world: Arc<World>, config: PathfindConfig, jobs: mpsc::Receiver<PathJob>) -> Self {
        Self {
            world,
            config,
            jobs,
        }
    }

    /// Main worker loop. Ends once every handle is dropped.
    pub async fn run(mut self) {
        info!(target: "runtime::pathfind", "pathfinding worker started");
        while let Some(job) = self.jobs.recv().await {
            self.handle_job(job).await;
        }
        debug!(target: "runtime::pathfind", "pathfinding worker stopped");
    }

    async fn handle_job(&self, job: PathJob) {
        let PathJob {
            id,
            request,
            hitbox,
            reply,
        } = job;
        let finder = Pathfinder::new(&self.world, hitbox, self.config.clone());

        let mut search = match finder.search(&request) {
            Ok(search) => search,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        let result = loop {
            match search.step(self.config.expansions_per_yield) {
                SearchProgress::Pending => {
                    tokio::task::yield_now().await;
                    if reply.is_closed() {
                        debug!(
                            target: "runtime::pathfind",
                            job = id,
                            "requester gone, search abandoned"
                        );
                        return;
                    }
                }
                SearchProgress::Found(path) => break Ok(finder.simplify(&path)),
                SearchProgress::Failed(error) => break Err(error),
            }
        };

        trace!(
            target: "runtime::pathfind",
            job = id,
            expansions = search.expansions(),
            ok = result.is_ok(),
            "search finished"
        );
        let _ = reply.send(result);
    }
}

/// Cheap, cloneable client of a [`PathfindWorker`].
#[derive(Clone)]
pub struct PathfinderHandle {
    jobs: mpsc::Sender<PathJob>,
    next_id: Arc<AtomicU64>,
}

impl PathfinderHandle {
    /// Spawns a worker over `world` and returns its handle.
    pub fn spawn(world: Arc<World>, config: PathfindConfig) -> (Self, JoinHandle<()>) {
        let (jobs, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let worker = PathfindWorker::new(world, config, receiver);
        let join = tokio::spawn(worker.run());
        let handle = Self {
            jobs,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (handle, join)
    }

    /// Queues a search and waits for its simplified path.
    pub async fn find_path(&self, hitbox: Hitbox, request: PathRequest) -> Result<Vec<Waypoint>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(PathJob {
                id,
                request,
                hitbox,
                reply,
            })
            .await
            .map_err(|_| RuntimeError::WorkerClosed)?;

        let path = response.await.map_err(RuntimeError::WorkerReply)??;
        Ok(path)
    }
}
