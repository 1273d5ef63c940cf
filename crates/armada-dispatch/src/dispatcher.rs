//! Worker-pool scheduler over a fixed task queue.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use armada_core::{ArmadaError, ArmadaResult, Outcome};

use crate::task::Task;

/// Synchronous progress callback: `(completed, total)`.
///
/// Callbacks run on worker tasks; suppliers must be re-entrant or serialize
/// internally.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Poll cadence while a graceful shutdown waits for the running batch.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// Executes a submitted batch of tasks with bounded concurrency.
///
/// Lifecycle: tasks are submitted while the dispatcher is assembling, then a
/// single `execute` drains the whole queue. Submissions are rejected while a
/// batch is executing and after shutdown. The result slice always holds one
/// [`Outcome`] per submitted task, placed by submission index; tasks that
/// never ran because the batch was cancelled appear as synthetic `Cancelled`
/// outcomes.
pub struct Dispatcher {
    worker_cap: usize,
    queue: Mutex<Vec<Task>>,
    running: AtomicBool,
    shutdown: AtomicBool,
}

impl Dispatcher {
    /// Create a dispatcher with the given worker cap (clamped to >= 1).
    #[must_use]
    pub fn new(worker_cap: usize) -> Self {
        Self {
            worker_cap: worker_cap.max(1),
            queue: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    /// The configured worker cap.
    #[must_use]
    pub fn worker_cap(&self) -> usize {
        self.worker_cap
    }

    /// Whether a batch is currently executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Number of tasks waiting in the queue.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.lock().expect("queue mutex poisoned").len()
    }

    /// Add a task to the queue, assigning its submission index.
    ///
    /// # Errors
    ///
    /// `Shutdown` after [`Dispatcher::shutdown`], `Busy` while a batch is
    /// executing, `InvalidArgument` for a task with an empty cluster name.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    pub fn submit(&self, mut task: Task) -> ArmadaResult<usize> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(ArmadaError::Shutdown);
        }
        if self.running.load(Ordering::Acquire) {
            return Err(ArmadaError::Busy);
        }
        if task.cluster_name().is_empty() {
            return Err(ArmadaError::InvalidArgument(
                "task cluster name is empty".to_string(),
            ));
        }

        let mut queue = self.queue.lock().expect("queue mutex poisoned");
        let index = queue.len();
        task.assign_index(index);
        queue.push(task);
        Ok(index)
    }

    /// Execute the queued batch, returning one outcome per task in
    /// submission order.
    ///
    /// A fired token stops feeding new tasks and wakes idle workers; tasks
    /// already in flight run to completion, and everything that never ran is
    /// reported as a synthetic `Cancelled` outcome. A second concurrent call
    /// observes the running batch and returns an empty slice.
    pub async fn execute(&self, ctx: &CancellationToken) -> Vec<Outcome> {
        self.execute_inner(ctx, None).await
    }

    /// As [`Dispatcher::execute`], invoking `on_progress(completed, total)`
    /// after each task completes.
    ///
    /// Progress is monotonic and reaches `(total, total)` on normal
    /// completion; under cancellation it stops at the number of tasks the
    /// workers actually drained.
    pub async fn execute_with_progress<F>(
        &self,
        ctx: &CancellationToken,
        on_progress: F,
    ) -> Vec<Outcome>
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.execute_inner(ctx, Some(Arc::new(on_progress))).await
    }

    async fn execute_inner(
        &self,
        ctx: &CancellationToken,
        progress: Option<ProgressFn>,
    ) -> Vec<Outcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            error!("execute called while a batch is already running");
            return Vec::new();
        }

        let snapshot: Vec<Task> = self.queue.lock().expect("queue mutex poisoned").clone();
        if snapshot.is_empty() {
            self.running.store(false, Ordering::Release);
            return Vec::new();
        }

        let total = snapshot.len();
        let names: Vec<String> = snapshot
            .iter()
            .map(|t| t.cluster_name().to_string())
            .collect();
        let workers = self.worker_cap.min(total);
        debug!(total, workers, "executing batch");

        let (task_tx, task_rx) = mpsc::channel::<Task>(total);
        let task_rx = Arc::new(AsyncMutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<Outcome>(total);
        let completed = Arc::new(AtomicUsize::new(0));

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let ctx = ctx.clone();
            let completed = Arc::clone(&completed);
            let progress = progress.clone();
            pool.spawn(async move {
                loop {
                    let task = { task_rx.lock().await.recv().await };
                    let Some(task) = task else { break };

                    // A token that fired before this task started converts it
                    // to a cancelled outcome without entering user code.
                    let outcome = if ctx.is_cancelled() {
                        Outcome::cancelled(task.cluster_name(), task.submission_index())
                    } else {
                        let started = Instant::now();
                        match task.invoke(ctx.clone()).await {
                            Ok(payload) => Outcome::success(
                                task.cluster_name(),
                                payload,
                                started.elapsed(),
                                task.submission_index(),
                            ),
                            Err(e) => Outcome::failure(
                                task.cluster_name(),
                                e,
                                started.elapsed(),
                                task.submission_index(),
                            ),
                        }
                    };

                    // Capacity equals the batch size, so the send never blocks.
                    if result_tx.send(outcome).await.is_err() {
                        break;
                    }
                    let done = completed.fetch_add(1, Ordering::AcqRel).saturating_add(1);
                    if let Some(cb) = &progress {
                        cb(done, total);
                    }
                }
            });
        }
        drop(result_tx);

        let feeder_ctx = ctx.clone();
        let feeder = tokio::spawn(async move {
            for task in snapshot {
                if feeder_ctx.is_cancelled() {
                    break;
                }
                if task_tx.send(task).await.is_err() {
                    break;
                }
            }
            // Dropping the sender closes the channel; queued tasks still drain.
        });

        while pool.join_next().await.is_some() {}
        let _ = feeder.await;

        let mut slots: Vec<Option<Outcome>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(outcome) = result_rx.recv().await {
            let index = outcome.submission_index;
            if index < total {
                slots[index] = Some(outcome);
            }
        }
        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| Outcome::cancelled(names[index].clone(), index))
            })
            .collect();

        info!(
            total,
            successful = outcomes.iter().filter(|o| o.is_success()).count(),
            "batch drained"
        );
        self.running.store(false, Ordering::Release);
        outcomes
    }

    /// Request a graceful shutdown and wait for any running batch to drain.
    ///
    /// Does not cancel the in-flight batch - that is the execute token's
    /// job; this only blocks new submissions and waits.
    ///
    /// # Errors
    ///
    /// `AlreadyShutdown` on a repeated call, `ShutdownTimeout` when the
    /// token fires before the running batch drains.
    pub async fn shutdown(&self, ctx: &CancellationToken) -> ArmadaResult<()> {
        if self
            .shutdown
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ArmadaError::AlreadyShutdown);
        }

        let mut tick = tokio::time::interval(SHUTDOWN_POLL);
        loop {
            if !self.running.load(Ordering::Acquire) {
                return Ok(());
            }
            tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(ArmadaError::ShutdownTimeout),
                _ = tick.tick() => {},
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("worker_cap", &self.worker_cap)
            .field("queued", &self.queued())
            .field("running", &self.is_running())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
