use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use settle_core::{BatchOutcome, TaskExecutionError, TaskResult};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{Event, EventSink, NoOpEventSink};
use crate::runner::WorkerLimit;

/// Fans one task out over many targets and collects every result.
///
/// A failing or panicking target never affects its siblings unless `fail_fast` is on, and
/// then only targets that have not started yet are skipped. Results always come back in
/// input order.
#[derive(Clone)]
pub struct ParallelTaskRunner {
    limit: WorkerLimit,
    fail_fast: bool,
    sink: Arc<dyn EventSink>,
}

impl Default for ParallelTaskRunner {
    fn default() -> Self {
        Self::new(WorkerLimit::default())
    }
}

impl std::fmt::Debug for ParallelTaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelTaskRunner")
            .field("limit", &self.limit)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl ParallelTaskRunner {
    pub fn new(limit: WorkerLimit) -> Self {
        Self {
            limit,
            fail_fast: false,
            sink: Arc::new(NoOpEventSink),
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn limit(&self) -> WorkerLimit {
        self.limit
    }

    /// Run `task` once per target and wait for all of them.
    pub async fn run_all<G, T, E, F, Fut>(&self, targets: Vec<G>, task: F) -> BatchOutcome<G, T>
    where
        G: Clone + Display + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        F: Fn(G) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if targets.is_empty() {
            return BatchOutcome::default();
        }

        let total = targets.len();
        let workers = self.limit.pool_size(total);
        debug!(targets = total, workers, limit = %self.limit, "starting batch");

        let permits = Arc::new(Semaphore::new(workers));
        let failed = Arc::new(AtomicBool::new(false));
        let task = Arc::new(task);

        let mut handles: Vec<(G, JoinHandle<Result<T, TaskExecutionError>>)> =
            Vec::with_capacity(total);
        for target in targets {
            let permits = permits.clone();
            let failed = failed.clone();
            let task = task.clone();
            let sink = self.sink.clone();
            let fail_fast = self.fail_fast;
            let owned = target.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| TaskExecutionError::failed(format!("worker pool closed: {e}")))?;
                if fail_fast && failed.load(Ordering::SeqCst) {
                    return Err(TaskExecutionError::skipped());
                }

                let name = owned.to_string();
                sink.emit(Event::TaskStarted {
                    target: name.clone(),
                })
                .await;
                let result = match AssertUnwindSafe(task(owned)).catch_unwind().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(TaskExecutionError::failed(e.to_string())),
                    Err(payload) => Err(TaskExecutionError::panicked(panic_message(payload))),
                };
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }
                sink.emit(Event::TaskFinished {
                    target: name,
                    succeeded: result.is_ok(),
                })
                .await;
                result
            });
            handles.push((target, handle));
        }

        let mut results = Vec::with_capacity(total);
        for (target, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    Err(TaskExecutionError::panicked(panic_message(e.into_panic())))
                }
                Err(e) => Err(TaskExecutionError::failed(format!("task join error: {e}"))),
            };
            if let Err(err) = &outcome {
                warn!(target = %target, error = %err, "task failed");
            }
            results.push(TaskResult {
                target,
                outcome,
            });
        }

        let outcome = BatchOutcome::new(results);
        let failed = outcome.failed_count();
        info!(targets = total, failed, "batch finished");
        self.sink
            .emit(Event::BatchFinished { total, failed })
            .await;
        outcome
    }

    /// [`Self::run_all`] for synchronous task bodies, each run on the blocking thread pool.
    pub async fn run_all_blocking<G, T, E, F>(
        &self,
        targets: Vec<G>,
        task: F,
    ) -> BatchOutcome<G, T>
    where
        G: Clone + Display + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        F: Fn(G) -> Result<T, E> + Send + Sync + 'static,
    {
        let task = Arc::new(task);
        self.run_all(targets, move |target| {
            let task = task.clone();
            async move {
                match tokio::task::spawn_blocking(move || task(target)).await {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    // Re-raised so it is reported as a panic of this target.
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(e) => Err(format!("blocking task join error: {e}")),
                }
            }
        })
        .await
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
