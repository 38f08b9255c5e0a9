//! Background worker pool: jobs go out over one channel, tagged results come
//! back over another and are drained once per frame.
//!
//! Workers never see the store. Each job carries everything it needs, and
//! each result carries the caller's tag so stale results can be recognised
//! and dropped on the main thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::TaskFailure;

type TaskFn<J, O> = Arc<dyn Fn(J) -> O + Send + Sync>;

/// A tagged job result as delivered by [`WorkerPool::drain_results`].
pub type TaskResult<T, O> = (T, Result<O, TaskFailure>);

/// Runs `task` and turns a panic into a [`TaskFailure`].
fn run_guarded<J, O>(task: &TaskFn<J, O>, job: J) -> Result<O, TaskFailure> {
    catch_unwind(AssertUnwindSafe(|| task(job))).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        TaskFailure::Panicked(message)
    })
}

/// Thread pool executing one kind of job.
///
/// With zero threads the pool runs each job inline inside
/// [`submit`](Self::submit) and still delivers the result through
/// [`drain_results`](Self::drain_results), so callers observe the same
/// ordering either way.
pub struct WorkerPool<T, J, O> {
    name: String,
    task: TaskFn<J, O>,
    /// `None` in inline mode or after shutdown.
    task_sender: Option<Sender<(T, J)>>,
    result_sender: Sender<TaskResult<T, O>>,
    result_receiver: Receiver<TaskResult<T, O>>,
    worker_handles: Vec<JoinHandle<()>>,
    shut_down: bool,
}

impl<T, J, O> WorkerPool<T, J, O>
where
    T: Send + 'static,
    J: Send + 'static,
    O: Send + 'static,
{
    /// Spawns `threads` named workers running `task`.
    pub fn new(
        name: &str,
        threads: usize,
        task: impl Fn(J) -> O + Send + Sync + 'static,
    ) -> Self {
        let task: TaskFn<J, O> = Arc::new(task);
        let (result_sender, result_receiver) = unbounded();
        let (task_tx, task_rx) = unbounded::<(T, J)>();

        let mut handles = Vec::with_capacity(threads);
        for i in 0..threads {
            let rx = task_rx.clone();
            let tx = result_sender.clone();
            let task = Arc::clone(&task);
            let spawned = std::thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || {
                    while let Ok((tag, job)) = rx.recv() {
                        let outcome = run_guarded(&task, job);
                        let _ = tx.send((tag, outcome));
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => tracing::error!(pool = name, error = %err, "failed to spawn worker thread"),
            }
        }

        if threads > 0 && handles.is_empty() {
            tracing::warn!(pool = name, "no worker threads available; running jobs inline");
        }
        let task_sender = (!handles.is_empty()).then_some(task_tx);

        Self {
            name: name.to_string(),
            task,
            task_sender,
            result_sender,
            result_receiver,
            worker_handles: handles,
            shut_down: false,
        }
    }

    /// Submits a job. Returns `false` only after [`shutdown`](Self::shutdown).
    pub fn submit(&self, tag: T, job: J) -> bool {
        match &self.task_sender {
            Some(sender) => sender.send((tag, job)).is_ok(),
            None if !self.shut_down => {
                let outcome = run_guarded(&self.task, job);
                let _ = self.result_sender.send((tag, outcome));
                true
            }
            None => false,
        }
    }

    /// Drains every completed result. Called once per frame.
    pub fn drain_results(&self) -> Vec<TaskResult<T, O>> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            results.push(result);
        }
        results
    }

    /// Number of live worker threads (0 in inline mode).
    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Stops accepting jobs and joins every worker.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
        tracing::debug!(pool = %self.name, "worker pool shut down");
    }
}

impl<T, J, O> Drop for WorkerPool<T, J, O> {
    fn drop(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}
