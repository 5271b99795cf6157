//! Bounded worker pool: a crossbeam task queue feeding OS threads, with a
//! uniform success/error envelope, per-task cancellation tokens, and an
//! optional per-task timeout.
//!
//! Rust threads cannot be force-killed, so a timed-out task is abandoned: its
//! token is cancelled, its eventual late result is discarded, and a
//! replacement worker is spawned to restore pool capacity. Observable
//! semantics match hard termination: a file-scoped timeout error, siblings
//! unaffected.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::cancel::CancellationToken;
use super::types::{AnalysisResult, AnalysisTask};
use crate::errors::TaskError;
use crate::records::ChangeRecord;

/// Supervisor poll interval while waiting for results.
const TICK: Duration = Duration::from_millis(25);

/// Pool sizing and timeout options.
#[derive(Debug, Clone, Default)]
pub struct PoolOptions {
    /// Worker count; `None` means the logical CPU count.
    pub workers: Option<usize>,
    /// Per-task timeout; `None` disables the deadline check.
    pub task_timeout: Option<Duration>,
}

impl PoolOptions {
    fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        })
    }
}

/// The function a worker runs for each task. Kept generic so tests can
/// substitute a hostile runner (hangs, panics) for the real engine.
pub type TaskRunner =
    dyn Fn(&AnalysisTask, &CancellationToken) -> Vec<ChangeRecord> + Send + Sync;

enum Msg {
    Started { id: usize },
    Finished { id: usize, outcome: Result<Vec<ChangeRecord>, String> },
}

struct QueuedTask {
    id: usize,
    task: AnalysisTask,
    token: CancellationToken,
}

/// Bounded pool of OS-level workers running one diff per candidate file.
pub struct WorkerPool {
    runner: Arc<TaskRunner>,
    options: PoolOptions,
}

impl WorkerPool {
    pub fn new(runner: Arc<TaskRunner>, options: PoolOptions) -> Self {
        Self { runner, options }
    }

    /// Run every task to completion. Results come back keyed by file path,
    /// in task submission order; completion order never leaks into output
    /// order. No task's failure aborts the batch.
    pub fn run(&self, tasks: Vec<AnalysisTask>) -> Vec<AnalysisResult> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let (task_tx, task_rx) = unbounded::<QueuedTask>();
        let (msg_tx, msg_rx) = unbounded::<Msg>();

        let worker_count = self.options.effective_workers().max(1).min(tasks.len());
        for _ in 0..worker_count {
            spawn_worker(self.runner.clone(), task_rx.clone(), msg_tx.clone());
        }

        let mut slots: Vec<Option<AnalysisResult>> = Vec::with_capacity(tasks.len());
        let mut pending: FxHashMap<usize, Pending> = FxHashMap::default();
        for (id, task) in tasks.into_iter().enumerate() {
            let token = CancellationToken::new();
            pending.insert(
                id,
                Pending {
                    file_path: task.file_path.clone(),
                    token: token.clone(),
                    started_at: None,
                },
            );
            slots.push(None);
            // Send cannot fail while this scope holds a receiver clone.
            let _ = task_tx.send(QueuedTask { id, task, token });
        }

        self.supervise(&mut slots, &mut pending, &msg_rx, &task_rx, &msg_tx);

        // Dropping the last sender lets idle workers drain and exit.
        drop(task_tx);

        slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.unwrap_or_else(|| AnalysisResult::error(format!("task-{id}"), "result missing"))
            })
            .collect()
    }

    fn supervise(
        &self,
        slots: &mut [Option<AnalysisResult>],
        pending: &mut FxHashMap<usize, Pending>,
        msg_rx: &Receiver<Msg>,
        task_rx: &Receiver<QueuedTask>,
        msg_tx: &Sender<Msg>,
    ) {
        while !pending.is_empty() {
            match msg_rx.recv_timeout(TICK) {
                Ok(Msg::Started { id }) => {
                    if let Some(entry) = pending.get_mut(&id) {
                        entry.started_at = Some(Instant::now());
                    }
                }
                Ok(Msg::Finished { id, outcome }) => {
                    let Some(entry) = pending.remove(&id) else {
                        // Late result from an abandoned worker.
                        debug!(id, "discarding result of abandoned task");
                        continue;
                    };
                    slots[id] = Some(match outcome {
                        Ok(changes) => AnalysisResult::success(entry.file_path, changes),
                        Err(message) => AnalysisResult::error(entry.file_path, message),
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.expire_overdue(slots, pending, task_rx, msg_tx);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Every worker died; fail whatever is left.
                    for (id, entry) in pending.drain() {
                        slots[id] = Some(AnalysisResult::error(
                            entry.file_path,
                            TaskError::PoolShutDown.to_string(),
                        ));
                    }
                }
            }
        }
    }

    fn expire_overdue(
        &self,
        slots: &mut [Option<AnalysisResult>],
        pending: &mut FxHashMap<usize, Pending>,
        task_rx: &Receiver<QueuedTask>,
        msg_tx: &Sender<Msg>,
    ) {
        let Some(timeout) = self.options.task_timeout else {
            return;
        };
        let expired: Vec<usize> = pending
            .iter()
            .filter(|(_, entry)| {
                entry
                    .started_at
                    .is_some_and(|started| started.elapsed() >= timeout)
            })
            .map(|(&id, _)| id)
            .collect();

        for id in expired {
            let Some(entry) = pending.remove(&id) else {
                continue;
            };
            warn!(file = %entry.file_path, timeout_ms = timeout.as_millis() as u64, "task timed out");
            entry.token.cancel();
            slots[id] = Some(AnalysisResult::error(
                entry.file_path,
                TaskError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
                .to_string(),
            ));
            // The stuck worker is abandoned; restore pool capacity.
            spawn_worker(self.runner.clone(), task_rx.clone(), msg_tx.clone());
        }
    }
}

struct Pending {
    file_path: String,
    token: CancellationToken,
    started_at: Option<Instant>,
}

fn spawn_worker(runner: Arc<TaskRunner>, task_rx: Receiver<QueuedTask>, msg_tx: Sender<Msg>) {
    thread::spawn(move || {
        while let Ok(queued) = task_rx.recv() {
            if queued.token.is_cancelled() {
                let _ = msg_tx.send(Msg::Finished {
                    id: queued.id,
                    outcome: Err(TaskError::Cancelled.to_string()),
                });
                continue;
            }
            let _ = msg_tx.send(Msg::Started { id: queued.id });
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (runner)(&queued.task, &queued.token)
            }))
            .map_err(panic_message);
            let _ = msg_tx.send(Msg::Finished {
                id: queued.id,
                outcome,
            });
        }
    });
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    TaskError::WorkerCrashed { message }.to_string()
}
