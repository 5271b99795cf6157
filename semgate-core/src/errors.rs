//! Error types. Most failure paths in the engine degrade instead of
//! erroring; these cover the file-scoped failures the orchestrator reports.

/// Failures surfaced by the orchestrator as file-scoped results.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("worker crashed: {message}")]
    WorkerCrashed { message: String },

    #[error("worker pool shut down before the task completed")]
    PoolShutDown,

    #[error("cancelled before start")]
    Cancelled,
}
