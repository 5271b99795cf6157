//! Concurrency orchestrator: one diff per candidate file, dispatched to a
//! bounded pool of OS workers with crash isolation and timeouts.

pub mod cancel;
pub mod pool;
pub mod types;

use std::sync::Arc;

pub use cancel::CancellationToken;
pub use pool::{PoolOptions, TaskRunner, WorkerPool};
pub use types::{AnalysisResult, AnalysisTask, TaskStatus};

use crate::config::ConfigResolver;
use crate::engine;
use crate::provider::ContentProvider;

/// Run the full per-file diff for every task against the injected provider.
pub fn analyze_files(
    tasks: Vec<AnalysisTask>,
    provider: Arc<dyn ContentProvider>,
    options: PoolOptions,
) -> Vec<AnalysisResult> {
    let runner: Arc<TaskRunner> = Arc::new(move |task: &AnalysisTask, _token: &CancellationToken| {
        let resolver = ConfigResolver::new((*task.config).clone());
        engine::detect_changes(
            provider.as_ref(),
            &task.file_path,
            &task.base_ref,
            &task.head_ref,
            &resolver,
        )
    });
    WorkerPool::new(runner, options).run(tasks)
}
