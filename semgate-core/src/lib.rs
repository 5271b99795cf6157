//! semgate-core: semantic-change differencing engine
//!
//! This crate answers "did this edit change what the program does" at a finer
//! grain than a textual diff:
//! - Model: structural extraction into a normalized `SourceModel`
//! - Analyzers: ~10 independent category diff functions
//! - Heuristics: matching/equivalence primitives shared by the analyzers
//! - Aggregate: dedup, fallback escalation, hunk scoping, ranking
//! - Hunks: unified-diff parsing for edit-region scoping
//! - Orchestrator: bounded worker pool with isolation and timeouts
//! - Config: effective severity/enablement and the tests-required decision
//! - Provider: injected content/patch retrieval (filesystem + git)

pub mod aggregate;
pub mod analyzers;
pub mod config;
pub mod engine;
pub mod errors;
pub mod heuristics;
pub mod hunks;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod records;

// Re-exports for convenience
pub use aggregate::aggregate;
pub use analyzers::{all_analyzers, Analyzer, AnalyzerParams};
pub use config::{AnalyzerConfig, ConfigResolver};
pub use engine::{detect_changes, diff_file};
pub use errors::TaskError;
pub use hunks::{parse_patch, DiffHunk};
pub use model::{
    CallSite, ClassShape, Dialect, FunctionSite, ImportSite, MarkupElement, MutationSite,
    PromiseOp, ScopeKind, SourceModel, TernarySite, TypeSite, VariableSite, Visibility,
};
pub use orchestrator::{
    analyze_files, AnalysisResult, AnalysisTask, CancellationToken, PoolOptions, TaskStatus,
    WorkerPool,
};
pub use provider::{ContentProvider, FsGitProvider, MapProvider, WORKING_REF};
pub use records::{Anchor, Category, ChangeKind, ChangeRecord, Position, Severity, Span};
