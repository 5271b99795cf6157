//! Task and result schema at the orchestrator boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::records::ChangeRecord;

/// One unit of work: diff one file between two refs under one configuration.
#[derive(Clone)]
pub struct AnalysisTask {
    pub file_path: String,
    pub base_ref: String,
    pub head_ref: String,
    /// Immutable configuration copy; workers never share mutable state.
    pub config: Arc<AnalyzerConfig>,
}

/// Terminal status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

/// Per-file result, keyed back to the file by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub status: TaskStatus,
    pub changes: Vec<ChangeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn success(file_path: impl Into<String>, changes: Vec<ChangeRecord>) -> Self {
        Self {
            file_path: file_path.into(),
            status: TaskStatus::Success,
            changes,
            error: None,
        }
    }

    pub fn error(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            status: TaskStatus::Error,
            changes: Vec::new(),
            error: Some(message.into()),
        }
    }
}
