//! Result rendering: pure functions of the aggregated results.

pub mod annotations;
pub mod console;
pub mod json;
pub mod machine;

use semgate_core::AnalysisResult;

/// One file's outcome plus the gate decision for it.
pub struct FileReport<'a> {
    pub result: &'a AnalysisResult,
    pub tests_required: bool,
}

/// The whole run's outcome.
pub struct GateReport<'a> {
    pub files: Vec<FileReport<'a>>,
    pub tests_required: bool,
    pub error_count: usize,
}

impl<'a> GateReport<'a> {
    pub fn new(files: Vec<FileReport<'a>>) -> Self {
        let tests_required = files.iter().any(|f| f.tests_required);
        let error_count = files
            .iter()
            .filter(|f| f.result.status == semgate_core::TaskStatus::Error)
            .count();
        Self {
            files,
            tests_required,
            error_count,
        }
    }
}
