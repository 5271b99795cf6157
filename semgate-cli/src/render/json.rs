//! JSON dump of the full result set and gate decision.

use serde::Serialize;
use semgate_core::AnalysisResult;

use super::GateReport;

#[derive(Serialize)]
struct JsonReport<'a> {
    tests_required: bool,
    error_count: usize,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    tests_required: bool,
}

pub fn render(report: &GateReport<'_>) -> String {
    let json = JsonReport {
        tests_required: report.tests_required,
        error_count: report.error_count,
        files: report
            .files
            .iter()
            .map(|f| JsonFile {
                result: f.result,
                tests_required: f.tests_required,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
}
