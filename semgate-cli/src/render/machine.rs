//! Colon-delimited machine lines: `file:line:col:severity:kind:detail`.

use super::GateReport;

pub fn render(report: &GateReport<'_>) -> String {
    let mut out = String::new();
    for file in &report.files {
        let result = file.result;
        if let Some(error) = &result.error {
            out.push_str(&format!("{}:0:0:error:task-error:{}\n", result.file_path, error));
            continue;
        }
        for record in &result.changes {
            out.push_str(&format!(
                "{}:{}:{}:{}:{}:{}\n",
                result.file_path,
                record.span.start.line + 1,
                record.span.start.column + 1,
                record.severity.name(),
                record.kind.name(),
                record.detail,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::{FileReport, GateReport};
    use super::*;
    use semgate_core::{AnalysisResult, ChangeKind, ChangeRecord, Span};

    #[test]
    fn one_line_per_record() {
        let result = AnalysisResult::success(
            "src/a.ts",
            vec![
                ChangeRecord::new(ChangeKind::CallAdded, "src/a.ts", Span::point(7, 4), "f", "call to `f` added"),
                ChangeRecord::new(ChangeKind::TypeAdded, "src/a.ts", Span::point(1, 0), "T", "type `T` added"),
            ],
        );
        let report = GateReport::new(vec![FileReport {
            result: &result,
            tests_required: false,
        }]);
        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "src/a.ts:8:5:medium:call-added:call to `f` added");
    }
}
