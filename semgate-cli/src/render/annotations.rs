//! CI inline annotations in the workflow-command format.

use semgate_core::Severity;

use super::GateReport;

pub fn render(report: &GateReport<'_>) -> String {
    let mut out = String::new();
    for file in &report.files {
        let result = file.result;
        if let Some(error) = &result.error {
            out.push_str(&format!(
                "::error file={}::{}\n",
                result.file_path,
                escape(error)
            ));
            continue;
        }
        for record in &result.changes {
            let level = match record.severity {
                Severity::High => "error",
                Severity::Medium => "warning",
                Severity::Low => "notice",
            };
            out.push_str(&format!(
                "::{level} file={},line={}::{}\n",
                result.file_path,
                record.span.start.line + 1,
                escape(&record.detail),
            ));
        }
    }
    out
}

/// Workflow commands treat `%`, `\r` and `\n` as terminators.
fn escape(text: &str) -> String {
    text.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::super::{FileReport, GateReport};
    use super::*;
    use semgate_core::{AnalysisResult, ChangeKind, ChangeRecord, Span};

    #[test]
    fn maps_severity_to_annotation_level() {
        let result = AnalysisResult::success(
            "src/a.ts",
            vec![
                ChangeRecord::new(ChangeKind::SignatureChanged, "src/a.ts", Span::point(3, 0), "f", "signature of `f` changed"),
                ChangeRecord::new(ChangeKind::TypeAdded, "src/a.ts", Span::point(9, 0), "T", "type `T` added"),
            ],
        );
        let report = GateReport::new(vec![FileReport {
            result: &result,
            tests_required: true,
        }]);
        let text = render(&report);
        assert!(text.contains("::error file=src/a.ts,line=4::signature of `f` changed"));
        assert!(text.contains("::notice file=src/a.ts,line=10::type `T` added"));
    }

    #[test]
    fn newlines_in_messages_are_escaped() {
        let result = AnalysisResult::error("src/b.ts", "line one\nline two");
        let report = GateReport::new(vec![FileReport {
            result: &result,
            tests_required: false,
        }]);
        assert!(render(&report).contains("line one%0Aline two"));
    }
}
