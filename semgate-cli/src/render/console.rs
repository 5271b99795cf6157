//! Human-readable console summary.

use semgate_core::Severity;

use super::GateReport;

pub fn render(report: &GateReport<'_>) -> String {
    let mut out = String::new();

    for file in &report.files {
        let result = file.result;
        if let Some(error) = &result.error {
            out.push_str(&format!("{}: ERROR - {}\n", result.file_path, error));
            continue;
        }
        if result.changes.is_empty() {
            continue;
        }

        let high = count(result, Severity::High);
        let medium = count(result, Severity::Medium);
        let low = count(result, Severity::Low);
        out.push_str(&format!(
            "{}: {} change(s) ({} high, {} medium, {} low){}\n",
            result.file_path,
            result.changes.len(),
            high,
            medium,
            low,
            if file.tests_required { " - tests required" } else { "" },
        ));
        for record in &result.changes {
            out.push_str(&format!(
                "  [{}] {}:{} {}\n",
                record.severity.name(),
                record.span.start.line + 1,
                record.span.start.column + 1,
                record.detail,
            ));
            if let Some(context) = &record.context {
                out.push_str(&format!("      {context}\n"));
            }
        }
    }

    out.push_str(&format!(
        "\n{} file(s) analyzed, {} with errors. Tests required: {}\n",
        report.files.len(),
        report.error_count,
        if report.tests_required { "yes" } else { "no" },
    ));
    out
}

fn count(result: &semgate_core::AnalysisResult, severity: Severity) -> usize {
    result.changes.iter().filter(|r| r.severity == severity).count()
}

#[cfg(test)]
mod tests {
    use super::super::FileReport;
    use super::*;
    use semgate_core::{AnalysisResult, ChangeKind, ChangeRecord, Span};

    #[test]
    fn summarizes_changes_and_gate_decision() {
        let result = AnalysisResult::success(
            "src/a.ts",
            vec![ChangeRecord::new(
                ChangeKind::SignatureChanged,
                "src/a.ts",
                Span::point(4, 2),
                "add",
                "signature of `add` changed",
            )],
        );
        let report = GateReport::new(vec![FileReport {
            result: &result,
            tests_required: true,
        }]);
        let text = render(&report);
        assert!(text.contains("src/a.ts: 1 change(s) (1 high, 0 medium, 0 low) - tests required"));
        assert!(text.contains("[high] 5:3 signature of `add` changed"));
        assert!(text.contains("Tests required: yes"));
    }

    #[test]
    fn errors_are_reported_per_file() {
        let result = AnalysisResult::error("src/b.ts", "analysis timed out after 5000ms");
        let report = GateReport::new(vec![FileReport {
            result: &result,
            tests_required: false,
        }]);
        let text = render(&report);
        assert!(text.contains("src/b.ts: ERROR - analysis timed out"));
        assert!(text.contains("1 with errors"));
    }
}
