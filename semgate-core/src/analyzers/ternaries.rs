//! Ternary analyzer: conditionals bucketed by normalized condition text,
//! with a dedicated high-severity kind for swapped branches.

use rustc_hash::FxHashMap;

use crate::model::{SourceModel, TernarySite};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

pub struct TernaryAnalyzer;

impl Analyzer for TernaryAnalyzer {
    fn category(&self) -> Category {
        Category::Ternaries
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let mut head_pool: FxHashMap<&str, Vec<&TernarySite>> = FxHashMap::default();
        for t in &head.ternaries {
            head_pool.entry(t.condition.as_str()).or_default().push(t);
        }
        for bucket in head_pool.values_mut() {
            bucket.reverse();
        }

        let mut leftover_base: Vec<&TernarySite> = Vec::new();
        for b in &base.ternaries {
            match head_pool.get_mut(b.condition.as_str()).and_then(|v| v.pop()) {
                Some(h) => compare_branches(b, h, file, &mut records),
                None => leftover_base.push(b),
            }
        }
        let mut leftover_head: Vec<&TernarySite> =
            head_pool.into_values().flatten().collect();
        leftover_head.sort_by_key(|t| t.span.start);

        // Same-line leftovers are the same conditional with an edited
        // condition, not a removal plus an addition.
        let mut head_slots: Vec<Option<&TernarySite>> =
            leftover_head.into_iter().map(Some).collect();
        for b in leftover_base {
            let slot = head_slots.iter_mut().find(|s| {
                s.map(|h| h.span.start.line == b.span.start.line).unwrap_or(false)
            });
            match slot.and_then(|s| s.take()) {
                Some(h) => records.push(
                    ChangeRecord::new(
                        ChangeKind::TernaryConditionChanged,
                        file,
                        h.span,
                        &h.condition,
                        "ternary condition changed".to_string(),
                    )
                    .with_context(format!("{} -> {}", b.condition, h.condition)),
                ),
                None => records.push(ChangeRecord::new(
                    ChangeKind::TernaryRemoved,
                    file,
                    b.span,
                    &b.condition,
                    format!("ternary on `{}` removed", b.condition),
                )),
            }
        }
        for h in head_slots.into_iter().flatten() {
            records.push(ChangeRecord::new(
                ChangeKind::TernaryAdded,
                file,
                h.span,
                &h.condition,
                format!("ternary on `{}` added", h.condition),
            ));
        }

        records
    }
}

fn compare_branches(
    b: &TernarySite,
    h: &TernarySite,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    if b.consequence == h.consequence && b.alternative == h.alternative {
        return;
    }
    if b.consequence == h.alternative && b.alternative == h.consequence {
        records.push(
            ChangeRecord::new(
                ChangeKind::TernaryBranchesSwapped,
                file,
                h.span,
                &h.condition,
                format!("ternary branches on `{}` swapped", h.condition),
            )
            .with_context(format!(
                "{} ? {} : {} -> {} ? {} : {}",
                b.condition, b.consequence, b.alternative, h.condition, h.consequence, h.alternative
            )),
        );
        return;
    }
    records.push(
        ChangeRecord::new(
            ChangeKind::TernaryBranchChanged,
            file,
            h.span,
            &h.condition,
            format!("ternary branch on `{}` changed", h.condition),
        )
        .with_context(format!(
            "{} : {} -> {} : {}",
            b.consequence, b.alternative, h.consequence, h.alternative
        )),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "test.ts", Dialect::Plain);
        TernaryAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn swapped_branches_are_high() {
        let records = diff(
            "const v = ok ? accept() : reject();",
            "const v = ok ? reject() : accept();",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::TernaryBranchesSwapped);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn edited_branch_is_medium() {
        let records = diff(
            "const v = ok ? a : b;",
            "const v = ok ? a : c;",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::TernaryBranchChanged);
    }

    #[test]
    fn condition_edit_on_same_line_is_one_record() {
        let records = diff(
            "const v = isReady ? a : b;",
            "const v = isReady && isValid ? a : b;",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::TernaryConditionChanged);
    }

    #[test]
    fn new_ternary_is_reported() {
        let records = diff("const v = a;", "const v = flag ? a : b;");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::TernaryAdded);
    }
}
