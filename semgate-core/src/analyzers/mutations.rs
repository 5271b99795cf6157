//! In-place mutation analyzer: bucket by target path + operator,
//! pop-on-match, leftovers become added/removed.

use rustc_hash::FxHashMap;

use crate::model::{MutationSite, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

pub struct MutationAnalyzer;

impl Analyzer for MutationAnalyzer {
    fn category(&self) -> Category {
        Category::Mutations
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let mut head_pool: FxHashMap<String, Vec<&MutationSite>> = FxHashMap::default();
        for site in &head.mutations {
            head_pool.entry(site.identity()).or_default().push(site);
        }
        for bucket in head_pool.values_mut() {
            bucket.reverse();
        }

        for b in &base.mutations {
            if head_pool.get_mut(&b.identity()).and_then(|v| v.pop()).is_none() {
                records.push(ChangeRecord::new(
                    ChangeKind::MutationRemoved,
                    file,
                    b.span,
                    &b.target,
                    format!("mutation `{}` removed", b.identity()),
                ));
            }
        }

        for bucket in head_pool.values() {
            for h in bucket {
                records.push(ChangeRecord::new(
                    ChangeKind::MutationAdded,
                    file,
                    h.span,
                    &h.target,
                    format!("mutation `{}` added", h.identity()),
                ));
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "test.ts", Dialect::Plain);
        MutationAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn unchanged_mutations_are_invisible() {
        let src = "state.count += 1; items.push(x);";
        assert!(diff(src, src).is_empty());
    }

    #[test]
    fn new_mutation_is_medium() {
        let records = diff("render();", "render(); cache.set(key, value);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::MutationAdded);
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn removed_mutation_is_low() {
        let records = diff("list.sort();", "");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::MutationRemoved);
        assert_eq!(records[0].severity, Severity::Low);
    }

    #[test]
    fn operator_change_reports_both_sides() {
        let records = diff("obj.n = 1;", "obj.n += 1;");
        let kinds: Vec<ChangeKind> = records.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&ChangeKind::MutationRemoved));
        assert!(kinds.contains(&ChangeKind::MutationAdded));
    }
}
