//! Promise-usage analyzer: awaits, chain steps, combinators. Losing an
//! `await` or a `.catch` changes runtime ordering or error handling, so
//! those removals rank high.

use rustc_hash::FxHashMap;

use crate::model::{PromiseOp, PromiseOpKind, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

pub struct PromiseUsageAnalyzer;

impl Analyzer for PromiseUsageAnalyzer {
    fn category(&self) -> Category {
        Category::Promises
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let mut head_pool: FxHashMap<(PromiseOpKind, &str), Vec<&PromiseOp>> =
            FxHashMap::default();
        for op in &head.promise_ops {
            head_pool.entry((op.kind, op.target.as_str())).or_default().push(op);
        }
        for bucket in head_pool.values_mut() {
            bucket.reverse();
        }

        let mut removed: Vec<&PromiseOp> = Vec::new();
        for b in &base.promise_ops {
            if head_pool
                .get_mut(&(b.kind, b.target.as_str()))
                .and_then(|v| v.pop())
                .is_none()
            {
                removed.push(b);
            }
        }
        let mut added: Vec<&PromiseOp> = head_pool.into_values().flatten().collect();
        added.sort_by_key(|op| op.span.start);

        // A combinator swap (Promise.all -> Promise.race) is one record, not
        // a removed+added pair.
        let (removed, added) = fold_combinator_swaps(removed, added, file, &mut records);

        for op in removed {
            records.push(removal_record(op, file));
        }
        for op in added {
            records.push(addition_record(op, file));
        }

        records
    }
}

type OpPools<'a> = (Vec<&'a PromiseOp>, Vec<&'a PromiseOp>);

fn fold_combinator_swaps<'a>(
    removed: Vec<&'a PromiseOp>,
    added: Vec<&'a PromiseOp>,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) -> OpPools<'a> {
    let mut added_pool: Vec<Option<&PromiseOp>> = added.into_iter().map(Some).collect();
    let mut still_removed = Vec::new();

    for b in removed {
        if b.kind != PromiseOpKind::Combinator {
            still_removed.push(b);
            continue;
        }
        let slot = added_pool.iter_mut().find(|s| {
            s.map(|h| h.kind == PromiseOpKind::Combinator && h.enclosing_function == b.enclosing_function)
                .unwrap_or(false)
        });
        match slot.and_then(|s| s.take()) {
            Some(h) => records.push(
                ChangeRecord::new(
                    ChangeKind::PromiseCombinatorChanged,
                    file,
                    h.span,
                    &h.target,
                    format!("`{}` changed to `{}`", b.target, h.target),
                )
                .with_context(format!("{} -> {}", b.target, h.target)),
            ),
            None => still_removed.push(b),
        }
    }

    (still_removed, added_pool.into_iter().flatten().collect())
}

fn removal_record(op: &PromiseOp, file: &str) -> ChangeRecord {
    let (kind, detail) = match op.kind {
        PromiseOpKind::Await => (
            ChangeKind::AwaitRemoved,
            format!("`await {}` removed", op.target),
        ),
        PromiseOpKind::Catch => (
            ChangeKind::PromiseCatchRemoved,
            format!("`.catch` removed from `{}`", op.target),
        ),
        PromiseOpKind::Combinator => (
            ChangeKind::PromiseCombinatorChanged,
            format!("`{}` removed", op.target),
        ),
        _ => (
            ChangeKind::PromiseChainChanged,
            format!("promise chain on `{}` changed", op.target),
        ),
    };
    ChangeRecord::new(kind, file, op.span, &op.target, detail)
}

fn addition_record(op: &PromiseOp, file: &str) -> ChangeRecord {
    let (kind, detail) = match op.kind {
        PromiseOpKind::Await => (
            ChangeKind::AwaitAdded,
            format!("`await {}` added", op.target),
        ),
        PromiseOpKind::Catch => (
            ChangeKind::PromiseCatchAdded,
            format!("`.catch` added on `{}`", op.target),
        ),
        PromiseOpKind::Combinator => (
            ChangeKind::PromiseCombinatorChanged,
            format!("`{}` added", op.target),
        ),
        _ => (
            ChangeKind::PromiseChainChanged,
            format!("promise chain on `{}` changed", op.target),
        ),
    };
    ChangeRecord::new(kind, file, op.span, &op.target, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "test.ts", Dialect::Plain);
        PromiseUsageAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn removed_await_is_high() {
        let records = diff(
            "async function f() { await save(data); }",
            "async function f() { save(data); }",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::AwaitRemoved);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn removed_catch_is_high_added_is_low() {
        let removed = diff("load().catch(log);", "load();");
        assert!(removed.iter().any(|r| r.kind == ChangeKind::PromiseCatchRemoved
            && r.severity == Severity::High));

        let added = diff("load();", "load().catch(log);");
        assert!(added.iter().any(|r| r.kind == ChangeKind::PromiseCatchAdded
            && r.severity == Severity::Low));
    }

    #[test]
    fn combinator_swap_is_one_record() {
        let records = diff(
            "async function f() { await Promise.all(tasks); }",
            "async function f() { await Promise.race(tasks); }",
        );
        let combinator: Vec<&ChangeRecord> = records
            .iter()
            .filter(|r| r.kind == ChangeKind::PromiseCombinatorChanged)
            .collect();
        assert_eq!(combinator.len(), 1);
        assert!(combinator[0].context.as_deref().unwrap().contains("Promise.all"));
    }

    #[test]
    fn unchanged_usage_is_invisible() {
        let src = "async function f() { const r = await fetch(u); return r.json(); }";
        assert!(diff(src, src).is_empty());
    }
}
