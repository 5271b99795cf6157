//! Hook-usage analyzer: per enclosing function, the ordered hook-call
//! sequence. Order matters for hook-pattern calls, so a same-multiset
//! reordering is high severity.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::heuristics::sets::multiset_equal;
use crate::model::{CallSite, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord, Span};

use super::{Analyzer, AnalyzerParams};

pub struct HookUsageAnalyzer;

impl Analyzer for HookUsageAnalyzer {
    fn category(&self) -> Category {
        Category::Hooks
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let base_seqs = hook_sequences(base);
        let head_seqs = hook_sequences(head);

        let mut functions: FxHashSet<&str> = base_seqs.keys().copied().collect();
        functions.extend(head_seqs.keys().copied());
        let mut functions: Vec<&str> = functions.into_iter().collect();
        functions.sort_unstable();

        for function in functions {
            let empty = Vec::new();
            let b = base_seqs.get(function).unwrap_or(&empty);
            let h = head_seqs.get(function).unwrap_or(&empty);
            compare_sequences(b, h, function, file, &mut records);
        }

        records
    }
}

fn hook_name(call: &CallSite) -> &str {
    call.path.rsplit('.').next().unwrap_or(&call.path)
}

fn hook_sequences(model: &SourceModel) -> FxHashMap<&str, Vec<&CallSite>> {
    let mut seqs: FxHashMap<&str, Vec<&CallSite>> = FxHashMap::default();
    for call in model.calls.iter().filter(|c| c.is_hook_call()) {
        seqs.entry(call.enclosing_function.as_str()).or_default().push(call);
    }
    for seq in seqs.values_mut() {
        seq.sort_by_key(|c| (c.span.start, c.byte));
    }
    seqs
}

fn compare_sequences(
    b: &[&CallSite],
    h: &[&CallSite],
    function: &str,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    let base_names: Vec<&str> = b.iter().map(|c| hook_name(c)).collect();
    let head_names: Vec<&str> = h.iter().map(|c| hook_name(c)).collect();

    if base_names == head_names {
        // Positionally paired: report argument drift, leaving dependency
        // lists to the call-site analyzer.
        for (bc, hc) in b.iter().zip(h.iter()) {
            if args_without_deps(bc) != args_without_deps(hc) {
                records.push(
                    ChangeRecord::new(
                        ChangeKind::HookArgsChanged,
                        file,
                        hc.span,
                        hook_name(hc),
                        format!("arguments of `{}` in `{function}` changed", hook_name(hc)),
                    )
                    .with_context(format!(
                        "({}) -> ({})",
                        bc.args.join(", "),
                        hc.args.join(", ")
                    )),
                );
            }
        }
        return;
    }

    if multiset_equal(&base_names, &head_names) {
        let span = first_difference_span(&base_names, h).unwrap_or_default();
        records.push(
            ChangeRecord::new(
                ChangeKind::HookOrderChanged,
                file,
                span,
                function,
                format!("hook order in `{function}` changed"),
            )
            .with_context(format!(
                "[{}] -> [{}]",
                base_names.join(", "),
                head_names.join(", ")
            )),
        );
        return;
    }

    // Membership changed: leftover multiset difference each way.
    let mut head_pool: Vec<Option<&str>> = head_names.iter().copied().map(Some).collect();
    for (bc, name) in b.iter().zip(base_names.iter()) {
        let slot = head_pool.iter_mut().find(|s| **s == Some(*name));
        match slot {
            Some(slot) => *slot = None,
            None => records.push(ChangeRecord::new(
                ChangeKind::HookRemoved,
                file,
                bc.span,
                *name,
                format!("hook `{name}` removed from `{function}`"),
            )),
        }
    }
    for (hc, slot) in h.iter().zip(head_pool.iter()) {
        if let Some(name) = slot {
            records.push(ChangeRecord::new(
                ChangeKind::HookAdded,
                file,
                hc.span,
                *name,
                format!("hook `{name}` added to `{function}`"),
            ));
        }
    }
}

/// The argument list with a trailing array literal (a dependency list)
/// excluded, so dependency edits are not double-reported here.
fn args_without_deps(call: &CallSite) -> &[String] {
    match call.args.last() {
        Some(last) if last.starts_with('[') => &call.args[..call.args.len() - 1],
        _ => &call.args,
    }
}

fn first_difference_span(base_names: &[&str], h: &[&CallSite]) -> Option<Span> {
    for (i, hc) in h.iter().enumerate() {
        if base_names.get(i) != Some(&hook_name(hc)) {
            return Some(hc.span);
        }
    }
    h.last().map(|c| c.span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.tsx", Dialect::Markup);
        let h = SourceModel::extract(head, "test.tsx", Dialect::Markup);
        HookUsageAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn unchanged_hooks_are_invisible() {
        let src = "function C() { const [s, setS] = useState(0); useEffect(fn, [s]); }";
        assert!(diff(src, src).is_empty());
    }

    #[test]
    fn reordered_hooks_are_high() {
        let records = diff(
            "function C() { useState(0); useRef(null); }",
            "function C() { useRef(null); useState(0); }",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::HookOrderChanged);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn removed_hook_is_high_added_is_medium() {
        let records = diff(
            "function C() { useState(0); useMemo(calc, []); }",
            "function C() { useState(0); useCallback(cb, []); }",
        );
        let removed = records.iter().find(|r| r.kind == ChangeKind::HookRemoved).unwrap();
        let added = records.iter().find(|r| r.kind == ChangeKind::HookAdded).unwrap();
        assert_eq!(removed.severity, Severity::High);
        assert_eq!(added.severity, Severity::Medium);
    }

    #[test]
    fn initial_state_change_is_args_changed() {
        let records = diff(
            "function C() { const [n] = useState(0); }",
            "function C() { const [n] = useState(10); }",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::HookArgsChanged);
    }

    #[test]
    fn dependency_list_edits_are_left_to_the_call_analyzer() {
        let records = diff(
            "function C() { useEffect(fn, [a]); }",
            "function C() { useEffect(fn, [a, b]); }",
        );
        assert!(records.is_empty());
    }
}
