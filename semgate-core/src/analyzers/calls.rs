//! Call-site analyzer: pairing cascade, argument checks, constructor flips,
//! tagged templates, and hook-pattern dependency lists.

use globset::GlobSet;

use crate::heuristics::pairing::pair_by_unique_key;
use crate::heuristics::paths::suffix_path;
use crate::heuristics::sets::multiset_equal;
use crate::model::{CallSite, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord, Severity};

use super::{Analyzer, AnalyzerParams};

pub struct CallSiteAnalyzer;

impl Analyzer for CallSiteAnalyzer {
    fn category(&self) -> Category {
        Category::Calls
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let (pairs, removed, added) =
            claim_cascade(base.calls.iter().collect(), head.calls.iter().collect());

        for (b, h) in &pairs {
            compare_pair(b, h, base, head, file, &mut records);
        }

        for call in removed {
            let mut record = ChangeRecord::new(
                ChangeKind::CallRemoved,
                file,
                call.span,
                &call.path,
                format!("call to `{}` removed", call.path),
            );
            if matches_side_effect(params.side_effect_callees, call) {
                record = record.with_severity(Severity::High);
            }
            records.push(record);
        }
        for call in added {
            records.push(ChangeRecord::new(
                ChangeKind::CallAdded,
                file,
                call.span,
                &call.path,
                format!("call to `{}` added", call.path),
            ));
        }

        records
    }
}

type CallPools<'a> = (
    Vec<(&'a CallSite, &'a CallSite)>,
    Vec<&'a CallSite>,
    Vec<&'a CallSite>,
);

/// Three pairing passes, each claiming from the remainder of the previous
/// one: unique raw callee text, unique canonical path (folds `?.` and
/// bracket access), then suffix path with identical argument lists
/// (tolerates a renamed receiver).
fn claim_cascade<'a>(base: Vec<&'a CallSite>, head: Vec<&'a CallSite>) -> CallPools<'a> {
    let mut pairs = Vec::new();

    let pass1 = pair_by_unique_key(base, head, |c: &&CallSite| c.callee_text.clone());
    pairs.extend(pass1.pairs);

    let pass2 = pair_by_unique_key(pass1.remaining_base, pass1.remaining_head, |c: &&CallSite| {
        c.path.clone()
    });
    pairs.extend(pass2.pairs);

    let (base_suffixed, base_rest): (Vec<_>, Vec<_>) = pass2
        .remaining_base
        .into_iter()
        .partition(|c| suffix_path(&c.path).is_some());
    let (head_suffixed, head_rest): (Vec<_>, Vec<_>) = pass2
        .remaining_head
        .into_iter()
        .partition(|c| suffix_path(&c.path).is_some());

    let pass3 = pair_by_unique_key(base_suffixed, head_suffixed, |c: &&CallSite| {
        (suffix_path(&c.path).unwrap_or_default().to_string(), c.args.join("\u{1}"))
    });
    pairs.extend(pass3.pairs);

    let mut removed = pass3.remaining_base;
    removed.extend(base_rest);
    let mut added = pass3.remaining_head;
    added.extend(head_rest);

    (pairs, removed, added)
}

fn compare_pair(
    b: &CallSite,
    h: &CallSite,
    base: &SourceModel,
    head: &SourceModel,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    if b.is_new != h.is_new {
        records.push(ChangeRecord::new(
            ChangeKind::ConstructorCallFlip,
            file,
            h.span,
            &h.path,
            if h.is_new {
                format!("`{}` changed from plain call to constructor", h.path)
            } else {
                format!("`{}` changed from constructor to plain call", h.path)
            },
        ));
    }

    if b.template_text != h.template_text && (b.template_text.is_some() || h.template_text.is_some())
    {
        records.push(
            ChangeRecord::new(
                ChangeKind::TaggedTemplateChanged,
                file,
                h.span,
                &h.path,
                format!("tagged template content of `{}` changed", h.path),
            )
            .with_context(format!(
                "{} -> {}",
                b.template_text.as_deref().unwrap_or("(none)"),
                h.template_text.as_deref().unwrap_or("(none)")
            )),
        );
    }

    compare_arguments(b, h, file, records);

    if h.is_hook_call() || b.is_hook_call() {
        compare_dependency_lists(b, h, base, head, file, records);
    }
}

fn compare_arguments(b: &CallSite, h: &CallSite, file: &str, records: &mut Vec<ChangeRecord>) {
    if b.args.len() == h.args.len() {
        if b.args != h.args && multiset_equal(&b.args, &h.args) {
            records.push(
                ChangeRecord::new(
                    ChangeKind::ArgumentOrderChanged,
                    file,
                    h.span,
                    &h.path,
                    format!("argument order of `{}` changed", h.path),
                )
                .with_context(format!("({}) -> ({})", b.args.join(", "), h.args.join(", "))),
            );
        }
        return;
    }

    if h.args.len() < b.args.len() {
        // Dropping a trailing run of literal undefined is a runtime no-op.
        if is_trailing_undefined_removal(&b.args, &h.args) {
            return;
        }
        records.push(
            ChangeRecord::new(
                ChangeKind::ArgumentsRemoved,
                file,
                h.span,
                &h.path,
                format!(
                    "`{}` lost {} argument(s)",
                    h.path,
                    b.args.len() - h.args.len()
                ),
            )
            .with_context(format!("({}) -> ({})", b.args.join(", "), h.args.join(", "))),
        );
    } else {
        records.push(
            ChangeRecord::new(
                ChangeKind::ArgumentsAdded,
                file,
                h.span,
                &h.path,
                format!(
                    "`{}` gained {} argument(s)",
                    h.path,
                    h.args.len() - b.args.len()
                ),
            )
            .with_context(format!("({}) -> ({})", b.args.join(", "), h.args.join(", "))),
        );
    }
}

fn is_trailing_undefined_removal(base_args: &[String], head_args: &[String]) -> bool {
    base_args[..head_args.len()] == *head_args
        && base_args[head_args.len()..]
            .iter()
            .all(|a| a == "undefined" || a == "void 0")
}

fn compare_dependency_lists(
    b: &CallSite,
    h: &CallSite,
    base: &SourceModel,
    head: &SourceModel,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    let base_deps = base.resolve_dependency_list(b);
    let head_deps = head.resolve_dependency_list(h);
    if base_deps == head_deps {
        return;
    }
    records.push(
        ChangeRecord::new(
            ChangeKind::HookDepsChanged,
            file,
            h.span,
            &h.path,
            format!("dependency list of `{}` changed", h.path),
        )
        .with_context(format!(
            "[{}] -> [{}]",
            base_deps.map(|d| d.join(", ")).unwrap_or_else(|| "(none)".into()),
            head_deps.map(|d| d.join(", ")).unwrap_or_else(|| "(none)".into()),
        )),
    );
}

fn matches_side_effect(patterns: Option<&GlobSet>, call: &CallSite) -> bool {
    patterns.is_some_and(|set| set.is_match(&call.path) || set.is_match(&call.callee_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "test.ts", Dialect::Plain);
        CallSiteAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn optional_chaining_rewrite_is_invisible() {
        let records = diff("obj?.m(1);", "obj.m?.(1);");
        assert!(records.is_empty());
    }

    #[test]
    fn bracket_access_rewrite_is_invisible() {
        let records = diff("api[\"send\"](x);", "api.send(x);");
        assert!(records.is_empty());
    }

    #[test]
    fn renamed_receiver_with_same_args_is_invisible() {
        let records = diff("client.request(url, opts);", "httpClient.request(url, opts);");
        assert!(records.is_empty());
    }

    #[test]
    fn constructor_flip_is_high() {
        let records = diff("const d = Factory(x);", "const d = new Factory(x);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::ConstructorCallFlip);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn reordered_arguments_are_low() {
        let records = diff("f(a, b);", "f(b, a);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::ArgumentOrderChanged);
        assert_eq!(records[0].severity, Severity::Low);
    }

    #[test]
    fn trailing_undefined_removal_is_invisible() {
        assert!(diff("f(a, undefined, undefined);", "f(a);").is_empty());
        assert!(diff("f(a, void 0);", "f(a);").is_empty());
    }

    #[test]
    fn non_trailing_argument_removal_is_high() {
        let records = diff("f(a, b);", "f(a);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::ArgumentsRemoved);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn added_argument_is_medium() {
        let records = diff("f(a);", "f(a, b);");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::ArgumentsAdded);
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn unpaired_calls_report_removed_and_added() {
        let records = diff("alpha(1);", "beta(1);");
        let kinds: Vec<ChangeKind> = records.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&ChangeKind::CallRemoved));
        assert!(kinds.contains(&ChangeKind::CallAdded));
    }

    #[test]
    fn side_effect_callee_removal_is_elevated() {
        use globset::{Glob, GlobSetBuilder};
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("*.write").unwrap());
        let set = builder.build().unwrap();

        let b = SourceModel::extract("db.write(row);", "test.ts", Dialect::Plain);
        let h = SourceModel::extract("", "test.ts", Dialect::Plain);
        let params = AnalyzerParams {
            side_effect_callees: Some(&set),
        };
        let records = CallSiteAnalyzer.diff(&b, &h, &params);
        assert_eq!(records[0].kind, ChangeKind::CallRemoved);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn inline_dependency_array_change_is_high() {
        let records = diff(
            "function C() { useEffect(() => {}, [a, b]); }",
            "function C() { useEffect(() => {}, [a]); }",
        );
        assert!(records.iter().any(|r| r.kind == ChangeKind::HookDepsChanged
            && r.severity == Severity::High));
    }

    #[test]
    fn shadowed_dependency_variable_resolves_to_inner_declaration() {
        let base = r#"
const deps = [outerA];
function C() {
    const deps = [innerA];
    useEffect(cb, deps);
}
"#;
        // Only the outer declaration changes: resolved lists are identical.
        let head = r#"
const deps = [outerB];
function C() {
    const deps = [innerA];
    useEffect(cb, deps);
}
"#;
        assert!(diff(base, head).is_empty());

        // The inner declaration changes: the resolved list differs.
        let head_inner = r#"
const deps = [outerA];
function C() {
    const deps = [innerB];
    useEffect(cb, deps);
}
"#;
        let records = diff(base, head_inner);
        assert!(records.iter().any(|r| r.kind == ChangeKind::HookDepsChanged));
    }
}
