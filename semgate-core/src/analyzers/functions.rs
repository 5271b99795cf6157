//! Function surface analyzer: removals, additions, signature and generic
//! changes, destructured-key changes, and rename inference.

use crate::heuristics::pairing::pair_by_unique_key;
use crate::heuristics::similarity::similarity_ratio;
use crate::model::normalize::canonical_type;
use crate::model::{FunctionSite, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

/// Body similarity above which a removed+added pair is treated as a rename.
const RENAME_SIMILARITY: f64 = 0.7;

pub struct FunctionSurfaceAnalyzer;

impl Analyzer for FunctionSurfaceAnalyzer {
    fn category(&self) -> Category {
        Category::Functions
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let paired = pair_by_unique_key(
            base.functions.iter().collect(),
            head.functions.iter().collect(),
            |f: &&FunctionSite| f.identity_key(),
        );

        // Duplicate identity keys (overloads) pair positionally so they do
        // not surface as spurious removed+added noise.
        let (pairs, removed, added) =
            pair_duplicates(paired.pairs, paired.remaining_base, paired.remaining_head);

        for (b, h) in &pairs {
            compare_pair(b, h, file, &mut records);
        }

        if removed.len() == 1 && added.len() == 1 {
            records.extend(infer_rename(removed[0], added[0], file));
        } else {
            for f in removed {
                records.push(ChangeRecord::new(
                    ChangeKind::FunctionRemoved,
                    file,
                    f.span,
                    &f.name,
                    format!("function `{}` removed", f.name),
                ));
            }
            for f in added {
                records.push(ChangeRecord::new(
                    ChangeKind::FunctionAdded,
                    file,
                    f.span,
                    &f.name,
                    format!("function `{}` added", f.name),
                ));
            }
        }

        records
    }
}

type Pools<'a> = (
    Vec<(&'a FunctionSite, &'a FunctionSite)>,
    Vec<&'a FunctionSite>,
    Vec<&'a FunctionSite>,
);

fn pair_duplicates<'a>(
    mut pairs: Vec<(&'a FunctionSite, &'a FunctionSite)>,
    remaining_base: Vec<&'a FunctionSite>,
    remaining_head: Vec<&'a FunctionSite>,
) -> Pools<'a> {
    let mut removed = Vec::new();
    let mut head_pool: Vec<Option<&FunctionSite>> = remaining_head.into_iter().map(Some).collect();

    for b in remaining_base {
        let slot = head_pool.iter_mut().find(|h| {
            h.map(|h| h.identity_key() == b.identity_key()).unwrap_or(false)
        });
        match slot {
            Some(slot) => pairs.push((b, slot.take().unwrap_or(b))),
            None => removed.push(b),
        }
    }
    let added: Vec<&FunctionSite> = head_pool.into_iter().flatten().collect();
    (pairs, removed, added)
}

fn compare_pair(b: &FunctionSite, h: &FunctionSite, file: &str, records: &mut Vec<ChangeRecord>) {
    if signature_differs(b, h) {
        records.push(
            ChangeRecord::new(
                ChangeKind::SignatureChanged,
                file,
                h.span,
                &h.name,
                format!("signature of `{}` changed", h.name),
            )
            .with_context(format!("{} -> {}", b.signature_text, h.signature_text)),
        );
    }

    for key in b.destructured_keys.difference(&h.destructured_keys) {
        records.push(ChangeRecord::new(
            ChangeKind::DestructuredKeyRemoved,
            file,
            b.span,
            &b.name,
            format!("destructured parameter key `{key}` removed from `{}`", b.name),
        ));
    }
    for key in h.destructured_keys.difference(&b.destructured_keys) {
        records.push(ChangeRecord::new(
            ChangeKind::DestructuredKeyAdded,
            file,
            h.span,
            &h.name,
            format!("destructured parameter key `{key}` added to `{}`", h.name),
        ));
    }

    // Independent of the plain-signature check; both can fire together.
    if b.generic_params != h.generic_params {
        records.push(
            ChangeRecord::new(
                ChangeKind::GenericConstraintsChanged,
                file,
                h.span,
                &h.name,
                format!("generic constraints of `{}` changed", h.name),
            )
            .with_context(format!(
                "<{}> -> <{}>",
                b.generic_params.join(", "),
                h.generic_params.join(", ")
            )),
        );
    }
}

/// Return type and per-parameter `(type, optional, rest)` triples; names and
/// default-value text do not participate. Also used by the aggregator's
/// fallback tiers so both paths agree on what counts as a change.
pub(crate) fn signature_differs(b: &FunctionSite, h: &FunctionSite) -> bool {
    let b_ret = canonical_type(b.return_type.as_deref().unwrap_or(""));
    let h_ret = canonical_type(h.return_type.as_deref().unwrap_or(""));
    if b_ret != h_ret {
        return true;
    }
    if b.params.len() != h.params.len() {
        return true;
    }
    b.params.iter().zip(h.params.iter()).any(|(bp, hp)| {
        bp.optional != hp.optional
            || bp.rest != hp.rest
            || canonical_type(&bp.type_text) != canonical_type(&hp.type_text)
    })
}

fn infer_rename(b: &FunctionSite, h: &FunctionSite, file: &str) -> Vec<ChangeRecord> {
    let similarity = similarity_ratio(&b.body_text, &h.body_text);
    if similarity > RENAME_SIMILARITY {
        return vec![ChangeRecord::new(
            ChangeKind::LikelyRename,
            file,
            h.span,
            &h.name,
            format!("`{}` likely renamed to `{}`", b.name, h.name),
        )
        .with_context(format!("{} -> {}", b.name, h.name))];
    }
    if b.params.len() != h.params.len() {
        return vec![ChangeRecord::new(
            ChangeKind::RenameShapeChanged,
            file,
            h.span,
            &h.name,
            format!(
                "`{}` replaced by `{}` with a different parameter count",
                b.name, h.name
            ),
        )
        .with_context(format!("{} -> {}", b.signature_text, h.signature_text))];
    }
    // Ambiguous: neither similar nor clearly reshaped.
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn diff(base: &str, head: &str) -> Vec<ChangeRecord> {
        let b = SourceModel::extract(base, "test.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "test.ts", Dialect::Plain);
        FunctionSurfaceAnalyzer.diff(&b, &h, &AnalyzerParams::default())
    }

    #[test]
    fn added_parameter_is_a_signature_change() {
        let records = diff(
            "function add(a: number, b: number) { return a + b; }",
            "function add(a: number, b: number, c: number) { return a + b + c; }",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::SignatureChanged);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[test]
    fn parameter_rename_is_invisible() {
        let records = diff(
            "function add(a: number, b: number) { return a + b; }",
            "function add(x: number, y: number) { return x + y; }",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn default_value_change_is_invisible() {
        let records = diff(
            "function f(a: number = 1) { return a; }",
            "function f(a: number = 2) { return a; }",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn array_idiom_rewrite_is_invisible() {
        let records = diff(
            "function f(xs: Array<number>): Array<string> { return xs.map(String); }",
            "function f(xs: number[]): string[] { return xs.map(String); }",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn rename_with_similar_body_is_inferred() {
        let body = "{ const v = compute(input); log(v); return v * 2 + offset; }";
        let records = diff(
            &format!("function oldFn(input: number) {body}"),
            &format!("function newFn(input: number) {body}"),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::LikelyRename);
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn dissimilar_replacement_with_new_shape_is_high() {
        let records = diff(
            "function oldFn(a: number) { return a + 1; }",
            "function newFn(a: number, b: string) { return fetch(b).then(r => r.json()); }",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::RenameShapeChanged);
    }

    #[test]
    fn destructured_key_changes_fire_separately() {
        let records = diff(
            "function f({ a, b }: Opts) {}",
            "function f({ a, c }: Opts) {}",
        );
        let kinds: Vec<ChangeKind> = records.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&ChangeKind::DestructuredKeyRemoved));
        assert!(kinds.contains(&ChangeKind::DestructuredKeyAdded));
    }

    #[test]
    fn generic_constraint_change_fires_independently() {
        let records = diff(
            "function f<T extends object>(v: T) { return v; }",
            "function f<T extends object, U extends string>(v: T) { return v; }",
        );
        assert!(records.iter().any(|r| r.kind == ChangeKind::GenericConstraintsChanged));
    }

    #[test]
    fn removal_and_addition_without_rename_candidates() {
        let records = diff(
            "function a() {}\nfunction b() {}",
            "function a() {}\nfunction c() {}\nfunction d() {}",
        );
        // One removed, two added: no 1-1 rename inference.
        assert!(records.iter().any(|r| r.kind == ChangeKind::FunctionRemoved));
        assert_eq!(
            records.iter().filter(|r| r.kind == ChangeKind::FunctionAdded).count(),
            2
        );
    }

    #[test]
    fn diff_is_idempotent() {
        let base = "function f(a: number) {}\nfunction g() {}";
        let head = "function f(a: string) {}";
        let b = SourceModel::extract(base, "t.ts", Dialect::Plain);
        let h = SourceModel::extract(head, "t.ts", Dialect::Plain);
        let first = FunctionSurfaceAnalyzer.diff(&b, &h, &AnalyzerParams::default());
        let second = FunctionSurfaceAnalyzer.diff(&b, &h, &AnalyzerParams::default());
        assert_eq!(first, second);
    }
}
