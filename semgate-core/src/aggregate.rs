//! Aggregator: merges analyzer outputs, deduplicates, applies the signature
//! fallback escalation, scopes records to edited regions, and sorts.

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::config::ConfigResolver;
use crate::heuristics::pairing::pair_by_unique_key;
use crate::hunks::DiffHunk;
use crate::model::normalize::canonical_type;
use crate::model::{FunctionSite, SourceModel};
use crate::records::{Anchor, ChangeKind, ChangeRecord, Span};

/// Merge and rank the combined analyzer output for one file.
pub fn aggregate(
    records: Vec<ChangeRecord>,
    base: &SourceModel,
    head: &SourceModel,
    hunks: &[DiffHunk],
    resolver: &ConfigResolver,
) -> Vec<ChangeRecord> {
    let mut records = apply_config(records, resolver);
    records = dedupe(records);
    append_signature_fallback(&mut records, base, head, resolver);
    records.retain(|r| in_scope(r, hunks));
    sort_records(&mut records);
    records
}

fn apply_config(records: Vec<ChangeRecord>, resolver: &ConfigResolver) -> Vec<ChangeRecord> {
    records
        .into_iter()
        .filter(|r| resolver.is_kind_enabled(r.kind))
        .map(|mut r| {
            if let Some(severity) = resolver.severity_override(r.kind) {
                r.severity = severity;
            }
            r
        })
        .collect()
}

/// Records colliding on `(file, kind, start_line, start_column, detail)` are
/// merged; the higher-severity one survives.
fn dedupe(records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    let mut seen: FxHashMap<(String, ChangeKind, u32, u32, String), usize> = FxHashMap::default();
    let mut out: Vec<ChangeRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = record.dedup_key();
        match seen.get(&key) {
            Some(&index) => {
                if record.severity > out[index].severity {
                    out[index] = record;
                }
            }
            None => {
                seen.insert(key, out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Three-tier fallback, applied only when no signature-related record exists
/// yet other categories show structural change: full identity key, then bare
/// name, then a raw-text pattern scan for inputs one side of which failed to
/// parse. If every tier comes up empty, one synthetic record is appended:
/// the gate must not report zero signature risk when structural evidence
/// exists elsewhere.
fn append_signature_fallback(
    records: &mut Vec<ChangeRecord>,
    base: &SourceModel,
    head: &SourceModel,
    resolver: &ConfigResolver,
) {
    if records.is_empty() || records.iter().any(|r| is_signature_kind(r.kind)) {
        return;
    }
    // Tier 1: full identity key. Tier 2: bare name. Tier 3: raw-text scan,
    // for a side that failed to parse. Generated records go through the same
    // config gate as analyzer output, so a disabled kind stays disabled.
    let tiers = [
        signature_diffs(base, head, |f| f.identity_key()),
        signature_diffs(base, head, |f| f.name.clone()),
        raw_text_signature_diffs(base, head),
    ];
    for found in tiers {
        let found = apply_config(found, resolver);
        if !found.is_empty() {
            records.extend(found);
            return;
        }
    }

    let synthetic = ChangeRecord::new(
        ChangeKind::SignatureChangeInferred,
        &head.file_path,
        Span::default(),
        &head.file_path,
        "signature change inferred by context".to_string(),
    );
    records.extend(apply_config(vec![synthetic], resolver));
}

fn is_signature_kind(kind: ChangeKind) -> bool {
    matches!(
        kind,
        ChangeKind::SignatureChanged
            | ChangeKind::GenericConstraintsChanged
            | ChangeKind::LikelyRename
            | ChangeKind::RenameShapeChanged
            | ChangeKind::SignatureChangeInferred
    )
}

fn signature_diffs<K, F>(base: &SourceModel, head: &SourceModel, key_fn: F) -> Vec<ChangeRecord>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&FunctionSite) -> K,
{
    let paired = pair_by_unique_key(
        base.functions.iter().collect(),
        head.functions.iter().collect(),
        |f: &&FunctionSite| key_fn(f),
    );
    paired
        .pairs
        .into_iter()
        .filter(|(b, h)| crate::analyzers::functions::signature_differs(b, h))
        .map(|(b, h)| {
            ChangeRecord::new(
                ChangeKind::SignatureChanged,
                &head.file_path,
                h.span,
                &h.name,
                format!("signature of `{}` changed", h.name),
            )
            .with_context(format!("{} -> {}", b.signature_text, h.signature_text))
        })
        .collect()
}

/// Last resort: scan both raw texts for `function name(params)` heads and
/// compare the parameter text per name.
fn raw_text_signature_diffs(base: &SourceModel, head: &SourceModel) -> Vec<ChangeRecord> {
    let Ok(pattern) = Regex::new(r"function\s+([A-Za-z_$][\w$]*)\s*\(([^)]*)\)") else {
        return Vec::new();
    };
    let base_sigs = scan_signatures(&pattern, base.source());
    let head_sigs = scan_signatures(&pattern, head.source());

    let mut out = Vec::new();
    for (name, (base_params, _)) in &base_sigs {
        if let Some((head_params, line)) = head_sigs.get(name) {
            if canonical_type(base_params) != canonical_type(head_params) {
                out.push(
                    ChangeRecord::new(
                        ChangeKind::SignatureChanged,
                        &head.file_path,
                        Span::point(*line, 0),
                        name,
                        format!("signature of `{name}` changed"),
                    )
                    .with_context(format!("({base_params}) -> ({head_params})")),
                );
            }
        }
    }
    out
}

fn scan_signatures(pattern: &Regex, source: &str) -> FxHashMap<String, (String, u32)> {
    let mut sigs = FxHashMap::default();
    for caps in pattern.captures_iter(source) {
        let name = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let params = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        let line = caps
            .get(0)
            .map(|m| source[..m.start()].matches('\n').count() as u32)
            .unwrap_or(0);
        sigs.entry(name).or_insert((params, line));
    }
    sigs
}

/// Head-anchored records must fall inside an edited head range, base-anchored
/// records inside an edited base range; file-level records are always kept.
fn in_scope(record: &ChangeRecord, hunks: &[DiffHunk]) -> bool {
    match record.kind.anchor() {
        Anchor::File => true,
        Anchor::Head => hunks.iter().any(|h| contains_any_head(h, record)),
        Anchor::Base => hunks.iter().any(|h| contains_any_base(h, record)),
    }
}

/// A record is in scope when any line of its span touches the hunk.
fn contains_any_head(hunk: &DiffHunk, record: &ChangeRecord) -> bool {
    (record.span.start.line..=record.span.end.line).any(|l| hunk.contains_head_line(l))
}

fn contains_any_base(hunk: &DiffHunk, record: &ChangeRecord) -> bool {
    (record.span.start.line..=record.span.end.line).any(|l| hunk.contains_base_line(l))
}

/// Severity descending, then position ascending; kind name breaks remaining
/// ties so the order is fully deterministic.
fn sort_records(records: &mut [ChangeRecord]) {
    records.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.span.start.cmp(&b.span.start))
            .then_with(|| a.kind.name().cmp(&b.kind.name()))
            .then_with(|| a.detail.cmp(&b.detail))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::model::Dialect;
    use crate::records::Severity;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(AnalyzerConfig::default())
    }

    fn whole_file_hunks() -> Vec<DiffHunk> {
        vec![DiffHunk::whole_file("t.ts", 1000, 1000)]
    }

    fn record(kind: ChangeKind, line: u32, detail: &str) -> ChangeRecord {
        ChangeRecord::new(kind, "t.ts", Span::point(line, 0), "x", detail)
    }

    fn models() -> (SourceModel, SourceModel) {
        (
            SourceModel::extract("function f(a: number) {}", "t.ts", Dialect::Plain),
            SourceModel::extract("function f(a: number) {}", "t.ts", Dialect::Plain),
        )
    }

    #[test]
    fn dedupe_keeps_higher_severity() {
        let (base, head) = models();
        let low = record(ChangeKind::SignatureChanged, 3, "same").with_severity(Severity::Low);
        let high = record(ChangeKind::SignatureChanged, 3, "same").with_severity(Severity::High);
        let out = aggregate(vec![low, high], &base, &head, &whole_file_hunks(), &resolver());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::High);
    }

    #[test]
    fn sorted_by_severity_then_position() {
        let (base, head) = models();
        let records = vec![
            record(ChangeKind::TypeAdded, 1, "low early"),
            record(ChangeKind::SignatureChanged, 9, "high late"),
            record(ChangeKind::CallAdded, 5, "medium mid"),
            record(ChangeKind::FunctionRemoved, 2, "high early"),
        ];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        let severities: Vec<Severity> = out.iter().map(|r| r.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::High, Severity::Medium, Severity::Low]
        );
        assert!(out[0].span.start.line < out[1].span.start.line);
    }

    #[test]
    fn synthetic_signature_record_when_other_evidence_exists() {
        let (base, head) = models();
        let records = vec![record(ChangeKind::CallAdded, 4, "call")];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        assert!(out.iter().any(|r| r.kind == ChangeKind::SignatureChangeInferred));
    }

    #[test]
    fn no_synthetic_record_on_empty_input() {
        let (base, head) = models();
        let out = aggregate(Vec::new(), &base, &head, &whole_file_hunks(), &resolver());
        assert!(out.is_empty());
    }

    #[test]
    fn no_fallback_when_signature_record_present() {
        let (base, head) = models();
        let records = vec![
            record(ChangeKind::SignatureChanged, 2, "sig"),
            record(ChangeKind::CallAdded, 4, "call"),
        ];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        assert_eq!(
            out.iter().filter(|r| r.kind == ChangeKind::SignatureChangeInferred).count(),
            0
        );
    }

    #[test]
    fn fallback_tier_finds_signature_diff_when_analyzer_was_disabled() {
        let base = SourceModel::extract("function f(a: number) {}", "t.ts", Dialect::Plain);
        let head = SourceModel::extract("function f(a: number, b: string) {}", "t.ts", Dialect::Plain);
        let records = vec![record(ChangeKind::CallAdded, 0, "call")];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        let sig = out.iter().find(|r| r.kind == ChangeKind::SignatureChanged).unwrap();
        assert!(sig.context.as_deref().unwrap_or("").contains("b: string"));
    }

    #[test]
    fn fallback_respects_a_disabled_signature_kind() {
        let base = SourceModel::extract("function f(a: number) {}", "t.ts", Dialect::Plain);
        let head =
            SourceModel::extract("function f(a: number, b: string) {}", "t.ts", Dialect::Plain);
        let resolver = ConfigResolver::new(AnalyzerConfig {
            disabled_kinds: vec!["signature-changed".into()],
            ..Default::default()
        });
        let records = vec![record(ChangeKind::CallAdded, 0, "call")];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver);

        // The tiers would find the diff, but the kind is disabled; the
        // synthetic stands in so the gate still reports signature risk.
        assert!(!out.iter().any(|r| r.kind == ChangeKind::SignatureChanged));
        assert!(out.iter().any(|r| r.kind == ChangeKind::SignatureChangeInferred));
    }

    #[test]
    fn fallback_applies_severity_overrides_to_generated_records() {
        let base = SourceModel::extract("function f(a: number) {}", "t.ts", Dialect::Plain);
        let head =
            SourceModel::extract("function f(a: number, b: string) {}", "t.ts", Dialect::Plain);
        let mut overrides = std::collections::HashMap::new();
        overrides.insert("signature-changed".to_string(), Severity::Low);
        let resolver = ConfigResolver::new(AnalyzerConfig {
            severity_overrides: overrides,
            ..Default::default()
        });
        let records = vec![record(ChangeKind::CallAdded, 0, "call")];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver);

        let sig = out.iter().find(|r| r.kind == ChangeKind::SignatureChanged).unwrap();
        assert_eq!(sig.severity, Severity::Low);
    }

    #[test]
    fn raw_text_tier_survives_unparseable_base() {
        // The base text is mangled enough that structural extraction finds no
        // function; the raw-text scan still sees the signature head.
        let base = SourceModel::extract(
            "function f(a: number) { if ( { ] ",
            "t.ts",
            Dialect::Plain,
        );
        let head = SourceModel::extract("function f(a: number, b: string) {}", "t.ts", Dialect::Plain);
        let records = vec![record(ChangeKind::CallAdded, 0, "call")];
        let out = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        assert!(out
            .iter()
            .any(|r| r.kind == ChangeKind::SignatureChanged
                || r.kind == ChangeKind::SignatureChangeInferred));
    }

    #[test]
    fn out_of_scope_records_are_dropped() {
        let (base, head) = models();
        let hunks = vec![DiffHunk {
            file: "t.ts".into(),
            base_start: 1,
            base_end: 5,
            head_start: 1,
            head_end: 5,
            added_lines: vec![],
            removed_lines: vec![],
        }];
        let records = vec![
            record(ChangeKind::SignatureChanged, 2, "inside"),
            record(ChangeKind::CallAdded, 50, "outside"),
        ];
        let out = aggregate(records, &base, &head, &hunks, &resolver());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].detail, "inside");
    }

    #[test]
    fn base_anchored_records_scope_against_base_ranges() {
        let (base, head) = models();
        let hunks = vec![DiffHunk {
            file: "t.ts".into(),
            base_start: 40,
            base_end: 45,
            head_start: 1,
            head_end: 5,
            added_lines: vec![],
            removed_lines: vec![],
        }];
        let records = vec![
            record(ChangeKind::FunctionRemoved, 41, "removed fn"),
            record(ChangeKind::SignatureChanged, 2, "sig"),
        ];
        let out = aggregate(records, &base, &head, &hunks, &resolver());
        assert_eq!(out.len(), 2);
        let span_positions: Vec<u32> = out.iter().map(|r| r.span.start.line).collect();
        assert!(span_positions.contains(&41));
    }

    #[test]
    fn aggregate_is_idempotent_in_shape() {
        let (base, head) = models();
        let records = vec![
            record(ChangeKind::CallAdded, 4, "call"),
            record(ChangeKind::TypeAdded, 1, "type"),
        ];
        let first = aggregate(records.clone(), &base, &head, &whole_file_hunks(), &resolver());
        let second = aggregate(records, &base, &head, &whole_file_hunks(), &resolver());
        assert_eq!(first, second);
    }
}
