//! Property tests for the aggregator: ranking and dedup hold for arbitrary
//! record mixes, and normalization is stable.

use proptest::prelude::*;

use semgate_core::model::normalize::canonical_type;
use semgate_core::model::{Dialect, SourceModel};
use semgate_core::{
    aggregate, AnalyzerConfig, ChangeKind, ChangeRecord, ConfigResolver, DiffHunk, Severity, Span,
};

fn kind_strategy() -> impl Strategy<Value = ChangeKind> {
    prop_oneof![
        Just(ChangeKind::SignatureChanged),
        Just(ChangeKind::FunctionAdded),
        Just(ChangeKind::CallRemoved),
        Just(ChangeKind::CallAdded),
        Just(ChangeKind::TypeAdded),
        Just(ChangeKind::ImportSpecifierAdded),
        Just(ChangeKind::HookDepsChanged),
        Just(ChangeKind::MutationAdded),
        Just(ChangeKind::TernaryBranchChanged),
    ]
}

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![Just(Severity::Low), Just(Severity::Medium), Just(Severity::High)]
}

fn record_strategy() -> impl Strategy<Value = ChangeRecord> {
    (kind_strategy(), severity_strategy(), 0u32..200, 0u32..80, "[a-d]{1,4}").prop_map(
        |(kind, severity, line, column, detail)| {
            ChangeRecord::new(kind, "prop.ts", Span::point(line, column), "node", detail)
                .with_severity(severity)
        },
    )
}

fn run_aggregate(records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    let base = SourceModel::extract("", "prop.ts", Dialect::Plain);
    let head = SourceModel::extract("", "prop.ts", Dialect::Plain);
    let hunks = vec![DiffHunk::whole_file("prop.ts", 500, 500)];
    let resolver = ConfigResolver::new(AnalyzerConfig::default());
    aggregate(records, &base, &head, &hunks, &resolver)
}

proptest! {
    #[test]
    fn output_is_sorted_by_severity_then_position(records in prop::collection::vec(record_strategy(), 0..40)) {
        let out = run_aggregate(records);
        for pair in out.windows(2) {
            prop_assert!(pair[0].severity >= pair[1].severity);
            if pair[0].severity == pair[1].severity {
                prop_assert!(pair[0].span.start <= pair[1].span.start);
            }
        }
    }

    #[test]
    fn dedup_key_is_unique_in_output(records in prop::collection::vec(record_strategy(), 0..40)) {
        let out = run_aggregate(records);
        let mut keys: Vec<_> = out.iter().map(|r| r.dedup_key()).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(before, keys.len());
    }

    #[test]
    fn colliding_records_keep_the_higher_severity(
        kind in kind_strategy(),
        line in 0u32..100,
        sev_a in severity_strategy(),
        sev_b in severity_strategy(),
    ) {
        let make = |severity| {
            ChangeRecord::new(kind, "prop.ts", Span::point(line, 0), "node", "same")
                .with_severity(severity)
        };
        let out = run_aggregate(vec![make(sev_a), make(sev_b)]);
        let survivor = out.iter().find(|r| r.kind == kind && r.detail == "same");
        prop_assert!(survivor.is_some());
        prop_assert_eq!(survivor.map(|r| r.severity), Some(sev_a.max(sev_b)));
    }

    #[test]
    fn aggregation_is_idempotent(records in prop::collection::vec(record_strategy(), 0..30)) {
        let first = run_aggregate(records.clone());
        let second = run_aggregate(records);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn canonical_type_is_stable(text in "[A-Za-z<>\\[\\]|, ]{0,40}") {
        let once = canonical_type(&text);
        let twice = canonical_type(&once);
        prop_assert_eq!(once, twice);
    }
}
