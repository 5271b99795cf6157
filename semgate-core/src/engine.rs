//! The whole-file detection call: retrieve both versions, extract two
//! models, run the enabled analyzers, parse the patch, aggregate.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::analyzers::{all_analyzers, AnalyzerParams};
use crate::config::ConfigResolver;
use crate::hunks::parse_patch;
use crate::model::{Dialect, SourceModel};
use crate::provider::ContentProvider;
use crate::records::ChangeRecord;

/// Diff one file between two refs. Missing content on either side becomes an
/// empty model (file-added / file-deleted semantics). A panicking analyzer
/// contributes nothing; the rest still run.
pub fn diff_file(
    provider: &dyn ContentProvider,
    path: &str,
    base_ref: &str,
    head_ref: &str,
    resolver: &ConfigResolver,
) -> Vec<ChangeRecord> {
    let base_text = provider.content(path, base_ref).unwrap_or_default();
    let head_text = provider.content(path, head_ref).unwrap_or_default();

    let dialect = Dialect::from_path(path);
    let base_model = SourceModel::extract(&base_text, path, dialect);
    let head_model = SourceModel::extract(&head_text, path, dialect);
    if base_model.error_count > 0 || head_model.error_count > 0 {
        debug!(
            path,
            base_errors = base_model.error_count,
            head_errors = head_model.error_count,
            "partial structural model"
        );
    }

    let params = AnalyzerParams {
        side_effect_callees: resolver.side_effect_globset(),
    };

    let mut records = Vec::new();
    for analyzer in all_analyzers() {
        if !resolver.is_category_enabled(analyzer.category()) {
            continue;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            analyzer.diff(&base_model, &head_model, &params)
        }));
        match outcome {
            Ok(found) => records.extend(found),
            Err(_) => warn!(
                path,
                category = analyzer.category().name(),
                "analyzer panicked, dropping its output"
            ),
        }
    }

    let patch = provider.patch(path, base_ref, head_ref);
    let hunks = parse_patch(
        path,
        patch.as_deref(),
        base_text.lines().count() as u32,
        head_text.lines().count() as u32,
    );

    aggregate(records, &base_model, &head_model, &hunks, resolver)
}

/// The wrapped detection call: any failure inside degrades to an empty
/// change list rather than propagating.
pub fn detect_changes(
    provider: &dyn ContentProvider,
    path: &str,
    base_ref: &str,
    head_ref: &str,
    resolver: &ConfigResolver,
) -> Vec<ChangeRecord> {
    catch_unwind(AssertUnwindSafe(|| {
        diff_file(provider, path, base_ref, head_ref, resolver)
    }))
    .unwrap_or_else(|_| {
        warn!(path, "whole-file detection panicked, reporting no changes");
        Vec::new()
    })
}
