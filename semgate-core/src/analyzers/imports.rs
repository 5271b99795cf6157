//! Import-structure analyzer. Type-only imports are invisible: they have no
//! runtime effect. Side-effect import order is executable, so a pure
//! reordering of side-effect-only imports is reported once.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::heuristics::sets::multiset_equal;
use crate::model::{ImportSite, ImportSpecifier, SourceModel};
use crate::records::{Category, ChangeKind, ChangeRecord, Span};

use super::{Analyzer, AnalyzerParams};

pub struct ImportStructureAnalyzer;

impl Analyzer for ImportStructureAnalyzer {
    fn category(&self) -> Category {
        Category::Imports
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let base_modules = merge_by_module(&base.imports);
        let head_modules = merge_by_module(&head.imports);

        for (module, merged) in &base_modules {
            if !head_modules.contains_key(module) {
                records.push(ChangeRecord::new(
                    ChangeKind::ImportModuleRemoved,
                    file,
                    merged.span,
                    *module,
                    format!("import of `{module}` removed"),
                ));
            }
        }
        for (module, merged) in &head_modules {
            let Some(base_merged) = base_modules.get(module) else {
                records.push(ChangeRecord::new(
                    ChangeKind::ImportModuleAdded,
                    file,
                    merged.span,
                    *module,
                    format!("import of `{module}` added"),
                ));
                continue;
            };

            for spec in base_merged.specifiers.difference(&merged.specifiers) {
                records.push(ChangeRecord::new(
                    ChangeKind::ImportSpecifierRemoved,
                    file,
                    base_merged.span,
                    *module,
                    format!("specifier `{}` removed from `{module}`", spec.name),
                ));
            }
            for spec in merged.specifiers.difference(&base_merged.specifiers) {
                records.push(ChangeRecord::new(
                    ChangeKind::ImportSpecifierAdded,
                    file,
                    merged.span,
                    *module,
                    format!("specifier `{}` added to `{module}`", spec.name),
                ));
            }
        }

        compare_side_effect_order(base, head, file, &mut records);

        records
    }
}

struct MergedImport {
    specifiers: BTreeSet<ImportSpecifier>,
    span: Span,
}

/// Merge runtime imports per module path. Type-only imports never enter.
fn merge_by_module(imports: &[ImportSite]) -> FxHashMap<&str, MergedImport> {
    let mut merged: FxHashMap<&str, MergedImport> = FxHashMap::default();
    for import in imports {
        if import.is_type_only {
            continue;
        }
        let entry = merged
            .entry(import.module.as_str())
            .or_insert_with(|| MergedImport {
                specifiers: BTreeSet::new(),
                span: import.span,
            });
        entry.specifiers.extend(import.specifiers.iter().cloned());
    }
    merged
}

fn compare_side_effect_order(
    base: &SourceModel,
    head: &SourceModel,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    let base_order: Vec<&str> = side_effect_modules(&base.imports);
    let head_order: Vec<&str> = side_effect_modules(&head.imports);

    if base_order != head_order && multiset_equal(&base_order, &head_order) {
        let span = head
            .imports
            .iter()
            .find(|i| i.side_effect_only)
            .map(|i| i.span)
            .unwrap_or_default();
        records.push(
            ChangeRecord::new(
                ChangeKind::SideEffectImportOrderChanged,
                file,
                span,
                "imports",
                "side-effect import order changed".to_string(),
            )
            .with_context(format!(
                "[{}] -> [{}]",
                base_order.join(", "),
                head_order.join(", ")
            )),
        );
    }
}

fn side_effect_modules(imports: &[ImportSite]) -> Vec<&str> {
    let mut ordered: Vec<&ImportSite> = imports.iter().filter(|i| i.side_effect_only).collect();
    ordered.sort_by_key(|i| i.order_index);
    ordered.iter().map(|i| i.module.as_str()).collect()
}
