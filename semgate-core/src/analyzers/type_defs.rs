//! Type-definition analyzer: additions and changed definitions, with a
//! conservative severity elevation when a change looks assignability-breaking.
//!
//! Removals are deliberately not reported: a deleted alias or interface fails
//! the consuming build loudly on its own.

use rustc_hash::FxHashMap;

use crate::model::normalize::canonical_type;
use crate::model::{SourceModel, TypeSite};
use crate::records::{Category, ChangeKind, ChangeRecord, Severity};

use super::{Analyzer, AnalyzerParams};

pub struct TypeDefinitionAnalyzer;

impl Analyzer for TypeDefinitionAnalyzer {
    fn category(&self) -> Category {
        Category::Types
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let base_by_name: FxHashMap<&str, &TypeSite> =
            base.types.iter().map(|t| (t.name.as_str(), t)).collect();

        for h in &head.types {
            let Some(b) = base_by_name.get(h.name.as_str()) else {
                records.push(ChangeRecord::new(
                    ChangeKind::TypeAdded,
                    file,
                    h.span,
                    &h.name,
                    format!("type `{}` added", h.name),
                ));
                continue;
            };

            if compare_key(b) == compare_key(h) {
                continue;
            }

            let severity = if breaks_assignability(b, h) {
                Severity::High
            } else {
                Severity::Medium
            };
            records.push(
                ChangeRecord::new(
                    ChangeKind::TypeDefinitionChanged,
                    file,
                    h.span,
                    &h.name,
                    format!("definition of `{}` changed", h.name),
                )
                .with_severity(severity)
                .with_context(format!("{} -> {}", b.definition_text, h.definition_text)),
            );
        }

        records
    }
}

/// Canonical comparison key: type parameters and the definition body, each
/// idiom-normalized so purely syntactic rewrites (union reordering, array
/// spellings, commutative wrappers) compare equal.
fn compare_key(site: &TypeSite) -> (String, String) {
    (
        canonical_type(site.type_params.as_deref().unwrap_or("")),
        canonical_type(&site.body_text),
    )
}

/// Best-effort mutual-assignability heuristic: a mandatory member present on
/// only one side, or a literal discriminant member changing its literal.
fn breaks_assignability(b: &TypeSite, h: &TypeSite) -> bool {
    let base_members: FxHashMap<&str, &crate::model::TypeMember> =
        b.members.iter().map(|m| (m.name.as_str(), m)).collect();
    let head_members: FxHashMap<&str, &crate::model::TypeMember> =
        h.members.iter().map(|m| (m.name.as_str(), m)).collect();

    for (name, member) in &base_members {
        match head_members.get(name) {
            None if !member.optional => return true,
            Some(other) => {
                if is_literal_type(&member.type_text)
                    && is_literal_type(&other.type_text)
                    && canonical_type(&member.type_text) != canonical_type(&other.type_text)
                {
                    return true;
                }
            }
            None => {}
        }
    }
    head_members
        .iter()
        .any(|(name, member)| !member.optional && !base_members.contains_key(name))
}

fn is_literal_type(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('"')
        || trimmed.starts_with('\'')
        || trimmed.parse::<f64>().is_ok()
}
