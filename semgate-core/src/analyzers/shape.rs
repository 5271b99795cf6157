//! Shape analyzer: class heritage and member shape, plus module-level
//! variable declarations. Whole-class additions and removals are left to the
//! function surface, which already reports every method.

use rustc_hash::FxHashMap;

use crate::model::normalize::canonical_type;
use crate::model::{ClassMember, ClassShape, MemberKind, SourceModel, VariableSite};
use crate::records::{Category, ChangeKind, ChangeRecord};

use super::{Analyzer, AnalyzerParams};

pub struct ShapeAnalyzer;

impl Analyzer for ShapeAnalyzer {
    fn category(&self) -> Category {
        Category::Shape
    }

    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        _params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord> {
        let file = &head.file_path;
        let mut records = Vec::new();

        let base_classes: FxHashMap<&str, &ClassShape> =
            base.classes.iter().map(|c| (c.name.as_str(), c)).collect();
        for h in &head.classes {
            if let Some(b) = base_classes.get(h.name.as_str()) {
                compare_classes(b, h, file, &mut records);
            }
        }

        let base_vars: FxHashMap<&str, &VariableSite> =
            base.variables.iter().map(|v| (v.name.as_str(), v)).collect();
        for h in &head.variables {
            if let Some(b) = base_vars.get(h.name.as_str()) {
                compare_variables(b, h, file, &mut records);
            }
        }

        records
    }
}

fn compare_classes(b: &ClassShape, h: &ClassShape, file: &str, records: &mut Vec<ChangeRecord>) {
    if b.extends != h.extends {
        records.push(
            ChangeRecord::new(
                ChangeKind::ClassExtendsChanged,
                file,
                h.span,
                &h.name,
                format!("base class of `{}` changed", h.name),
            )
            .with_context(format!(
                "{} -> {}",
                b.extends.as_deref().unwrap_or("(none)"),
                h.extends.as_deref().unwrap_or("(none)")
            )),
        );
    }

    let mut base_impls = b.implements.clone();
    let mut head_impls = h.implements.clone();
    base_impls.sort();
    head_impls.sort();
    if base_impls != head_impls {
        records.push(
            ChangeRecord::new(
                ChangeKind::ClassImplementsChanged,
                file,
                h.span,
                &h.name,
                format!("implemented interfaces of `{}` changed", h.name),
            )
            .with_context(format!(
                "[{}] -> [{}]",
                b.implements.join(", "),
                h.implements.join(", ")
            )),
        );
    }

    let base_members: FxHashMap<&str, &ClassMember> =
        b.members.iter().map(|m| (m.name.as_str(), m)).collect();
    let head_members: FxHashMap<&str, &ClassMember> =
        h.members.iter().map(|m| (m.name.as_str(), m)).collect();

    // Method presence belongs to the function surface; only property
    // presence is reported here. Modifier flips apply to every member kind.
    for member in &b.members {
        match head_members.get(member.name.as_str()) {
            None if member.kind != MemberKind::Method => records.push(ChangeRecord::new(
                ChangeKind::ClassMemberRemoved,
                file,
                b.span,
                &member.name,
                format!("member `{}` removed from class `{}`", member.name, b.name),
            )),
            Some(other) if *other != member => records.push(ChangeRecord::new(
                ChangeKind::ClassMemberModifierChanged,
                file,
                h.span,
                &member.name,
                format!(
                    "modifiers of `{}.{}` changed",
                    h.name, member.name
                ),
            )),
            _ => {}
        }
    }
    for member in &h.members {
        if member.kind != MemberKind::Method && !base_members.contains_key(member.name.as_str()) {
            records.push(ChangeRecord::new(
                ChangeKind::ClassMemberAdded,
                file,
                h.span,
                &member.name,
                format!("member `{}` added to class `{}`", member.name, h.name),
            ));
        }
    }
}

fn compare_variables(
    b: &VariableSite,
    h: &VariableSite,
    file: &str,
    records: &mut Vec<ChangeRecord>,
) {
    let b_type = canonical_type(b.type_text.as_deref().unwrap_or(""));
    let h_type = canonical_type(h.type_text.as_deref().unwrap_or(""));
    if b_type != h_type {
        records.push(
            ChangeRecord::new(
                ChangeKind::VariableTypeChanged,
                file,
                h.span,
                &h.name,
                format!("type of `{}` changed", h.name),
            )
            .with_context(format!(
                "{} -> {}",
                b.type_text.as_deref().unwrap_or("(untyped)"),
                h.type_text.as_deref().unwrap_or("(untyped)")
            )),
        );
    }
    if b.decl_kind != h.decl_kind {
        records.push(ChangeRecord::new(
            ChangeKind::VariableKindChanged,
            file,
            h.span,
            &h.name,
            format!("`{}` changed from `{}` to `{}`", h.name, b.decl_kind, h.decl_kind),
        ));
    }
    if b.initializer != h.initializer {
        records.push(
            ChangeRecord::new(
                ChangeKind::VariableInitializerChanged,
                file,
                h.span,
                &h.name,
                format!("initializer of `{}` changed", h.name),
            )
            .with_context(format!(
                "{} -> {}",
                b.initializer.as_deref().unwrap_or("(none)"),
                h.initializer.as_deref().unwrap_or("(none)")
            )),
        );
    }
}
