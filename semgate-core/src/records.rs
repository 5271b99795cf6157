//! Canonical change vocabulary and the record type every analyzer produces.
//!
//! This is the single source of truth for reported differences. Analyzers
//! construct records, the aggregator merges them, renderers consume them.
//! Records are never edited in place after construction.

use serde::{Deserialize, Serialize};

/// Risk ranking used to drive the "tests required" policy downstream.
///
/// Ordering is `Low < Medium < High` so severity comparisons read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Analyzer category a change kind belongs to. Categories can be enabled or
/// disabled as a group through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Functions,
    Calls,
    Types,
    Imports,
    Markup,
    Hooks,
    Mutations,
    Promises,
    Ternaries,
    Shape,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Self::Functions,
            Self::Calls,
            Self::Types,
            Self::Imports,
            Self::Markup,
            Self::Hooks,
            Self::Mutations,
            Self::Promises,
            Self::Ternaries,
            Self::Shape,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Calls => "calls",
            Self::Types => "types",
            Self::Imports => "imports",
            Self::Markup => "markup",
            Self::Hooks => "hooks",
            Self::Mutations => "mutations",
            Self::Promises => "promises",
            Self::Ternaries => "ternaries",
            Self::Shape => "shape",
        }
    }
}

/// Which version of the file a record's span is anchored to. Drives hunk
/// scoping: head-anchored records must fall inside an edited head range,
/// base-anchored records inside an edited base range, file-level records are
/// always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Head,
    Base,
    File,
}

/// Closed vocabulary of reported semantic differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    // Function surface
    FunctionRemoved,
    FunctionAdded,
    SignatureChanged,
    GenericConstraintsChanged,
    DestructuredKeyRemoved,
    DestructuredKeyAdded,
    LikelyRename,
    RenameShapeChanged,
    SignatureChangeInferred,

    // Call sites
    CallRemoved,
    CallAdded,
    ConstructorCallFlip,
    TaggedTemplateChanged,
    ArgumentOrderChanged,
    ArgumentsRemoved,
    ArgumentsAdded,
    HookDepsChanged,

    // Type definitions
    TypeAdded,
    TypeDefinitionChanged,

    // Import structure
    ImportModuleAdded,
    ImportModuleRemoved,
    ImportSpecifierAdded,
    ImportSpecifierRemoved,
    SideEffectImportOrderChanged,

    // Declarative markup
    MarkupElementAdded,
    MarkupElementRemoved,
    MarkupAttributeAdded,
    MarkupAttributeRemoved,
    MarkupAttributeChanged,
    MarkupHandlerChanged,

    // Hook usage
    HookAdded,
    HookRemoved,
    HookOrderChanged,
    HookArgsChanged,

    // In-place mutations
    MutationAdded,
    MutationRemoved,

    // Promise usage
    AwaitAdded,
    AwaitRemoved,
    PromiseCatchAdded,
    PromiseCatchRemoved,
    PromiseChainChanged,
    PromiseCombinatorChanged,

    // Ternaries
    TernaryAdded,
    TernaryRemoved,
    TernaryBranchesSwapped,
    TernaryBranchChanged,
    TernaryConditionChanged,

    // Class / variable shape
    ClassExtendsChanged,
    ClassImplementsChanged,
    ClassMemberAdded,
    ClassMemberRemoved,
    ClassMemberModifierChanged,
    VariableTypeChanged,
    VariableKindChanged,
    VariableInitializerChanged,
}

impl ChangeKind {
    pub fn category(&self) -> Category {
        use ChangeKind::*;
        match self {
            FunctionRemoved | FunctionAdded | SignatureChanged | GenericConstraintsChanged
            | DestructuredKeyRemoved | DestructuredKeyAdded | LikelyRename
            | RenameShapeChanged | SignatureChangeInferred => Category::Functions,

            CallRemoved | CallAdded | ConstructorCallFlip | TaggedTemplateChanged
            | ArgumentOrderChanged | ArgumentsRemoved | ArgumentsAdded | HookDepsChanged => {
                Category::Calls
            }

            TypeAdded | TypeDefinitionChanged => Category::Types,

            ImportModuleAdded | ImportModuleRemoved | ImportSpecifierAdded
            | ImportSpecifierRemoved | SideEffectImportOrderChanged => Category::Imports,

            MarkupElementAdded | MarkupElementRemoved | MarkupAttributeAdded
            | MarkupAttributeRemoved | MarkupAttributeChanged | MarkupHandlerChanged => {
                Category::Markup
            }

            HookAdded | HookRemoved | HookOrderChanged | HookArgsChanged => Category::Hooks,

            MutationAdded | MutationRemoved => Category::Mutations,

            AwaitAdded | AwaitRemoved | PromiseCatchAdded | PromiseCatchRemoved
            | PromiseChainChanged | PromiseCombinatorChanged => Category::Promises,

            TernaryAdded | TernaryRemoved | TernaryBranchesSwapped | TernaryBranchChanged
            | TernaryConditionChanged => Category::Ternaries,

            ClassExtendsChanged | ClassImplementsChanged | ClassMemberAdded
            | ClassMemberRemoved | ClassMemberModifierChanged | VariableTypeChanged
            | VariableKindChanged | VariableInitializerChanged => Category::Shape,
        }
    }

    /// Baseline severity before configuration overrides.
    pub fn default_severity(&self) -> Severity {
        use ChangeKind::*;
        match self {
            FunctionRemoved | SignatureChanged | GenericConstraintsChanged
            | DestructuredKeyRemoved | RenameShapeChanged | ConstructorCallFlip
            | ArgumentsRemoved | HookDepsChanged | MarkupHandlerChanged | HookRemoved
            | HookOrderChanged | AwaitRemoved | PromiseCatchRemoved | TernaryBranchesSwapped
            | ClassExtendsChanged | ClassImplementsChanged | ClassMemberRemoved => Severity::High,

            FunctionAdded | DestructuredKeyAdded | LikelyRename | SignatureChangeInferred
            | CallRemoved | CallAdded | TaggedTemplateChanged | ArgumentsAdded
            | TypeDefinitionChanged | ImportModuleRemoved | ImportSpecifierRemoved
            | SideEffectImportOrderChanged | MarkupElementAdded | MarkupElementRemoved
            | MarkupAttributeRemoved | MarkupAttributeChanged | HookAdded | HookArgsChanged
            | MutationAdded | AwaitAdded | PromiseChainChanged | PromiseCombinatorChanged
            | TernaryAdded | TernaryRemoved | TernaryBranchChanged | TernaryConditionChanged
            | ClassMemberAdded | ClassMemberModifierChanged | VariableTypeChanged
            | VariableKindChanged => Severity::Medium,

            ArgumentOrderChanged | TypeAdded | ImportModuleAdded | ImportSpecifierAdded
            | MarkupAttributeAdded | MutationRemoved | PromiseCatchAdded
            | VariableInitializerChanged => Severity::Low,
        }
    }

    /// Kind name as it appears in configuration and serialized output.
    pub fn name(&self) -> String {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => s,
            _ => String::new(),
        }
    }

    /// Which file version the record's span points into.
    pub fn anchor(&self) -> Anchor {
        use ChangeKind::*;
        match self {
            FunctionRemoved | DestructuredKeyRemoved | CallRemoved | ArgumentsRemoved
            | ImportModuleRemoved | ImportSpecifierRemoved | MarkupElementRemoved
            | MarkupAttributeRemoved | HookRemoved | MutationRemoved | AwaitRemoved
            | PromiseCatchRemoved | TernaryRemoved | ClassMemberRemoved => Anchor::Base,

            SignatureChangeInferred | SideEffectImportOrderChanged => Anchor::File,

            _ => Anchor::Head,
        }
    }
}

/// Zero-indexed line/column position, matching tree-sitter's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Source span. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn from_ts_node(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start: Position {
                line: start.row as u32,
                column: start.column as u32,
            },
            end: Position {
                line: end.row as u32,
                column: end.column as u32,
            },
        }
    }

    pub fn point(line: u32, column: u32) -> Self {
        let p = Position { line, column };
        Self { start: p, end: p }
    }
}

/// One reported semantic difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub severity: Severity,
    pub file_path: String,
    pub span: Span,
    /// Human-readable description of what changed.
    pub detail: String,
    /// Name of the structural element the record is about.
    pub node_label: String,
    /// Optional before/after context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ChangeRecord {
    /// Construct a record with the kind's default severity.
    pub fn new(
        kind: ChangeKind,
        file_path: impl Into<String>,
        span: Span,
        node_label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            file_path: file_path.into(),
            span,
            detail: detail.into(),
            node_label: node_label.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Dedup key: records colliding on this key are merged, keeping the
    /// higher-severity one.
    pub fn dedup_key(&self) -> (String, ChangeKind, u32, u32, String) {
        (
            self.file_path.clone(),
            self.kind,
            self.span.start.line,
            self.span.start.column,
            self.detail.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn removal_kinds_anchor_to_base() {
        assert_eq!(ChangeKind::FunctionRemoved.anchor(), Anchor::Base);
        assert_eq!(ChangeKind::CallRemoved.anchor(), Anchor::Base);
        assert_eq!(ChangeKind::SignatureChanged.anchor(), Anchor::Head);
        assert_eq!(ChangeKind::SignatureChangeInferred.anchor(), Anchor::File);
    }

    #[test]
    fn every_kind_maps_to_its_category() {
        assert_eq!(ChangeKind::HookDepsChanged.category(), Category::Calls);
        assert_eq!(ChangeKind::HookOrderChanged.category(), Category::Hooks);
        assert_eq!(ChangeKind::TypeAdded.category(), Category::Types);
    }
}
