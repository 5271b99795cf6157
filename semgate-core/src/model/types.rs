//! Structural model types: the normalized, per-file-version extraction that
//! every category analyzer consumes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::records::Span;

/// Parsing dialect hint: plain TypeScript/JavaScript or markup-capable (JSX).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Plain,
    Markup,
}

impl Dialect {
    /// Infer the dialect from a file extension.
    pub fn from_path(path: &str) -> Self {
        match path.rsplit('.').next().unwrap_or("") {
            "tsx" | "jsx" => Self::Markup,
            _ => Self::Plain,
        }
    }
}

/// Kind of the scope a declaration is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

impl ScopeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
        }
    }
}

/// Member visibility, TypeScript accessibility modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
        }
    }
}

/// One function parameter, reduced to the parts that matter for the surface
/// comparison. Names and default-value text are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSite {
    /// Normalized type annotation text, empty when unannotated.
    pub type_text: String,
    pub optional: bool,
    pub rest: bool,
}

/// A function/method declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSite {
    pub name: String,
    pub scope_kind: ScopeKind,
    /// Enclosing scope name; empty at module scope.
    pub scope_name: String,
    pub is_static: bool,
    pub visibility: Visibility,
    pub is_async: bool,
    /// Normalized signature text, for display in before/after context.
    pub signature_text: String,
    /// Normalized return type annotation, if any.
    pub return_type: Option<String>,
    pub params: SmallVec<[ParamSite; 4]>,
    /// Keys destructured in object-pattern parameters, across all parameters.
    pub destructured_keys: BTreeSet<String>,
    /// Normalized generic type-parameter texts (name, constraint, default).
    pub generic_params: Vec<String>,
    /// Raw body text, used only for rename similarity.
    pub body_text: String,
    pub span: Span,
}

impl FunctionSite {
    /// Composite identity key: prevents collisions between same-named methods
    /// in different containers, or a method vs a free function.
    pub fn identity_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.scope_kind.name(),
            self.scope_name,
            self.name,
            self.is_static,
            self.visibility.name()
        )
    }
}

/// Kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Alias,
    Interface,
    Enum,
}

/// One member of an object-shaped type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    pub optional: bool,
    /// Normalized member type text.
    pub type_text: String,
}

/// A type alias, interface, or enum definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSite {
    pub name: String,
    pub kind: TypeKind,
    /// Normalized definition text (whitespace collapsed, comments stripped).
    /// Display form for before/after context.
    pub definition_text: String,
    /// The right-hand side alone (alias value, interface heritage+body, enum
    /// body), kept separate so union-member canonicalization applies to it.
    pub body_text: String,
    /// Normalized generic type-parameter list text, if any.
    pub type_params: Option<String>,
    /// Object members when the definition has an object shape.
    pub members: Vec<TypeMember>,
    pub span: Span,
}

/// A call expression or constructor invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    /// Raw callee text as written.
    pub callee_text: String,
    /// Canonical dotted path (optional chaining and literal brackets folded).
    pub path: String,
    /// Normalized argument texts, in order.
    pub args: Vec<String>,
    pub is_new: bool,
    /// Template content for tagged-template invocations.
    pub template_text: Option<String>,
    pub span: Span,
    /// Start byte of the call node, for scope-aware queries on the tree.
    pub byte: usize,
    /// Name of the nearest enclosing named function, empty at module scope.
    pub enclosing_function: String,
}

impl CallSite {
    /// Hook-pattern convention: a `use`-prefixed callee with an uppercase
    /// letter following the prefix.
    pub fn is_hook_call(&self) -> bool {
        let last = self.path.rsplit('.').next().unwrap_or(&self.path);
        last.strip_prefix("use")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase())
    }
}

/// One import specifier: `name` optionally bound as `alias`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub name: String,
    pub alias: Option<String>,
}

/// An import statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSite {
    pub module: String,
    pub specifiers: Vec<ImportSpecifier>,
    pub is_type_only: bool,
    /// True for `import "module"` with no bindings.
    pub side_effect_only: bool,
    /// Statement order within the file, for side-effect ordering checks.
    pub order_index: usize,
    pub span: Span,
}

/// One attribute on a markup element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupAttribute {
    pub name: String,
    /// Normalized value text; `None` for bare boolean attributes.
    pub value: Option<String>,
    pub is_spread: bool,
}

impl MarkupAttribute {
    /// Event-handler convention: `on` followed by an uppercase letter.
    pub fn is_handler(&self) -> bool {
        self.name
            .strip_prefix("on")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase())
    }
}

/// A declarative-markup (JSX) element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupElement {
    pub tag: String,
    pub attributes: Vec<MarkupAttribute>,
    /// Value of a `key` attribute, when present; preferred match identity.
    pub key: Option<String>,
    /// Occurrence index of this tag within the file, fallback match identity.
    pub occurrence: usize,
    pub self_closing: bool,
    pub span: Span,
}

impl MarkupElement {
    pub fn identity(&self) -> String {
        match &self.key {
            Some(key) => format!("{}#{}", self.tag, key),
            None => format!("{}@{}", self.tag, self.occurrence),
        }
    }
}

/// An in-place mutation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationSite {
    /// Canonical dotted path of the mutated target.
    pub target: String,
    /// Operator or mutating method name: `=`, `+=`, `++`, `delete`, `push`, …
    pub op: String,
    /// Normalized right-hand side or argument text.
    pub detail: String,
    pub span: Span,
}

impl MutationSite {
    pub fn identity(&self) -> String {
        format!("{} {}", self.target, self.op)
    }
}

/// Kind of a promise-usage site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromiseOpKind {
    Await,
    Then,
    Catch,
    Finally,
    Combinator,
    NewPromise,
}

/// One promise-usage site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromiseOp {
    pub kind: PromiseOpKind,
    /// Awaited expression, chain receiver, or combinator path.
    pub target: String,
    pub enclosing_function: String,
    pub span: Span,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TernarySite {
    pub condition: String,
    pub consequence: String,
    pub alternative: String,
    pub span: Span,
}

/// Kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property,
}

/// One class member, reduced to its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub visibility: Visibility,
}

/// A class declaration's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassShape {
    pub name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

/// A module-level variable declaration's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSite {
    pub name: String,
    /// Declaration keyword: `const`, `let`, or `var`.
    pub decl_kind: String,
    /// Normalized type annotation, if any.
    pub type_text: Option<String>,
    /// Normalized initializer text, if any.
    pub initializer: Option<String>,
    pub span: Span,
}
