//! Structural extractor: raw source text to a `SourceModel`.
//!
//! Walks the tree-sitter tree once, collecting every site list the category
//! analyzers consume. Degrades gracefully: malformed input produces a partial
//! model, never an error.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::normalize::normalize_ws;
use super::types::*;
use crate::heuristics::paths::normalize_access_path;
use crate::heuristics::scope;
use crate::records::Span;

/// Array/Map/Set methods that mutate their receiver in place.
const MUTATING_METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "splice", "sort", "reverse", "fill", "copyWithin", "set",
    "delete", "add", "clear",
];

/// Promise combinators on the `Promise` namespace.
const PROMISE_COMBINATORS: &[&str] = &["all", "allSettled", "any", "race"];

/// Normalized, per-file-version extraction of the structures the analyzers
/// diff, plus the full syntax tree for ad hoc traversal. Built fresh per
/// diff, never mutated once built.
pub struct SourceModel {
    pub file_path: String,
    pub dialect: Dialect,
    pub functions: Vec<FunctionSite>,
    pub types: Vec<TypeSite>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportSite>,
    pub markup: Vec<MarkupElement>,
    pub mutations: Vec<MutationSite>,
    pub promise_ops: Vec<PromiseOp>,
    pub ternaries: Vec<TernarySite>,
    pub classes: Vec<ClassShape>,
    pub variables: Vec<VariableSite>,
    /// Count of syntax-error nodes encountered; non-zero means partial model.
    pub error_count: u32,
    source: String,
    tree: Option<Tree>,
}

impl SourceModel {
    /// Build a model from source text. A dialect of `Markup` selects the TSX
    /// grammar; plain `.js` files go through the JavaScript grammar.
    pub fn extract(source: &str, file_path: &str, dialect: Dialect) -> Self {
        let mut model = Self {
            file_path: file_path.to_string(),
            dialect,
            functions: Vec::new(),
            types: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
            markup: Vec::new(),
            mutations: Vec::new(),
            promise_ops: Vec::new(),
            ternaries: Vec::new(),
            classes: Vec::new(),
            variables: Vec::new(),
            error_count: 0,
            source: source.to_string(),
            tree: None,
        };

        let mut parser = Parser::new();
        if parser.set_language(&language_for(file_path, dialect)).is_err() {
            debug!(file = file_path, "grammar unavailable, returning empty model");
            return model;
        }

        let tree = match parser.parse(source, None) {
            Some(t) => t,
            None => {
                debug!(file = file_path, "tree-sitter returned no tree");
                model.error_count = 1;
                return model;
            }
        };

        {
            let mut extraction = Extraction {
                source,
                root: tree.root_node(),
                model: &mut model,
                markup_occurrence: FxHashMap::default(),
            };
            extraction.walk();
        }

        model.tree = Some(tree);
        model
    }

    /// Build an empty model, used for the added/deleted side of a diff.
    pub fn empty(file_path: &str, dialect: Dialect) -> Self {
        Self::extract("", file_path, dialect)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Option<Node<'_>> {
        self.tree.as_ref().map(|t| t.root_node())
    }

    /// Resolve the dependency-list argument of a hook-pattern call to a
    /// flattened expression list. An inline array literal is flattened
    /// directly; a bare identifier is expanded through the nearest enclosing
    /// scope's array-literal initializer. `None` when the call has no
    /// resolvable dependency argument.
    pub fn resolve_dependency_list(&self, call: &CallSite) -> Option<Vec<String>> {
        let root = self.root()?;
        let node = root.descendant_for_byte_range(call.byte, call.byte)?;
        let call_node = ancestor_of_kind(node, &["call_expression"])?;
        let args = call_node.child_by_field_name("arguments")?;
        if args.kind() != "arguments" {
            return None;
        }
        let dep = args.named_child(args.named_child_count().checked_sub(1)?)?;
        match dep.kind() {
            "array" => Some(scope::flatten_dependency_array(dep, root, &self.source)),
            "identifier" => {
                let name = dep.utf8_text(self.source.as_bytes()).ok()?;
                scope::resolve_array_initializer(root, &self.source, name, dep.start_byte())
            }
            _ => None,
        }
    }
}

fn language_for(file_path: &str, dialect: Dialect) -> tree_sitter::Language {
    let ext = file_path.rsplit('.').next().unwrap_or("");
    match dialect {
        Dialect::Markup => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Dialect::Plain => match ext {
            "js" | "mjs" | "cjs" => tree_sitter_javascript::LANGUAGE.into(),
            _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        },
    }
}

/// Climb until a node of one of `kinds` is found, starting at `node` itself.
fn ancestor_of_kind<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// One-pass tree walk that fills the model's site lists.
struct Extraction<'a, 'tree> {
    source: &'a str,
    root: Node<'tree>,
    model: &'a mut SourceModel,
    markup_occurrence: FxHashMap<String, usize>,
}

impl<'a, 'tree> Extraction<'a, 'tree> {
    fn walk(&mut self) {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            self.visit(node);
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
        if self.root.has_error() && self.model.error_count == 0 {
            self.model.error_count = 1;
        }
    }

    fn visit(&mut self, node: Node<'tree>) {
        match node.kind() {
            "ERROR" => self.model.error_count += 1,

            "function_declaration" | "generator_function_declaration" => {
                let name = self.field_text(node, "name");
                if !name.is_empty() {
                    let (scope_kind, scope_name) = self.enclosing_scope(node);
                    self.extract_function(node, name, scope_kind, scope_name, false, Visibility::Public);
                }
            }
            "method_definition" => {
                let name = self.field_text(node, "name");
                if !name.is_empty() {
                    let (scope_kind, scope_name) = self.enclosing_scope(node);
                    let is_static = has_token_child(node, "static");
                    let visibility = accessibility_of(node, self.source);
                    self.extract_function(node, name, scope_kind, scope_name, is_static, visibility);
                }
            }
            "variable_declarator" => {
                if let Some(value) = node.child_by_field_name("value") {
                    if is_function_node(value.kind()) {
                        let name = self.field_text(node, "name");
                        if !name.is_empty() {
                            let (scope_kind, scope_name) = self.enclosing_scope(node);
                            self.extract_bound_function(value, node, name, scope_kind, scope_name);
                        }
                    }
                }
            }
            "public_field_definition" | "field_definition" => {
                if let Some(value) = node.child_by_field_name("value") {
                    if is_function_node(value.kind()) {
                        let name = self.field_text(node, "name");
                        if !name.is_empty() {
                            let (scope_kind, scope_name) = self.enclosing_scope(node);
                            self.extract_bound_function(value, node, name, scope_kind, scope_name);
                        }
                    }
                }
            }

            "type_alias_declaration" => self.extract_type(node, TypeKind::Alias),
            "interface_declaration" => self.extract_type(node, TypeKind::Interface),
            "enum_declaration" => self.extract_type(node, TypeKind::Enum),

            "call_expression" => self.extract_call(node),
            "new_expression" => self.extract_new(node),

            "import_statement" => self.extract_import(node),

            "jsx_element" => {
                if let Some(opening) = node
                    .named_child(0)
                    .filter(|n| n.kind() == "jsx_opening_element")
                {
                    self.extract_markup(node, opening, false);
                }
            }
            "jsx_self_closing_element" => self.extract_markup(node, node, true),

            "assignment_expression" => {
                if let Some(left) = node.child_by_field_name("left") {
                    if is_member_target(left.kind()) {
                        let detail = node
                            .child_by_field_name("right")
                            .map(|r| normalize_ws(self.text(r)))
                            .unwrap_or_default();
                        self.push_mutation(node, left, "=", detail);
                    }
                }
            }
            "augmented_assignment_expression" => {
                if let Some(left) = node.child_by_field_name("left") {
                    if is_member_target(left.kind()) {
                        let op = self.field_text(node, "operator");
                        let detail = node
                            .child_by_field_name("right")
                            .map(|r| normalize_ws(self.text(r)))
                            .unwrap_or_default();
                        self.push_mutation(node, left, &op, detail);
                    }
                }
            }
            "update_expression" => {
                if let Some(arg) = node.child_by_field_name("argument") {
                    if is_member_target(arg.kind()) {
                        let op = self.field_text(node, "operator");
                        self.push_mutation(node, arg, &op, String::new());
                    }
                }
            }
            "unary_expression" => {
                if self.field_text(node, "operator") == "delete" {
                    if let Some(arg) = node.child_by_field_name("argument") {
                        self.push_mutation(node, arg, "delete", String::new());
                    }
                }
            }

            "await_expression" => {
                let target = node
                    .named_child(0)
                    .map(|n| normalize_ws(self.text(n)))
                    .unwrap_or_default();
                self.model.promise_ops.push(PromiseOp {
                    kind: PromiseOpKind::Await,
                    target,
                    enclosing_function: self.enclosing_function_name(node),
                    span: Span::from_ts_node(&node),
                });
            }

            "ternary_expression" => {
                self.model.ternaries.push(TernarySite {
                    condition: normalize_ws(&self.field_text(node, "condition")),
                    consequence: normalize_ws(&self.field_text(node, "consequence")),
                    alternative: normalize_ws(&self.field_text(node, "alternative")),
                    span: Span::from_ts_node(&node),
                });
            }

            "class_declaration" | "abstract_class_declaration" => self.extract_class(node),

            "lexical_declaration" | "variable_declaration" => {
                if self.is_module_level(node) {
                    self.extract_variables(node);
                }
            }

            _ => {}
        }
    }

    // ---- functions ----

    fn extract_function(
        &mut self,
        node: Node<'tree>,
        name: String,
        scope_kind: ScopeKind,
        scope_name: String,
        is_static: bool,
        visibility: Visibility,
    ) {
        let site = self.build_function_site(node, node, name, scope_kind, scope_name, is_static, visibility);
        self.model.functions.push(site);
    }

    /// A function-valued binding: the declarator gives the name, the value
    /// node carries parameters and body.
    fn extract_bound_function(
        &mut self,
        value: Node<'tree>,
        declarator: Node<'tree>,
        name: String,
        scope_kind: ScopeKind,
        scope_name: String,
    ) {
        let is_static = has_token_child(declarator, "static");
        let visibility = accessibility_of(declarator, self.source);
        let site =
            self.build_function_site(value, declarator, name, scope_kind, scope_name, is_static, visibility);
        self.model.functions.push(site);
    }

    fn build_function_site(
        &self,
        fn_node: Node<'tree>,
        span_node: Node<'tree>,
        name: String,
        scope_kind: ScopeKind,
        scope_name: String,
        is_static: bool,
        visibility: Visibility,
    ) -> FunctionSite {
        let mut params: SmallVec<[ParamSite; 4]> = SmallVec::new();
        let mut destructured_keys = BTreeSet::new();
        let mut params_text = String::from("()");

        if let Some(formal) = fn_node.child_by_field_name("parameters") {
            params_text = normalize_ws(self.text(formal));
            for i in 0..formal.named_child_count() {
                let Some(param) = formal.named_child(i) else {
                    continue;
                };
                if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                    // JavaScript grammar: parameters are bare patterns.
                    if param.kind() == "rest_pattern" {
                        params.push(ParamSite {
                            type_text: String::new(),
                            optional: false,
                            rest: true,
                        });
                    } else {
                        self.collect_destructured_keys(param, &mut destructured_keys);
                        params.push(ParamSite {
                            type_text: String::new(),
                            optional: false,
                            rest: false,
                        });
                    }
                    continue;
                }
                let pattern = param.child_by_field_name("pattern");
                let rest = pattern.is_some_and(|p| p.kind() == "rest_pattern");
                if let Some(p) = pattern {
                    self.collect_destructured_keys(p, &mut destructured_keys);
                }
                params.push(ParamSite {
                    type_text: param
                        .child_by_field_name("type")
                        .map(|t| self.annotation_text(t))
                        .unwrap_or_default(),
                    optional: param.kind() == "optional_parameter",
                    rest,
                });
            }
        } else if let Some(single) = fn_node.child_by_field_name("parameter") {
            // Arrow shorthand: `x => ...`
            params_text = format!("({})", normalize_ws(self.text(single)));
            params.push(ParamSite {
                type_text: String::new(),
                optional: false,
                rest: false,
            });
        }

        let return_type = fn_node
            .child_by_field_name("return_type")
            .map(|t| self.annotation_text(t));

        // Constraint and default text only; the parameter's name is not part
        // of the surface.
        let generic_params = fn_node
            .child_by_field_name("type_parameters")
            .map(|tp| {
                (0..tp.named_child_count())
                    .filter_map(|i| tp.named_child(i))
                    .filter(|n| n.kind() == "type_parameter")
                    .map(|n| {
                        let constraint = n
                            .child_by_field_name("constraint")
                            .map(|c| normalize_ws(self.text(c)))
                            .unwrap_or_default();
                        let default = n
                            .child_by_field_name("value")
                            .map(|c| normalize_ws(self.text(c)))
                            .unwrap_or_default();
                        format!("{constraint} {default}").trim().to_string()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let body_text = fn_node
            .child_by_field_name("body")
            .map(|b| self.text(b).to_string())
            .unwrap_or_default();

        let signature_text = match &return_type {
            Some(ret) => format!("{name}{params_text}: {ret}"),
            None => format!("{name}{params_text}"),
        };

        FunctionSite {
            name,
            scope_kind,
            scope_name,
            is_static,
            visibility,
            is_async: self.text(fn_node).trim_start().starts_with("async"),
            signature_text,
            return_type,
            params,
            destructured_keys,
            generic_params,
            body_text,
            span: Span::from_ts_node(&span_node),
        }
    }

    fn collect_destructured_keys(&self, pattern: Node<'tree>, keys: &mut BTreeSet<String>) {
        if pattern.kind() != "object_pattern" {
            return;
        }
        for i in 0..pattern.named_child_count() {
            let Some(entry) = pattern.named_child(i) else {
                continue;
            };
            match entry.kind() {
                "shorthand_property_identifier_pattern" => {
                    keys.insert(self.text(entry).to_string());
                }
                "pair_pattern" => {
                    let key = self.field_text(entry, "key");
                    if !key.is_empty() {
                        keys.insert(key);
                    }
                }
                "object_assignment_pattern" => {
                    if let Some(left) = entry.child_by_field_name("left") {
                        keys.insert(self.text(left).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    // ---- types ----

    fn extract_type(&mut self, node: Node<'tree>, kind: TypeKind) {
        let name = self.field_text(node, "name");
        if name.is_empty() {
            return;
        }

        let members;
        let mut body_text;
        match kind {
            TypeKind::Alias => {
                let value = node.child_by_field_name("value");
                members = value.map(|v| self.object_members(v)).unwrap_or_default();
                body_text = value.map(|v| normalize_ws(self.text(v))).unwrap_or_default();
            }
            TypeKind::Interface => {
                let body = node.child_by_field_name("body");
                members = body.map(|b| self.object_members(b)).unwrap_or_default();
                body_text = body.map(|b| normalize_ws(self.text(b))).unwrap_or_default();
                // Heritage participates in the definition comparison.
                for i in 0..node.named_child_count() {
                    if let Some(child) = node.named_child(i) {
                        if child.kind() == "extends_type_clause" {
                            body_text = format!("{} {}", normalize_ws(self.text(child)), body_text);
                        }
                    }
                }
            }
            TypeKind::Enum => {
                members = Vec::new();
                body_text = node
                    .child_by_field_name("body")
                    .map(|b| normalize_ws(self.text(b)))
                    .unwrap_or_default();
            }
        }

        self.model.types.push(TypeSite {
            name,
            kind,
            definition_text: normalize_ws(self.text(node)),
            body_text,
            type_params: node
                .child_by_field_name("type_parameters")
                .map(|tp| normalize_ws(self.text(tp))),
            members,
            span: Span::from_ts_node(&node),
        });
    }

    fn object_members(&self, body: Node<'tree>) -> Vec<TypeMember> {
        if !matches!(body.kind(), "object_type" | "interface_body") {
            return Vec::new();
        }
        let mut members = Vec::new();
        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else {
                continue;
            };
            match member.kind() {
                "property_signature" => {
                    let name = self.field_text(member, "name");
                    if name.is_empty() {
                        continue;
                    }
                    members.push(TypeMember {
                        name,
                        optional: has_token_child(member, "?"),
                        type_text: member
                            .child_by_field_name("type")
                            .map(|t| self.annotation_text(t))
                            .unwrap_or_default(),
                    });
                }
                "method_signature" => {
                    let name = self.field_text(member, "name");
                    if name.is_empty() {
                        continue;
                    }
                    members.push(TypeMember {
                        name,
                        optional: has_token_child(member, "?"),
                        type_text: normalize_ws(self.text(member)),
                    });
                }
                _ => {}
            }
        }
        members
    }

    // ---- calls ----

    fn extract_call(&mut self, node: Node<'tree>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee_text = normalize_ws(self.text(function));
        if callee_text.is_empty() {
            return;
        }
        let path = normalize_access_path(&callee_text);

        let mut args = Vec::new();
        let mut template_text = None;
        if let Some(arguments) = node.child_by_field_name("arguments") {
            if arguments.kind() == "template_string" {
                template_text = Some(normalize_ws(self.text(arguments)));
            } else {
                for i in 0..arguments.named_child_count() {
                    if let Some(arg) = arguments.named_child(i) {
                        args.push(normalize_ws(self.text(arg)));
                    }
                }
            }
        }

        // Mutating method call on a receiver is also an in-place mutation.
        if function.kind() == "member_expression" {
            let property = self.field_text(function, "property");
            if MUTATING_METHODS.contains(&property.as_str()) {
                if let Some(receiver) = function.child_by_field_name("object") {
                    self.model.mutations.push(MutationSite {
                        target: normalize_access_path(&normalize_ws(self.text(receiver))),
                        op: property.clone(),
                        detail: args.join(", "),
                        span: Span::from_ts_node(&node),
                    });
                }
            }
            // Promise chain step.
            if matches!(property.as_str(), "then" | "catch" | "finally") {
                let receiver = function
                    .child_by_field_name("object")
                    .map(|r| normalize_access_path(&normalize_ws(self.text(r))))
                    .unwrap_or_default();
                self.model.promise_ops.push(PromiseOp {
                    kind: match property.as_str() {
                        "then" => PromiseOpKind::Then,
                        "catch" => PromiseOpKind::Catch,
                        _ => PromiseOpKind::Finally,
                    },
                    target: receiver,
                    enclosing_function: self.enclosing_function_name(node),
                    span: Span::from_ts_node(&node),
                });
            }
        }

        // Promise.<combinator>(...)
        if let Some(comb) = path.strip_prefix("Promise.") {
            if PROMISE_COMBINATORS.contains(&comb) {
                self.model.promise_ops.push(PromiseOp {
                    kind: PromiseOpKind::Combinator,
                    target: path.clone(),
                    enclosing_function: self.enclosing_function_name(node),
                    span: Span::from_ts_node(&node),
                });
            }
        }

        self.model.calls.push(CallSite {
            callee_text,
            path,
            args,
            is_new: false,
            template_text,
            span: Span::from_ts_node(&node),
            byte: node.start_byte(),
            enclosing_function: self.enclosing_function_name(node),
        });
    }

    fn extract_new(&mut self, node: Node<'tree>) {
        let Some(constructor) = node.child_by_field_name("constructor") else {
            return;
        };
        let callee_text = normalize_ws(self.text(constructor));
        if callee_text.is_empty() {
            return;
        }
        let mut args = Vec::new();
        if let Some(arguments) = node.child_by_field_name("arguments") {
            for i in 0..arguments.named_child_count() {
                if let Some(arg) = arguments.named_child(i) {
                    args.push(normalize_ws(self.text(arg)));
                }
            }
        }
        if callee_text == "Promise" {
            self.model.promise_ops.push(PromiseOp {
                kind: PromiseOpKind::NewPromise,
                target: "Promise".to_string(),
                enclosing_function: self.enclosing_function_name(node),
                span: Span::from_ts_node(&node),
            });
        }
        self.model.calls.push(CallSite {
            path: normalize_access_path(&callee_text),
            callee_text,
            args,
            is_new: true,
            template_text: None,
            span: Span::from_ts_node(&node),
            byte: node.start_byte(),
            enclosing_function: self.enclosing_function_name(node),
        });
    }

    // ---- imports ----

    fn extract_import(&mut self, node: Node<'tree>) {
        let module = self
            .field_text(node, "source")
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();
        if module.is_empty() {
            return;
        }

        let statement_text = normalize_ws(self.text(node));
        let is_type_only = statement_text.starts_with("import type ");

        let mut specifiers = Vec::new();
        let mut clause = None;
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                if child.kind() == "import_clause" {
                    clause = Some(child);
                    break;
                }
            }
        }

        if let Some(clause) = clause {
            for i in 0..clause.named_child_count() {
                let Some(part) = clause.named_child(i) else {
                    continue;
                };
                match part.kind() {
                    "identifier" => specifiers.push(ImportSpecifier {
                        name: "default".to_string(),
                        alias: Some(self.text(part).to_string()),
                    }),
                    "namespace_import" => {
                        let local = part
                            .named_child(0)
                            .map(|n| self.text(n).to_string())
                            .unwrap_or_default();
                        specifiers.push(ImportSpecifier {
                            name: "*".to_string(),
                            alias: Some(local),
                        });
                    }
                    "named_imports" => {
                        for j in 0..part.named_child_count() {
                            let Some(spec) = part.named_child(j) else {
                                continue;
                            };
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            // `import { type Foo }` has no runtime effect.
                            if has_token_child(spec, "type") {
                                continue;
                            }
                            let name = self.field_text(spec, "name");
                            if name.is_empty() {
                                continue;
                            }
                            let alias = spec
                                .child_by_field_name("alias")
                                .map(|a| self.text(a).to_string());
                            specifiers.push(ImportSpecifier { name, alias });
                        }
                    }
                    _ => {}
                }
            }
        }

        let order_index = self.model.imports.len();
        self.model.imports.push(ImportSite {
            module,
            side_effect_only: clause.is_none() && !is_type_only,
            specifiers,
            is_type_only,
            order_index,
            span: Span::from_ts_node(&node),
        });
    }

    // ---- markup ----

    fn extract_markup(&mut self, element: Node<'tree>, opening: Node<'tree>, self_closing: bool) {
        let tag = opening
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_else(|| "#fragment".to_string());

        let mut attributes = Vec::new();
        let mut key = None;
        for i in 0..opening.named_child_count() {
            let Some(child) = opening.named_child(i) else {
                continue;
            };
            match child.kind() {
                "jsx_attribute" => {
                    let name = child
                        .named_child(0)
                        .map(|n| self.text(n).to_string())
                        .unwrap_or_default();
                    let value = child.named_child(1).map(|v| normalize_ws(self.text(v)));
                    if name == "key" {
                        key = value.clone();
                    }
                    attributes.push(MarkupAttribute {
                        name,
                        value,
                        is_spread: false,
                    });
                }
                "jsx_expression" => attributes.push(MarkupAttribute {
                    name: normalize_ws(self.text(child)),
                    value: None,
                    is_spread: true,
                }),
                _ => {}
            }
        }

        let occurrence = {
            let counter = self.markup_occurrence.entry(tag.clone()).or_insert(0);
            let current = *counter;
            *counter += 1;
            current
        };

        self.model.markup.push(MarkupElement {
            tag,
            attributes,
            key,
            occurrence,
            self_closing,
            span: Span::from_ts_node(&element),
        });
    }

    // ---- mutations ----

    fn push_mutation(&mut self, node: Node<'tree>, target: Node<'tree>, op: &str, detail: String) {
        self.model.mutations.push(MutationSite {
            target: normalize_access_path(&normalize_ws(self.text(target))),
            op: op.to_string(),
            detail,
            span: Span::from_ts_node(&node),
        });
    }

    // ---- classes & variables ----

    fn extract_class(&mut self, node: Node<'tree>) {
        let name = self.field_text(node, "name");
        if name.is_empty() {
            return;
        }

        let mut extends = None;
        let mut implements = Vec::new();
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i) else {
                continue;
            };
            if child.kind() != "class_heritage" {
                continue;
            }
            for j in 0..child.named_child_count() {
                let Some(clause) = child.named_child(j) else {
                    continue;
                };
                match clause.kind() {
                    "extends_clause" => {
                        extends = clause.named_child(0).map(|n| normalize_ws(self.text(n)));
                    }
                    "implements_clause" => {
                        for k in 0..clause.named_child_count() {
                            if let Some(ty) = clause.named_child(k) {
                                implements.push(normalize_ws(self.text(ty)));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for i in 0..body.named_child_count() {
                let Some(member) = body.named_child(i) else {
                    continue;
                };
                let kind = match member.kind() {
                    "method_definition" => MemberKind::Method,
                    "public_field_definition" | "field_definition" => MemberKind::Property,
                    _ => continue,
                };
                let member_name = self.field_text(member, "name");
                if member_name.is_empty() {
                    continue;
                }
                members.push(ClassMember {
                    name: member_name,
                    kind,
                    is_static: has_token_child(member, "static"),
                    visibility: accessibility_of(member, self.source),
                });
            }
        }

        self.model.classes.push(ClassShape {
            name,
            extends,
            implements,
            members,
            span: Span::from_ts_node(&node),
        });
    }

    fn extract_variables(&mut self, node: Node<'tree>) {
        let decl_kind = node
            .child(0)
            .map(|t| self.text(t).to_string())
            .unwrap_or_else(|| "var".to_string());

        for i in 0..node.named_child_count() {
            let Some(declarator) = node.named_child(i) else {
                continue;
            };
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name_node = declarator.child_by_field_name("name");
            let name = match name_node {
                Some(n) if n.kind() == "identifier" => self.text(n).to_string(),
                _ => continue,
            };
            // Function-valued bindings are covered by the function surface.
            if declarator
                .child_by_field_name("value")
                .is_some_and(|v| is_function_node(v.kind()))
            {
                continue;
            }
            self.model.variables.push(VariableSite {
                name,
                decl_kind: decl_kind.clone(),
                type_text: declarator
                    .child_by_field_name("type")
                    .map(|t| self.annotation_text(t)),
                initializer: declarator
                    .child_by_field_name("value")
                    .map(|v| normalize_ws(self.text(v))),
                span: Span::from_ts_node(&declarator),
            });
        }
    }

    /// Module-level: the declaration's parent is the program, possibly
    /// through an export statement.
    fn is_module_level(&self, node: Node<'tree>) -> bool {
        match node.parent() {
            Some(p) if p.kind() == "program" => true,
            Some(p) if p.kind() == "export_statement" => {
                p.parent().is_some_and(|gp| gp.kind() == "program")
            }
            _ => false,
        }
    }

    // ---- shared helpers ----

    fn text(&self, node: Node<'tree>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn field_text(&self, node: Node<'tree>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }

    /// Type annotation text with the leading `:` removed.
    fn annotation_text(&self, node: Node<'tree>) -> String {
        let text = normalize_ws(self.text(node));
        text.strip_prefix(':').map(|t| t.trim().to_string()).unwrap_or(text)
    }

    fn enclosing_scope(&self, node: Node<'tree>) -> (ScopeKind, String) {
        let mut current = node.parent();
        while let Some(n) = current {
            match n.kind() {
                "class_declaration" | "abstract_class_declaration" | "class" => {
                    return (ScopeKind::Class, self.field_text(n, "name"));
                }
                "function_declaration" | "generator_function_declaration" | "method_definition" => {
                    return (ScopeKind::Function, self.field_text(n, "name"));
                }
                "arrow_function" | "function_expression" | "function" | "generator_function" => {
                    let name = n
                        .parent()
                        .filter(|p| p.kind() == "variable_declarator")
                        .map(|p| self.field_text(p, "name"))
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "(anonymous)".to_string());
                    return (ScopeKind::Function, name);
                }
                _ => {}
            }
            current = n.parent();
        }
        (ScopeKind::Module, String::new())
    }

    fn enclosing_function_name(&self, node: Node<'tree>) -> String {
        let mut current = node.parent();
        while let Some(n) = current {
            match n.kind() {
                "function_declaration" | "generator_function_declaration" | "method_definition" => {
                    return self.field_text(n, "name");
                }
                "arrow_function" | "function_expression" | "function" | "generator_function" => {
                    if let Some(p) = n.parent().filter(|p| p.kind() == "variable_declarator") {
                        let name = self.field_text(p, "name");
                        if !name.is_empty() {
                            return name;
                        }
                    }
                }
                _ => {}
            }
            current = n.parent();
        }
        String::new()
    }
}

fn is_function_node(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn is_member_target(kind: &str) -> bool {
    matches!(kind, "member_expression" | "subscript_expression")
}

/// True when the node has an anonymous child token of exactly `token`.
fn has_token_child(node: Node<'_>, token: &str) -> bool {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if !child.is_named() && child.kind() == token {
                return true;
            }
        }
    }
    false
}

fn accessibility_of(node: Node<'_>, source: &str) -> Visibility {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == "accessibility_modifier" {
                return match child.utf8_text(source.as_bytes()).unwrap_or("") {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                };
            }
        }
    }
    Visibility::Public
}
