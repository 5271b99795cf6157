//! Nearest-enclosing-scope resolution of array-literal initializers.
//!
//! Used by the hook dependency check: a dependency list given as a bare
//! identifier is expanded to the contents of the closest `const x = [...]`
//! declaration, walking from the use site's innermost block outward so an
//! inner shadowing declaration always wins over an outer one.

use tree_sitter::Node;

/// Recursion guard for spread expansion.
const MAX_SPREAD_DEPTH: usize = 8;

/// Resolve `name` to a flattened list of array-element texts, starting from
/// the scope enclosing `use_byte`. Spread elements referring to other
/// in-scope array literals are expanded recursively; anything unresolvable
/// is kept verbatim.
pub fn resolve_array_initializer(
    root: Node<'_>,
    source: &str,
    name: &str,
    use_byte: usize,
) -> Option<Vec<String>> {
    resolve_inner(root, source, name, use_byte, 0)
}

/// Flatten an array-literal node into element texts, expanding spreads of
/// in-scope array identifiers. Used for inline dependency arrays.
pub fn flatten_dependency_array(array: Node<'_>, root: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    flatten_array(array, root, source, 0, &mut out);
    out
}

fn resolve_inner(
    root: Node<'_>,
    source: &str,
    name: &str,
    use_byte: usize,
    depth: usize,
) -> Option<Vec<String>> {
    if depth > MAX_SPREAD_DEPTH {
        return None;
    }
    let array = find_declaration(root, source, name, use_byte)?;
    let mut out = Vec::new();
    flatten_array(array, root, source, depth, &mut out);
    Some(out)
}

/// Walk from the node at `use_byte` outward through enclosing blocks,
/// returning the array node of the first matching declaration.
fn find_declaration<'a>(
    root: Node<'a>,
    source: &str,
    name: &str,
    use_byte: usize,
) -> Option<Node<'a>> {
    let mut current = root.descendant_for_byte_range(use_byte, use_byte)?;

    loop {
        if is_scope(current.kind()) {
            if let Some(array) = scan_scope_declarations(current, source, name) {
                return Some(array);
            }
        }
        current = current.parent()?;
    }
}

fn is_scope(kind: &str) -> bool {
    matches!(kind, "statement_block" | "program")
}

/// Scan the immediate statements of a scope for `const/let/var name = [...]`.
fn scan_scope_declarations<'a>(scope: Node<'a>, source: &str, name: &str) -> Option<Node<'a>> {
    for i in 0..scope.named_child_count() {
        let stmt = scope.named_child(i)?;
        if !matches!(stmt.kind(), "lexical_declaration" | "variable_declaration") {
            continue;
        }
        for j in 0..stmt.named_child_count() {
            let declarator = match stmt.named_child(j) {
                Some(d) if d.kind() == "variable_declarator" => d,
                _ => continue,
            };
            let declared = declarator
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source.as_bytes()).ok())
                .unwrap_or("");
            if declared != name {
                continue;
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                if value.kind() == "array" {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Collect element texts, expanding spreads of in-scope array identifiers.
fn flatten_array(array: Node<'_>, root: Node<'_>, source: &str, depth: usize, out: &mut Vec<String>) {
    for i in 0..array.named_child_count() {
        let Some(elem) = array.named_child(i) else {
            continue;
        };
        if elem.kind() == "spread_element" {
            let inner = elem.named_child(0);
            let inner_name = inner
                .filter(|n| n.kind() == "identifier")
                .and_then(|n| n.utf8_text(source.as_bytes()).ok());
            if let Some(inner_name) = inner_name {
                if let Some(expanded) =
                    resolve_inner(root, source, inner_name, elem.start_byte(), depth + 1)
                {
                    out.extend(expanded);
                    continue;
                }
            }
            // Unresolvable spread stays verbatim.
            out.push(node_text(elem, source));
        } else {
            out.push(node_text(elem, source));
        }
    }
}

fn node_text(node: Node<'_>, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
