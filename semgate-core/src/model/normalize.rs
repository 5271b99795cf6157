//! Text normalization and type-idiom canonicalization.
//!
//! Purely syntactic rewrites must never register as changes: whitespace and
//! comments are stripped, the generic list-wrapper and array-suffix forms
//! collapse to one spelling, commutative utility-wrapper chains are
//! reordered canonically, and union members compare order-insensitively.

/// Utility wrappers that commute with each other.
const COMMUTATIVE_WRAPPERS: &[&str] = &["Partial", "Readonly", "Required"];

/// Strip `//` and `/* */` comments, string-literal aware.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut in_string: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        if let Some(quote) = in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                in_string = Some(c);
                out.push(c);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
                out.push(' ');
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Collapse whitespace runs to single spaces and trim. Display form.
pub fn normalize_ws(text: &str) -> String {
    strip_comments(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical comparison form of a type text. Deterministic, so two
/// semantically-commutative spellings compare equal.
pub fn canonical_type(text: &str) -> String {
    let stripped: String = strip_comments(text).chars().filter(|c| !c.is_whitespace()).collect();
    canonical_inner(&stripped)
}

fn canonical_inner(text: &str) -> String {
    // Union members are order-insensitive.
    let members = split_top_level(text, '|');
    if members.len() > 1 {
        let mut canonical: Vec<String> = members.iter().map(|m| canonical_inner(m)).collect();
        canonical.sort();
        return canonical.join("|");
    }

    let text = collapse_wrapper_chain(text);

    // Array<T> and T[] collapse to the suffix form.
    if let Some(inner) = unwrap_generic(&text, "Array") {
        return format!("{}[]", wrap_if_union(&canonical_inner(inner)));
    }
    if let Some(inner) = unwrap_generic(&text, "ReadonlyArray") {
        return format!("readonly{}[]", wrap_if_union(&canonical_inner(inner)));
    }
    if let Some(base) = text.strip_suffix("[]") {
        return format!("{}[]", canonical_inner(base));
    }

    // Recurse into generic argument lists: Map<K, Array<V>> ~ Map<K, V[]>.
    if let Some((name, args)) = split_generic(&text) {
        let args: Vec<String> = split_top_level(args, ',')
            .iter()
            .map(|a| canonical_inner(a))
            .collect();
        return format!("{name}<{}>", args.join(","));
    }

    text
}

/// If `text` is `Name<args>` with the final `>` closing the first top-level
/// `<`, return `(Name, args)`.
fn split_generic(text: &str) -> Option<(&str, &str)> {
    if !text.ends_with('>') {
        return None;
    }
    let lt = text.find('<')?;
    let name = &text[..lt];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return None;
    }
    let body = &text[lt + 1..text.len() - 1];
    let mut depth = 1;
    for c in body.chars() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some((name, body))
}

/// Parenthesize a canonical member when the suffix form would rebind: the
/// element type of `Array<A|B>` is `(A|B)[]`.
fn wrap_if_union(inner: &str) -> String {
    if split_top_level(inner, '|').len() > 1 {
        format!("({inner})")
    } else {
        inner.to_string()
    }
}

/// Sort chains of commutative single-argument wrappers: `Partial<Readonly<T>>`
/// and `Readonly<Partial<T>>` both become `Partial<Readonly<T>>`.
fn collapse_wrapper_chain(text: &str) -> String {
    let mut wrappers = Vec::new();
    let mut current = text.to_string();

    loop {
        let mut advanced = false;
        for name in COMMUTATIVE_WRAPPERS {
            if let Some(inner) = unwrap_generic(&current, name) {
                wrappers.push(*name);
                current = inner.to_string();
                advanced = true;
                break;
            }
        }
        if !advanced {
            break;
        }
    }

    if wrappers.is_empty() {
        return current;
    }
    wrappers.sort();
    let mut result = canonical_inner(&current);
    for name in wrappers.into_iter().rev() {
        result = format!("{name}<{result}>");
    }
    result
}

/// If `text` is exactly `Name<inner>`, return `inner`.
fn unwrap_generic<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(name)?.strip_prefix('<')?;
    let body = rest.strip_suffix('>')?;
    // The stripped '>' must close the '<' we stripped, not a nested one.
    let mut depth = 1;
    for c in body.chars() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(body)
}

/// Split at top-level occurrences of `sep`, respecting `<>`, `()`, `[]`,
/// `{}` nesting and string literals.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            current.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                in_string = Some(c);
                current.push(c);
            }
            '<' | '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_stripped() {
        assert_eq!(normalize_ws("a /* inline */ b // tail"), "a b");
        assert_eq!(normalize_ws("s = \"// not a comment\""), "s = \"// not a comment\"");
    }

    #[test]
    fn array_forms_collapse() {
        assert_eq!(canonical_type("Array<number>"), canonical_type("number[]"));
        assert_eq!(canonical_type("Array<Array<string>>"), canonical_type("string[][]"));
        assert_eq!(
            canonical_type("ReadonlyArray<number>"),
            canonical_type("readonly number[]")
        );
    }

    #[test]
    fn union_order_is_canonical() {
        assert_eq!(canonical_type("A | B | C"), canonical_type("C | A | B"));
        assert_ne!(canonical_type("A | B"), canonical_type("A | B | C"));
    }

    #[test]
    fn commutative_wrappers_reorder() {
        assert_eq!(
            canonical_type("Partial<Readonly<T>>"),
            canonical_type("Readonly<Partial<T>>")
        );
        assert_ne!(canonical_type("Partial<T>"), canonical_type("Required<T>"));
    }

    #[test]
    fn union_element_arrays_keep_grouping() {
        assert_eq!(canonical_type("Array<A | B>"), "(A|B)[]");
        assert_ne!(canonical_type("Array<A | B>"), canonical_type("A | B[]"));
    }

    #[test]
    fn nested_generic_arguments_canonicalize() {
        assert_eq!(
            canonical_type("Map<string, Array<number>>"),
            canonical_type("Map<string, number[]>")
        );
        assert_eq!(
            canonical_type("Promise<A | B>"),
            canonical_type("Promise<B | A>")
        );
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(split_top_level("A|Map<K,V|W>", '|'), vec!["A", "Map<K,V|W>"]);
    }
}
