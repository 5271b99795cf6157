//! Member-access path normalization.
//!
//! Collapses optional chaining and bracket/string property access into one
//! dotted form so `obj?.m`, `obj.m` and `obj["m"]` all compare equal.

/// Normalize a callee/member expression text into a canonical dotted path.
///
/// `a?.b["c"].d?.()` becomes `a.b.c.d`. Whitespace inside the path is
/// dropped. Computed accesses with non-literal keys keep their bracket text
/// verbatim, since they are not statically equivalent to a dotted member.
pub fn normalize_access_path(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '?' if chars.get(i + 1) == Some(&'.') => {
                // `?.` is a plain member step, or the call form `?.(` which
                // contributes nothing to the path.
                if chars.get(i + 2) != Some(&'(') && chars.get(i + 2) != Some(&'[') {
                    out.push('.');
                }
                i += 2;
            }
            '[' => {
                match literal_key(&chars[i..]) {
                    Some((key, consumed)) => {
                        out.push('.');
                        out.push_str(&key);
                        i += consumed;
                    }
                    None => {
                        // Non-literal computed access: keep verbatim until the
                        // matching bracket.
                        let mut depth = 0;
                        while i < chars.len() {
                            let ch = chars[i];
                            out.push(ch);
                            if ch == '[' {
                                depth += 1;
                            } else if ch == ']' {
                                depth -= 1;
                                if depth == 0 {
                                    i += 1;
                                    break;
                                }
                            }
                            i += 1;
                        }
                    }
                }
            }
            c if c.is_whitespace() => {
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Parse a `["key"]` / `['key']` access starting at `chars[0] == '['`.
/// Returns the key and the number of characters consumed.
fn literal_key(chars: &[char]) -> Option<(String, usize)> {
    let mut i = 1;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    let quote = *chars.get(i)?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    i += 1;
    let mut key = String::new();
    while i < chars.len() && chars[i] != quote {
        key.push(chars[i]);
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    i += 1; // closing quote
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if chars.get(i) != Some(&']') {
        return None;
    }
    Some((key, i + 1))
}

/// The path with its leading segment removed: `this.client.send` → `client.send`.
/// Returns `None` for single-segment paths.
pub fn suffix_path(normalized: &str) -> Option<&str> {
    normalized.split_once('.').map(|(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_chaining_collapses() {
        assert_eq!(normalize_access_path("obj?.m"), "obj.m");
        assert_eq!(normalize_access_path("obj.m"), "obj.m");
        assert_eq!(normalize_access_path("a?.b?.c"), "a.b.c");
    }

    #[test]
    fn bracket_string_access_collapses() {
        assert_eq!(normalize_access_path("obj[\"m\"]"), "obj.m");
        assert_eq!(normalize_access_path("obj['m'].n"), "obj.m.n");
    }

    #[test]
    fn optional_call_form_is_transparent() {
        assert_eq!(normalize_access_path("obj.m?."), "obj.m");
    }

    #[test]
    fn computed_access_is_kept() {
        assert_eq!(normalize_access_path("obj[key]"), "obj[key]");
    }

    #[test]
    fn suffix_drops_leading_segment() {
        assert_eq!(suffix_path("this.client.send"), Some("client.send"));
        assert_eq!(suffix_path("send"), None);
    }
}
