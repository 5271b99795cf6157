//! Multiset and ordered-sequence equality.

use rustc_hash::FxHashMap;

/// True when both sequences contain the same elements with the same
/// multiplicities, regardless of order.
pub fn multiset_equal<T: std::hash::Hash + Eq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: FxHashMap<&T, i64> = FxHashMap::default();
    for item in a {
        *counts.entry(item).or_insert(0) += 1;
    }
    for item in b {
        match counts.get_mut(item) {
            Some(c) => *c -= 1,
            None => return false,
        }
    }
    counts.values().all(|&c| c == 0)
}

/// True when both sequences are element-wise equal.
pub fn ordered_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiset_ignores_order() {
        assert!(multiset_equal(&["a", "b", "b"], &["b", "a", "b"]));
        assert!(!multiset_equal(&["a", "b"], &["a", "a"]));
        assert!(!multiset_equal(&["a"], &["a", "a"]));
    }

    #[test]
    fn ordered_is_strict() {
        assert!(ordered_equal(&[1, 2, 3], &[1, 2, 3]));
        assert!(!ordered_equal(&[1, 2, 3], &[3, 2, 1]));
    }
}
