//! Unique-key pairing over immutable remaining pools.
//!
//! Each pairing pass consumes two pools and returns the pairs it claimed plus
//! the remaining unclaimed items. Passes are pure functions; cascades thread
//! the remainders through instead of mutating shared "claimed" sets.

use rustc_hash::FxHashMap;

/// Result of one pairing pass.
pub struct Paired<T> {
    pub pairs: Vec<(T, T)>,
    pub remaining_base: Vec<T>,
    pub remaining_head: Vec<T>,
}

/// Pair items whose key is unique on both sides. An item whose key occurs
/// more than once on either side is left in the remainder, since the match
/// would be ambiguous.
pub fn pair_by_unique_key<T, K, F>(base: Vec<T>, head: Vec<T>, key_fn: F) -> Paired<T>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&T) -> K,
{
    let base_counts = count_keys(&base, &key_fn);
    let head_counts = count_keys(&head, &key_fn);

    let mut head_by_key: FxHashMap<K, Vec<T>> = FxHashMap::default();
    let mut remaining_head = Vec::new();
    for item in head {
        let k = key_fn(&item);
        if base_counts.get(&k) == Some(&1) && head_counts.get(&k) == Some(&1) {
            head_by_key.entry(k).or_default().push(item);
        } else {
            remaining_head.push(item);
        }
    }

    let mut pairs = Vec::new();
    let mut remaining_base = Vec::new();
    for item in base {
        let k = key_fn(&item);
        match head_by_key.get_mut(&k).and_then(|v| v.pop()) {
            Some(partner) => pairs.push((item, partner)),
            None => remaining_base.push(item),
        }
    }

    // Keys present only on head fall through to the remainder.
    for (_, leftover) in head_by_key {
        remaining_head.extend(leftover);
    }

    Paired {
        pairs,
        remaining_base,
        remaining_head,
    }
}

fn count_keys<T, K, F>(items: &[T], key_fn: &F) -> FxHashMap<K, usize>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&T) -> K,
{
    let mut counts = FxHashMap::default();
    for item in items {
        *counts.entry(key_fn(item)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_unique_keys_only() {
        let base = vec!["a", "b", "b", "c"];
        let head = vec!["a", "b", "d"];
        let result = pair_by_unique_key(base, head, |s| s.to_string());

        // "a" is unique on both sides; "b" is duplicated on base, "c"/"d" unmatched.
        assert_eq!(result.pairs, vec![("a", "a")]);
        assert_eq!(result.remaining_base, vec!["b", "b", "c"]);
        assert!(result.remaining_head.contains(&"b"));
        assert!(result.remaining_head.contains(&"d"));
    }

    #[test]
    fn empty_pools() {
        let result = pair_by_unique_key(Vec::<&str>::new(), vec!["x"], |s| s.to_string());
        assert!(result.pairs.is_empty());
        assert_eq!(result.remaining_head, vec!["x"]);
    }
}
