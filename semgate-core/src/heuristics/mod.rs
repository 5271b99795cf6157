//! Shared matching and equivalence primitives used by the category analyzers.

pub mod pairing;
pub mod paths;
pub mod scope;
pub mod sets;
pub mod similarity;

pub use pairing::{pair_by_unique_key, Paired};
pub use paths::{normalize_access_path, suffix_path};
pub use scope::resolve_array_initializer;
pub use sets::{multiset_equal, ordered_equal};
pub use similarity::similarity_ratio;
