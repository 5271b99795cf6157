//! Structural model: extraction, normalization, and the site types.

pub mod extractor;
pub mod normalize;
pub mod types;

pub use extractor::SourceModel;
pub use types::*;
