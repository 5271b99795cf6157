//! Category analyzers: independent pure diff functions over two models.
//!
//! Shared contract: `diff(base, head, params)` is deterministic and
//! side-effect free; calling twice with identical input yields identical
//! output. Analyzers never edit each other's records; merging is the
//! aggregator's job.

pub mod calls;
pub mod functions;
pub mod hooks;
pub mod imports;
pub mod markup;
pub mod mutations;
pub mod promises;
pub mod shape;
pub mod ternaries;
pub mod type_defs;

use globset::GlobSet;

use crate::model::SourceModel;
use crate::records::{Category, ChangeRecord};

/// Per-invocation parameters shared by all analyzers.
#[derive(Default)]
pub struct AnalyzerParams<'a> {
    /// Callee patterns whose removal is riskier than an ordinary call edit.
    pub side_effect_callees: Option<&'a GlobSet>,
}

/// Trait every category analyzer implements.
pub trait Analyzer: Send + Sync {
    /// The category this analyzer reports under.
    fn category(&self) -> Category;

    /// Diff two structural models into change records.
    fn diff(
        &self,
        base: &SourceModel,
        head: &SourceModel,
        params: &AnalyzerParams<'_>,
    ) -> Vec<ChangeRecord>;
}

/// All category analyzers, in a fixed registry order.
pub fn all_analyzers() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(functions::FunctionSurfaceAnalyzer),
        Box::new(calls::CallSiteAnalyzer),
        Box::new(type_defs::TypeDefinitionAnalyzer),
        Box::new(imports::ImportStructureAnalyzer),
        Box::new(markup::MarkupAnalyzer),
        Box::new(hooks::HookUsageAnalyzer),
        Box::new(mutations::MutationAnalyzer),
        Box::new(promises::PromiseUsageAnalyzer),
        Box::new(ternaries::TernaryAnalyzer),
        Box::new(shape::ShapeAnalyzer),
    ]
}
