//! Configuration resolver: effective severity and enablement per change
//! kind, plus the tests-required decision. Thin policy layer over
//! `AnalyzerConfig`, consumed by the aggregator.

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use super::types::AnalyzerConfig;
use crate::records::{Category, ChangeKind, ChangeRecord, Severity};

/// Resolved view of an `AnalyzerConfig` with compiled glob sets.
pub struct ConfigResolver {
    config: AnalyzerConfig,
    include: GlobSet,
    exclude: GlobSet,
    side_effects: GlobSet,
    always_tests: GlobSet,
    never_tests: GlobSet,
}

impl ConfigResolver {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            include: build_globset(&config.include, "include"),
            exclude: build_globset(&config.exclude, "exclude"),
            side_effects: build_globset(&config.side_effect_callees, "side-effect-callees"),
            always_tests: build_globset(&config.always_require_tests, "always-require-tests"),
            never_tests: build_globset(&config.never_require_tests, "never-require-tests"),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Candidate-file filter: empty include list admits everything.
    pub fn file_included(&self, path: &str) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(path)
    }

    pub fn is_category_enabled(&self, category: Category) -> bool {
        !self
            .config
            .disabled_categories
            .iter()
            .any(|name| name == category.name())
    }

    pub fn is_kind_enabled(&self, kind: ChangeKind) -> bool {
        if !self.is_category_enabled(kind.category()) {
            return false;
        }
        let name = kind.name();
        !self.config.disabled_kinds.iter().any(|k| *k == name)
    }

    /// Configured override for a kind, if any. Applied on top of whatever
    /// severity the analyzer computed.
    pub fn severity_override(&self, kind: ChangeKind) -> Option<Severity> {
        self.config.severity_overrides.get(&kind.name()).copied()
    }

    /// Side-effect callee patterns, when any are configured.
    pub fn side_effect_globset(&self) -> Option<&GlobSet> {
        if self.side_effects.is_empty() {
            None
        } else {
            Some(&self.side_effects)
        }
    }

    /// The gate decision: does this file's change set require tests?
    pub fn tests_required(&self, file: &str, records: &[ChangeRecord]) -> bool {
        if self.never_tests.is_match(file) {
            return false;
        }
        if self.always_tests.is_match(file) {
            return true;
        }
        let threshold = self.config.effective_min_severity();
        records.iter().any(|r| r.severity >= threshold)
    }
}

fn build_globset(patterns: &[String], which: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern, which, error = %e, "skipping invalid glob"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!(which, error = %e, "glob set build failed, matching nothing");
        GlobSet::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Span;

    fn record(kind: ChangeKind) -> ChangeRecord {
        ChangeRecord::new(kind, "src/a.ts", Span::point(0, 0), "x", "d")
    }

    #[test]
    fn disabled_category_disables_its_kinds() {
        let resolver = ConfigResolver::new(AnalyzerConfig {
            disabled_categories: vec!["ternaries".into()],
            ..Default::default()
        });
        assert!(!resolver.is_kind_enabled(ChangeKind::TernaryAdded));
        assert!(resolver.is_kind_enabled(ChangeKind::CallAdded));
    }

    #[test]
    fn kind_disable_list_is_honored() {
        let resolver = ConfigResolver::new(AnalyzerConfig {
            disabled_kinds: vec!["call-added".into()],
            ..Default::default()
        });
        assert!(!resolver.is_kind_enabled(ChangeKind::CallAdded));
        assert!(resolver.is_kind_enabled(ChangeKind::CallRemoved));
    }

    #[test]
    fn severity_override_applies_by_kind_name() {
        let mut overrides = std::collections::HashMap::new();
        overrides.insert("function-added".to_string(), Severity::High);
        let resolver = ConfigResolver::new(AnalyzerConfig {
            severity_overrides: overrides,
            ..Default::default()
        });
        assert_eq!(
            resolver.severity_override(ChangeKind::FunctionAdded),
            Some(Severity::High)
        );
        assert_eq!(resolver.severity_override(ChangeKind::CallAdded), None);
    }

    #[test]
    fn tests_required_follows_threshold_and_path_globs() {
        let resolver = ConfigResolver::new(AnalyzerConfig {
            never_require_tests: vec!["**/generated/**".into()],
            always_require_tests: vec!["src/billing/**".into()],
            ..Default::default()
        });

        let high = vec![record(ChangeKind::SignatureChanged)];
        let low = vec![record(ChangeKind::TypeAdded)];

        assert!(resolver.tests_required("src/a.ts", &high));
        assert!(!resolver.tests_required("src/a.ts", &low));
        assert!(!resolver.tests_required("src/generated/a.ts", &high));
        assert!(resolver.tests_required("src/billing/a.ts", &low));
    }

    #[test]
    fn include_exclude_filtering() {
        let resolver = ConfigResolver::new(AnalyzerConfig {
            include: vec!["src/**/*.ts".into()],
            exclude: vec!["src/vendor/**".into()],
            ..Default::default()
        });
        assert!(resolver.file_included("src/app/main.ts"));
        assert!(!resolver.file_included("src/vendor/lib.ts"));
        assert!(!resolver.file_included("docs/readme.md"));
    }
}
