//! Analyzer configuration. Loaded once per run, merged over defaults by the
//! caller, and passed immutably into every analysis task.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::records::Severity;

/// Run-wide configuration consumed by the configuration resolver.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalyzerConfig {
    /// Candidate-file include globs. Empty means everything.
    pub include: Vec<String>,
    /// Candidate-file exclude globs.
    pub exclude: Vec<String>,
    /// Callee patterns treated as side-effecting; their removal ranks high.
    pub side_effect_callees: Vec<String>,
    /// Category names to disable as a group.
    pub disabled_categories: Vec<String>,
    /// Change-kind names to drop entirely.
    pub disabled_kinds: Vec<String>,
    /// Per-kind severity overrides, keyed by kind name.
    pub severity_overrides: HashMap<String, Severity>,
    /// Path globs that always require tests, regardless of severity.
    pub always_require_tests: Vec<String>,
    /// Path globs that never require tests.
    pub never_require_tests: Vec<String>,
    /// Minimum record severity that triggers the tests-required decision.
    pub min_severity_for_tests: Option<Severity>,
}

impl AnalyzerConfig {
    /// Effective threshold, defaulting to medium.
    pub fn effective_min_severity(&self) -> Severity {
        self.min_severity_for_tests.unwrap_or(Severity::Medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let config = AnalyzerConfig::default();
        assert!(config.include.is_empty());
        assert!(config.disabled_categories.is_empty());
        assert_eq!(config.effective_min_severity(), Severity::Medium);
    }

    #[test]
    fn deserializes_kebab_case_keys() {
        let config: AnalyzerConfig = serde_json::from_str(
            r#"{
                "side-effect-callees": ["*.write"],
                "min-severity-for-tests": "high",
                "severity-overrides": {"call-added": "low"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.side_effect_callees, vec!["*.write"]);
        assert_eq!(config.effective_min_severity(), Severity::High);
        assert_eq!(config.severity_overrides["call-added"], Severity::Low);
    }
}
