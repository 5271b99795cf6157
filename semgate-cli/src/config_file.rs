//! On-disk configuration loading: `semgate.toml` deserialized over the
//! built-in defaults.

use std::path::Path;

use semgate_core::AnalyzerConfig;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_NAME: &str = "semgate.toml";

/// Load configuration. An explicitly given path must parse; the implicit
/// repo-root file degrades to defaults when absent or malformed.
pub fn load(explicit: Option<&Path>, repo_root: &Path) -> Result<AnalyzerConfig, String> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        return toml::from_str(&text)
            .map_err(|e| format!("cannot parse config {}: {e}", path.display()));
    }

    let implicit = repo_root.join(DEFAULT_CONFIG_NAME);
    match std::fs::read_to_string(&implicit) {
        Ok(text) => match toml::from_str(&text) {
            Ok(config) => {
                debug!(path = %implicit.display(), "loaded configuration");
                Ok(config)
            }
            Err(e) => {
                warn!(path = %implicit.display(), error = %e, "malformed config, using defaults");
                Ok(AnalyzerConfig::default())
            }
        },
        Err(_) => Ok(AnalyzerConfig::default()),
    }
}
