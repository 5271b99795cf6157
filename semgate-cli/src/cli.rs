//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Semantic-change gate: classifies edits between two revisions and decides
/// whether tests are required.
#[derive(Debug, Parser)]
#[command(name = "semgate", version, about)]
pub struct Cli {
    /// Files to analyze. When omitted, the changed files between the two
    /// refs are discovered from the repository.
    pub files: Vec<String>,

    /// Base revision.
    #[arg(long, default_value = "HEAD")]
    pub base: String,

    /// Head revision; defaults to the working copy.
    #[arg(long, default_value = semgate_core::WORKING_REF)]
    pub head: String,

    /// Repository root.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Configuration file; defaults to `semgate.toml` in the repo root.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "console")]
    pub format: Format,

    /// Worker count; defaults to the logical CPU count.
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Per-file analysis timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Exit non-zero when any file-scoped analysis error occurred.
    #[arg(long)]
    pub fail_on_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable summary.
    Console,
    /// Full JSON dump of results and the gate decision.
    Json,
    /// Colon-delimited machine lines.
    Machine,
    /// CI inline annotations.
    Annotations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_compare_working_copy_against_head() {
        let cli = Cli::parse_from(["semgate"]);
        assert_eq!(cli.base, "HEAD");
        assert_eq!(cli.head, semgate_core::WORKING_REF);
        assert_eq!(cli.format, Format::Console);
    }

    #[test]
    fn parses_refs_files_and_format() {
        let cli = Cli::parse_from([
            "semgate",
            "src/a.ts",
            "--base",
            "origin/main",
            "--head",
            "feature",
            "--format",
            "machine",
            "--timeout-ms",
            "5000",
        ]);
        assert_eq!(cli.files, vec!["src/a.ts"]);
        assert_eq!(cli.base, "origin/main");
        assert_eq!(cli.head, "feature");
        assert_eq!(cli.format, Format::Machine);
        assert_eq!(cli.timeout_ms, Some(5000));
    }
}
