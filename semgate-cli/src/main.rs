//! semgate binary entry point: discover candidates, run the engine over a
//! worker pool, render, and derive the exit status from the gate decision.

mod cli;
mod config_file;
mod discover;
mod render;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use semgate_core::{
    analyze_files, AnalysisTask, ConfigResolver, FsGitProvider, PoolOptions,
};

use cli::{Cli, Format};
use render::{FileReport, GateReport};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_file::load(cli.config.as_deref(), &cli.repo) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("semgate: {message}");
            return ExitCode::from(2);
        }
    };
    let resolver = ConfigResolver::new(config.clone());

    let candidates = if cli.files.is_empty() {
        discover::changed_files(&cli.repo, &cli.base, &cli.head)
    } else {
        cli.files.clone()
    };
    let candidates: Vec<String> = candidates
        .into_iter()
        .filter(|path| resolver.file_included(path))
        .collect();
    debug!(count = candidates.len(), "candidate files");

    if candidates.is_empty() {
        info!("no candidate files to analyze");
        println!("no candidate files");
        return ExitCode::SUCCESS;
    }

    let shared_config = Arc::new(config);
    let tasks: Vec<AnalysisTask> = candidates
        .iter()
        .map(|path| AnalysisTask {
            file_path: path.clone(),
            base_ref: cli.base.clone(),
            head_ref: cli.head.clone(),
            config: shared_config.clone(),
        })
        .collect();

    let provider = Arc::new(FsGitProvider::new(cli.repo.clone()));
    let options = PoolOptions {
        workers: cli.jobs,
        task_timeout: cli.timeout_ms.map(Duration::from_millis),
    };
    let results = analyze_files(tasks, provider, options);

    let report = GateReport::new(
        results
            .iter()
            .map(|result| FileReport {
                tests_required: resolver.tests_required(&result.file_path, &result.changes),
                result,
            })
            .collect(),
    );

    let output = match cli.format {
        Format::Console => render::console::render(&report),
        Format::Json => render::json::render(&report),
        Format::Machine => render::machine::render(&report),
        Format::Annotations => render::annotations::render(&report),
    };
    print!("{output}");

    if cli.fail_on_error && report.error_count > 0 {
        return ExitCode::from(2);
    }
    if report.tests_required {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
