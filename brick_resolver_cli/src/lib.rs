// brick_resolver_cli: file/stdin driver for the plan resolver.
//
// Reads a generated plan, resolves it with `brick_resolver::resolve`, writes
// the corrected plan plus report, and prints a one-line summary to stderr.
// The resolver never fails; everything that can go wrong here is argument
// parsing, I/O, JSON, or config loading, all surfaced as `CliError`.
//
// Module overview:
// - `options.rs`:  Argument parsing into `Options`.
// - `document.rs`: Input shapes (bare array or `{ steps }`) and output writing.
//
// See `main.rs` for exit codes.

pub mod document;
pub mod options;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use brick_resolver::{CorrectionAction, PlanConfig, Resolution, ValidationReport, resolve};
use thiserror::Error;

use crate::document::{read_plan, write_resolution};
use crate::options::{Input, Options};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("{source_name}: invalid JSON: {source}")]
    Json {
        source_name: String,
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Config {
        path: String,
        source: brick_resolver::ConfigError,
    },
}

impl CliError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub resolution: Resolution,
    /// The retry policy would ask the generator for a new plan.
    pub needs_retry: bool,
}

/// Load config, read the plan, resolve it, and write the result.
pub fn run(options: &Options) -> Result<RunOutcome, CliError> {
    let config = match &options.config {
        Some(path) => PlanConfig::load(path).map_err(|source| CliError::Config {
            path: path.display().to_string(),
            source,
        })?,
        None => PlanConfig::default(),
    };

    let plan = match &options.input {
        Input::Stdin => read_plan(io::stdin().lock(), "stdin")?,
        Input::File(path) => {
            let file = File::open(path).map_err(|e| CliError::io(path.display().to_string(), e))?;
            read_plan(BufReader::new(file), &path.display().to_string())?
        }
    };

    let resolution = resolve(&plan, &config.heights, &config.resolver);

    match &options.output {
        Some(path) => write_to_file(path, &resolution, options.pretty)?,
        None => write_resolution(io::stdout().lock(), &resolution, options.pretty, "stdout")?,
    }

    let needs_retry = config.retry.should_retry(&resolution.report);
    Ok(RunOutcome {
        resolution,
        needs_retry,
    })
}

fn write_to_file(path: &Path, resolution: &Resolution, pretty: bool) -> Result<(), CliError> {
    let name = path.display().to_string();
    let file = File::create(path).map_err(|e| CliError::io(&name, e))?;
    let mut writer = BufWriter::new(file);
    write_resolution(&mut writer, resolution, pretty, &name)?;
    writer.flush().map_err(|e| CliError::io(&name, e))
}

/// Human-readable lines for `--verbose`: every correction, then every
/// warning.
pub fn describe_report(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.corrections.len() + report.warnings.len());
    for c in &report.corrections {
        let step = match (c.action, c.resolved_step_id) {
            (CorrectionAction::Dropped, _) | (_, None) => format!("step {}", c.step_id),
            (_, Some(resolved)) => format!("step {} (now {resolved})", c.step_id),
        };
        lines.push(format!("{:<15} {step} {}: {}", c.action, c.part_name, c.reason));
    }
    for w in &report.warnings {
        let kind = serde_json::to_value(w.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        lines.push(format!("{kind:<15} step {} {}: {}", w.step_id, w.part_name, w.detail));
    }
    lines
}
