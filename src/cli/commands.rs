//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::env;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use logcheck_core::proof::derive_proof;
use logcheck_core::protocol::{SALT_MAX, SALT_MIN, Salt};

use crate::harness::catalog::load_catalog;
use crate::harness::{ConsoleReporter, HarnessError, JsonReporter, OutputFormat, Reporter, RunOptions, run_suite};

use super::{CliError, CliResult, ExitCode, RunArgs};

/// Translate parsed `run` arguments into harness options.
pub fn run_options(args: &RunArgs) -> RunOptions {
    let mut options = RunOptions::new()
        .with_config_path(&args.config)
        .with_catalog_path(&args.catalog)
        .with_checker_path(&args.checker)
        .with_format(args.format.into())
        .with_verbose(args.verbose)
        .with_color(!args.no_color && std::io::stdout().is_terminal());
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }
    options
}

/// Run the whole catalog. Exit code 0 only if every case passed.
pub fn run_catalog(args: &RunArgs) -> CliResult<ExitCode> {
    let options = run_options(args);

    match env::current_dir() {
        Ok(dir) => tracing::info!(cwd = %dir.display(), "starting run"),
        Err(e) => tracing::warn!(error = %e, "cannot determine current directory"),
    }

    let mut reporter: Box<dyn Reporter> = match options.format {
        OutputFormat::Console => Box::new(ConsoleReporter::stdout(options.verbose, options.color)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let outcome = run_suite(&options, reporter.as_mut())?;
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Diagnostics already printed by the reporter
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// Print the parsed catalog, one case per line.
pub fn list_catalog(catalog: &Path) -> CliResult<ExitCode> {
    let cases = load_catalog(catalog).map_err(HarnessError::from)?;
    println!("{} case(s) in {}", cases.len(), catalog.display());
    for case in &cases {
        println!(
            "  line {:>4}: {} expects {} on {}",
            case.line,
            case.task,
            case.expected_result,
            case.log_path.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the proof code for a verdict.
pub fn print_proof(secret: &str, task: &str, salt: u32, result: i64) -> CliResult<ExitCode> {
    let salt = Salt::new(salt)
        .ok_or_else(|| CliError::failure(format!("Error: salt must be between {SALT_MIN} and {SALT_MAX}")))?;
    println!("{}", derive_proof(secret, task, salt, result));
    Ok(ExitCode::SUCCESS)
}
