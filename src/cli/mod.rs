//! CLI module for the logcheck harness
//!
//! ## Commands
//!
//! - `run` - Verify the checker against the test catalog (default when no subcommand is given)
//! - `list` - Print the parsed test catalog
//! - `proof <secret> <task> <salt> <result>` - Print the proof code a checker must emit
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::harness::options::{DEFAULT_CATALOG, DEFAULT_CHECKER, DEFAULT_CONFIG};
use crate::harness::{HarnessError, OutputFormat};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        // Render through miette so codes and help text reach the user
        CliError::failure(format!("{:?}", miette::Report::new(err)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = crate::version::LOGCHECK_VERSION;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Verify a proof-emitting log checker against a catalog of test logs
#[derive(Parser, Debug)]
#[command(name = "logcheck")]
#[command(version = VERSION)]
#[command(about = "Verify a proof-emitting log checker against a catalog of test logs", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `run` action
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every catalog case against the checker (stops at the first failure)
    Run(RunArgs),

    /// Print the parsed test catalog without running anything
    List {
        /// Test catalog (`task:expected_result:log_path` per line)
        #[arg(long, value_name = "PATH", default_value = DEFAULT_CATALOG)]
        catalog: PathBuf,
    },

    /// Print the proof code a checker must emit for a verdict
    Proof {
        #[arg(value_name = "SECRET")]
        secret: String,
        #[arg(value_name = "TASK")]
        task: String,
        /// Salt passed to the checker (1..=2147483647)
        #[arg(value_name = "SALT")]
        salt: u32,
        /// Reported result code
        #[arg(value_name = "RESULT", allow_negative_numbers = true)]
        result: i64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Checker config file; must declare `secret:<value>`
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Test catalog (`task:expected_result:log_path` per line)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Checker executable
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CHECKER)]
    pub checker: PathBuf,

    /// Kill a checker invocation after this many seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Console)]
    pub format: FormatArg,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Console,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Console => OutputFormat::Console,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Run(args)) => commands::run_catalog(&args),
        Some(Command::List { catalog }) => commands::list_catalog(&catalog),
        Some(Command::Proof {
            secret,
            task,
            salt,
            result,
        }) => commands::print_proof(&secret, &task, salt, result),
        // Default: run with the top-level options
        None => commands::run_catalog(&cli.run),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["logcheck"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.config, PathBuf::from("default.cfg"));
        assert_eq!(cli.run.catalog, PathBuf::from("tests.csv"));
        assert_eq!(cli.run.checker, PathBuf::from("./ursulalogchecktester"));
        assert_eq!(cli.run.timeout, None);
        assert_eq!(cli.run.format, FormatArg::Console);
    }

    #[test]
    fn test_cli_parse_top_level_run_flags() {
        let cli = Cli::try_parse_from(["logcheck", "--config", "a.cfg", "--timeout", "30", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.config, PathBuf::from("a.cfg"));
        assert_eq!(cli.run.timeout, Some(30));
        assert!(cli.run.verbose);
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from(["logcheck", "run", "--checker", "./bin/checker", "--format", "json"]).unwrap();
        if let Some(Command::Run(args)) = cli.command {
            assert_eq!(args.checker, PathBuf::from("./bin/checker"));
            assert_eq!(args.format, FormatArg::Json);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["logcheck", "run", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["logcheck", "list", "--catalog", "cases.csv"]).unwrap();
        if let Some(Command::List { catalog }) = cli.command {
            assert_eq!(catalog, PathBuf::from("cases.csv"));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_cli_parse_proof() {
        let cli = Cli::try_parse_from(["logcheck", "proof", "s3cr3t", "task1", "42", "-5"]).unwrap();
        if let Some(Command::Proof {
            secret,
            task,
            salt,
            result,
        }) = cli.command
        {
            assert_eq!(secret, "s3cr3t");
            assert_eq!(task, "task1");
            assert_eq!(salt, 42);
            assert_eq!(result, -5);
        } else {
            panic!("Expected Proof command");
        }
    }

    #[test]
    fn test_cli_flags_conflict_with_subcommand() {
        assert!(Cli::try_parse_from(["logcheck", "--verbose", "list"]).is_err());
    }
}
