//! The checker verification harness.
//!
//! ## Modules
//!
//! - `config` - shared-secret loading
//! - `catalog` - test case loading
//! - `invoker` - checker process invocation and stdout parsing
//! - `runner` - the verification loop and verdicts
//! - `reporter` - console and JSON output
//! - `options` - run options
//!
//! ## Flow
//!
//! `RunPlan::load` resolves the secret (fatal if absent) and the catalog, then `TestRunner::run` walks the cases in
//! order and stops at the first failure.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod catalog;
pub mod config;
pub mod errors;
pub mod invoker;
pub mod options;
pub mod reporter;
pub mod runner;

pub use catalog::TestCase;
pub use config::Secret;
pub use errors::HarnessError;
pub use invoker::{Checker, InvocationOutcome, ProcessChecker, WaitPolicy};
pub use options::{OutputFormat, RunOptions};
pub use reporter::{ConsoleReporter, JsonReporter, Reporter};
pub use runner::{RandomSalt, RunOutcome, RunPlan, SaltSource, TestRunner, run_suite};
