#![forbid(unsafe_code)]
//! logcheck: a verification harness for proof-emitting log checkers
//!
//! A checker evaluates a log file against a task and prints a verdict. For a nonzero verdict it also prints a proof
//! code, the SHA-256 of `secret:task:salt:result`, which it can only produce if it really ran with the shared secret.
//! This crate drives a checker over a catalog of test logs, with a fresh salt per invocation, and verifies both the
//! verdict and the proof.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{RunOptions, RunOutcome, RunPlan, TestRunner, run_suite};
pub use logcheck_core::{ProofCode, Salt, derive_proof, verify_proof};
