//! logcheck version information.
//!
//! This module exposes the harness version as a single constant so the CLI and the stub checker agree on the same
//! value.
//!
//! ## Notes
//!
//! - The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.
//! - Prefer this constant over repeating `env!("CARGO_PKG_VERSION")` in multiple places.

/// The logcheck version string (for example, `0.1.0`).
pub const LOGCHECK_VERSION: &str = env!("CARGO_PKG_VERSION");
