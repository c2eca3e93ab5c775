//! Provide the shared, pure pieces of the checker protocol for the logcheck harness and its stub checker.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that both:
//! - the harness uses to split catalog/config records and to verify proof codes, and
//! - a checker implementation can use to produce the same proof codes.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, no randomness.
//! - Current scope: record reading, the reserved stdout markers, salt bounds, and proof-code derivation.

pub mod proof;
pub mod protocol;
pub mod records;

pub use proof::{ProofCode, derive_proof, verify_proof};
pub use protocol::{Marker, Salt};
pub use records::{Record, RecordError, read_records};
