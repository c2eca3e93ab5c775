//! Proof-code derivation.
//!
//! A proof code binds a verdict to the shared secret and to the salt of one invocation:
//!
//! ```text
//! hex(sha256("<secret>:<task>:<salt>:<result>"))
//! ```
//!
//! Salt and result are rendered in decimal. The hex digest is lowercase and 64 characters long.
//!
//! ## Examples
//! ```rust
//! use logcheck_core::proof::derive_proof;
//! use logcheck_core::protocol::Salt;
//!
//! let salt = Salt::new(42).unwrap();
//! let code = derive_proof("s3cr3t", "task1", salt, 5);
//! assert_eq!(code.as_str(), "fe7b43d7996452901d6b71b13d6d7337fc6a4750dd4000c840f23a420535ab18");
//! ```

use std::fmt;

use sha2::{Digest, Sha256};

use crate::protocol::Salt;

/// Separator between the four proof inputs. Same character as the record delimiter.
pub const PROOF_DELIMITER: char = ':';

/// Length of a rendered proof code.
pub const PROOF_HEX_LEN: usize = 64;

/// A derived proof code (lowercase hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProofCode(String);

impl ProofCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a code reported by a checker. Exact, case-sensitive.
    pub fn matches(&self, reported: &str) -> bool {
        self.0 == reported
    }
}

impl fmt::Display for ProofCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the exact preimage that gets hashed.
pub fn proof_preimage(secret: &str, task: &str, salt: Salt, result: i64) -> String {
    let d = PROOF_DELIMITER;
    format!("{secret}{d}{task}{d}{salt}{d}{result}")
}

/// Derive the proof code for one verdict.
///
/// ## Parameters
/// - `secret`: The shared secret.
/// - `task`: Task identifier exactly as passed to the checker.
/// - `salt`: The salt of this invocation.
/// - `result`: The verdict.
pub fn derive_proof(secret: &str, task: &str, salt: Salt, result: i64) -> ProofCode {
    let digest = Sha256::digest(proof_preimage(secret, task, salt, result).as_bytes());
    ProofCode(hex::encode(digest))
}

/// Check a reported proof code against the one derived from the same inputs.
pub fn verify_proof(secret: &str, task: &str, salt: Salt, result: i64, reported: &str) -> bool {
    derive_proof(secret, task, salt, result).matches(reported)
}
