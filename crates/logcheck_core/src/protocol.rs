//! Checker protocol vocabulary.
//!
//! This module defines the reserved spellings the harness and a checker agree on: the secret key of the config file,
//! the two stdout markers, and the salt range.
//!
//! ## Notes
//! - Marker matching is **case-sensitive** and anchored at the start of a (trimmed) line.
//! - This module is vocabulary only. It does not read process output.
//!
//! ## Examples
//! ```rust
//! use logcheck_core::protocol::{self, Marker};
//!
//! assert_eq!(protocol::match_marker("Result code: 3"), Some((Marker::ResultCode, " 3")));
//! assert_eq!(Marker::ProofCode.as_str(), "Code string:");
//! ```

use std::fmt;

/// Key of the config record that declares the shared secret.
pub const SECRET_KEY: &str = "secret";

/// Smallest salt the harness will ever draw.
pub const SALT_MIN: u32 = 1;
/// Largest salt the harness will ever draw (`2^31 - 1`, the largest value a C `int` checker accepts).
pub const SALT_MAX: u32 = i32::MAX as u32;

/// Stable identifier for the stdout markers a checker prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `Result code:` followed by the decimal verdict.
    ResultCode,
    /// `Code string:` followed by the lowercase-hex proof code.
    ProofCode,
}

/// All markers, in the order a well-behaved checker prints them.
pub const MARKERS: &[Marker] = &[Marker::ResultCode, Marker::ProofCode];

impl Marker {
    /// Return the canonical spelling of this marker.
    pub const fn as_str(self) -> &'static str {
        match self {
            Marker::ResultCode => "Result code:",
            Marker::ProofCode => "Code string:",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up a marker by its exact spelling.
pub fn from_str(s: &str) -> Option<Marker> {
    MARKERS.iter().copied().find(|m| m.as_str() == s)
}

/// Match a line against the reserved markers.
///
/// ## Parameters
/// - `line`: One line of checker output, already trimmed by the caller.
///
/// ## Returns
/// - `Some((marker, remainder))` when the line starts with a marker; the remainder is not trimmed.
/// - `None` for ordinary diagnostic output.
pub fn match_marker(line: &str) -> Option<(Marker, &str)> {
    MARKERS
        .iter()
        .find_map(|&m| line.strip_prefix(m.as_str()).map(|rest| (m, rest)))
}

/// A single-use challenge mixed into one proof derivation.
///
/// Always within `[SALT_MIN, SALT_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt(u32);

impl Salt {
    /// Wrap a raw value, rejecting anything outside the salt range.
    pub fn new(value: u32) -> Option<Self> {
        (SALT_MIN..=SALT_MAX).contains(&value).then_some(Self(value))
    }

    /// Wrap a raw value, clamping it into the salt range.
    pub fn saturating(value: u32) -> Self {
        Self(value.clamp(SALT_MIN, SALT_MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
