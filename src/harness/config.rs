//! Shared-secret loading from the checker config file.
//!
//! The config file is the checker's own configuration. The harness only cares about one record:
//!
//! ```text
//! secret:<value>
//! ```
//!
//! Every other record is ignored, as is any record that does not have exactly two fields. A value containing the
//! delimiter can be quoted: `secret:"ab:c"`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use logcheck_core::protocol::SECRET_KEY;
use logcheck_core::records::{RecordError, read_records};
use miette::Diagnostic;
use thiserror::Error;

/// The secret shared between the harness and the checker.
///
/// `Debug` and `Display` are redacted so the value cannot leak through logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Only proof derivation should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Errors that prevent the secret from being resolved. Both abort the run before any case executes.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file '{}'", .path.display())]
    #[diagnostic(code(logcheck::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad config, cannot find the secret string in '{}'", .path.display())]
    #[diagnostic(
        code(logcheck::config::missing_secret),
        help("add a line of the form `secret:<value>` to the checker config")
    )]
    MissingSecret { path: PathBuf },

    #[error("cannot parse config file '{}'", .path.display())]
    #[diagnostic(code(logcheck::config::malformed))]
    Malformed {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
}

/// Scan config text for the secret record. When several are present the last one wins.
///
/// ## Parameters
/// - `source`: Config file contents.
/// - `path`: Config path, used only in error messages.
pub fn parse_secret(source: &str, path: &Path) -> Result<Secret, ConfigError> {
    let records = read_records(source).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut secret = None;
    for record in &records {
        match record.as_strs().as_slice() {
            [key, value] if *key == SECRET_KEY => secret = Some(Secret::new(value.trim())),
            [_, _] => {}
            fields => tracing::debug!(line = record.line, fields = fields.len(), "skipping config record"),
        }
    }
    secret.ok_or_else(|| ConfigError::MissingSecret {
        path: path.to_path_buf(),
    })
}

/// Read the config file and resolve the secret.
pub fn load_secret(path: &Path) -> Result<Secret, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_secret(&source, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn secret(source: &str) -> Option<String> {
        parse_secret(source, Path::new("default.cfg"))
            .ok()
            .map(|s| s.expose().to_string())
    }

    #[test]
    fn test_secret_is_trimmed() {
        assert_eq!(secret("secret:  s3cr3t \n").as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn test_other_records_are_ignored() {
        let source = "\
task:t1
limits:10:20
secret:abc
timeout:5
";
        assert_eq!(secret(source).as_deref(), Some("abc"));
    }

    #[test]
    fn test_secret_with_extra_field_is_ignored() {
        assert_eq!(secret("secret:a:b\n"), None);
    }

    #[test]
    fn test_quoted_secret_keeps_delimiter() {
        assert_eq!(secret("secret:\"ab:c\"\n").as_deref(), Some("ab:c"));
        assert_eq!(secret("\"secret\":\" padded \"\n").as_deref(), Some("padded"));
    }

    #[test]
    fn test_key_must_match_exactly() {
        assert_eq!(secret(" secret:abc\nSECRET:abc\n"), None);
    }

    #[test]
    fn test_last_secret_wins() {
        assert_eq!(secret("secret:one\nsecret:two\n").as_deref(), Some("two"));
    }

    #[test]
    fn test_empty_secret_value_is_still_a_secret() {
        assert_eq!(secret("secret:\n").as_deref(), Some(""));
    }

    #[test]
    fn test_missing_secret() {
        let err = parse_secret("task:t1\n\n", Path::new("default.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
        assert_eq!(
            err.to_string(),
            "Bad config, cannot find the secret string in 'default.cfg'"
        );
        assert_eq!(secret(""), None);
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
        assert_eq!(secret.to_string(), "<redacted>");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_secret(Path::new("definitely/not/here.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
