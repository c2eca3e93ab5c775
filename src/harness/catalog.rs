//! Test catalog loading.
//!
//! Each catalog record is `task:expected_result:log_path`. Records with any other field count (comments without
//! delimiters, unquoted paths containing the delimiter) are skipped and only show up at `debug` level. Quote a field
//! to keep a delimiter in it: `task1:0:"logs/a:b.log"`.

use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use logcheck_core::records::{RecordError, read_records};
use miette::Diagnostic;
use thiserror::Error;

/// One catalog entry: run `task` against `log_path` and expect `expected_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub task: String,
    pub expected_result: i64,
    pub log_path: PathBuf,
    /// 1-based line in the catalog file.
    pub line: usize,
}

impl TestCase {
    /// Whether a matching verdict for this case must carry a proof code.
    pub fn requires_proof(&self) -> bool {
        self.expected_result != 0
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("cannot read test catalog '{}'", .path.display())]
    #[diagnostic(code(logcheck::catalog::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: expected result '{value}' is not an integer", .path.display())]
    #[diagnostic(
        code(logcheck::catalog::invalid_expected_result),
        help("catalog records have the form `task:expected_result:log_path`")
    )]
    InvalidExpectedResult {
        path: PathBuf,
        line: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("cannot parse test catalog '{}'", .path.display())]
    #[diagnostic(code(logcheck::catalog::malformed))]
    Malformed {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
}

/// Parse catalog text, preserving record order.
///
/// ## Parameters
/// - `source`: Catalog file contents.
/// - `path`: Catalog path, used only in error messages.
pub fn parse_catalog(source: &str, path: &Path) -> Result<Vec<TestCase>, CatalogError> {
    let records = read_records(source).map_err(|source| CatalogError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    let mut cases = Vec::new();
    for record in &records {
        let line = record.line;
        let fields = record.as_strs();
        let [task, expected, log_path] = fields[..] else {
            tracing::debug!(line, fields = fields.len(), "skipping catalog record");
            continue;
        };

        let expected_result =
            expected
                .trim()
                .parse::<i64>()
                .map_err(|source| CatalogError::InvalidExpectedResult {
                    path: path.to_path_buf(),
                    line,
                    value: expected.to_string(),
                    source,
                })?;

        cases.push(TestCase {
            task: task.to_string(),
            expected_result,
            log_path: PathBuf::from(log_path.trim()),
            line,
        });
    }
    Ok(cases)
}

/// Read and parse the catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<TestCase>, CatalogError> {
    let source = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&source, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<TestCase> {
        parse_catalog(source, Path::new("tests.csv")).unwrap()
    }

    #[test]
    fn test_parses_records_in_order() {
        let cases = parse("t1:0:logs/a.log\nt2:5: logs/b.log \n");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].task, "t1");
        assert_eq!(cases[0].expected_result, 0);
        assert_eq!(cases[0].log_path, PathBuf::from("logs/a.log"));
        assert_eq!(cases[0].line, 1);
        assert_eq!(cases[1].task, "t2");
        assert_eq!(cases[1].expected_result, 5);
        assert_eq!(cases[1].log_path, PathBuf::from("logs/b.log"));
        assert_eq!(cases[1].line, 2);
    }

    #[test]
    fn test_wrong_field_counts_are_skipped() {
        let cases = parse("\nt1:5\nt2:1:a.log\nt3:1:b.log:extra\n# comment\n");
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].task, "t2");
        assert_eq!(cases[0].line, 3);
    }

    #[test]
    fn test_quoted_path_keeps_delimiter() {
        let cases = parse("t:1:\"/logs/a:b.log\"\n");
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].log_path, PathBuf::from("/logs/a:b.log"));
        assert_eq!(cases[0].expected_result, 1);
    }

    #[test]
    fn test_unquoted_path_with_delimiter_is_skipped() {
        assert!(parse("t:1:/logs/a:b.log\n").is_empty());
    }

    #[test]
    fn test_task_is_verbatim() {
        let cases = parse(" t1 :0:a.log\n");
        assert_eq!(cases[0].task, " t1 ");
    }

    #[test]
    fn test_expected_result_allows_padding_and_sign() {
        let cases = parse("t:  7 :a.log\nt:-2:b.log\nt:+3:c.log\n");
        let expected: Vec<i64> = cases.iter().map(|c| c.expected_result).collect();
        assert_eq!(expected, vec![7, -2, 3]);
    }

    #[test]
    fn test_invalid_expected_result_reports_line() {
        let err = parse_catalog("t1:0:a.log\nt2:yes:b.log\n", Path::new("tests.csv")).unwrap_err();
        match err {
            CatalogError::InvalidExpectedResult { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "yes");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_requires_proof() {
        let cases = parse("t:0:a.log\nt:3:b.log\n");
        assert!(!cases[0].requires_proof());
        assert!(cases[1].requires_proof());
    }

    #[test]
    fn test_empty_catalog() {
        assert!(parse("").is_empty());
    }
}
