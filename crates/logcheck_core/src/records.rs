//! Delimited record reading shared by the config and catalog readers.
//!
//! ## Notes
//! - Fields are separated by [`FIELD_DELIMITER`]. A field that starts with `"` is quoted: it may contain the
//!   delimiter and line breaks, and `""` inside it stands for one `"`. A quote anywhere else is literal.
//! - Fields are returned verbatim (minus quoting). Callers decide which fields to trim.
//! - Blank lines produce no record, so they never match a fixed-arity record.
//! - Records may have any number of fields; arity is the caller's concern.

use csv::{ReaderBuilder, Terminator, Trim};

/// The single reserved field separator of config and catalog files.
pub const FIELD_DELIMITER: char = ':';

/// Error from the underlying record reader.
pub type RecordError = csv::Error;

/// One delimited record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line the record starts on.
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    /// The fields as string slices, for slice patterns.
    pub fn as_strs(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

/// Read every record from `source`, in order.
///
/// ## Parameters
/// - `source`: Whole file contents. `\n`, `\r\n` and `\r` all end a record.
///
/// ## Returns
/// - `Vec<Record>`: the records in source order.
///
/// ## Errors
/// - [`RecordError`] if the reader rejects the input.
pub fn read_records(source: &str) -> Result<Vec<Record>, RecordError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER as u8)
        .has_headers(false)
        .flexible(true)
        .quoting(true)
        .double_quote(true)
        .trim(Trim::None)
        .terminator(Terminator::CRLF)
        .from_reader(source.as_bytes());

    let mut lines = LineCounter::new(source);
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let byte = record.position().map_or(0, |pos| pos.byte() as usize);
        records.push(Record {
            line: lines.line_at(byte),
            fields: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(records)
}

/// Maps ascending byte offsets to 1-based line numbers.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    /// Line of the first non-terminator byte at or after `byte`. Skipped blank lines may precede a record's offset.
    fn line_at(&mut self, byte: usize) -> usize {
        let mut target = byte.clamp(self.offset, self.bytes.len());
        while matches!(self.bytes.get(target), Some(b'\r' | b'\n')) {
            target += 1;
        }
        self.line += self.bytes[self.offset..target].iter().filter(|&&b| b == b'\n').count();
        self.offset = target;
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(source: &str) -> Vec<Vec<String>> {
        read_records(source).unwrap().into_iter().map(|r| r.fields).collect()
    }

    #[test]
    fn test_three_fields() {
        assert_eq!(fields("task1:5:logs/a.log\n"), vec![vec!["task1", "5", "logs/a.log"]]);
    }

    #[test]
    fn test_whitespace_is_kept() {
        assert_eq!(fields("secret: abc \n"), vec![vec!["secret", " abc "]]);
        assert_eq!(fields("   \n"), vec![vec!["   "]]);
    }

    #[test]
    fn test_blank_lines_have_no_record() {
        assert!(fields("").is_empty());
        assert!(fields("\n\r\n").is_empty());
    }

    #[test]
    fn test_empty_fields_are_kept() {
        assert_eq!(fields("a::b\n"), vec![vec!["a", "", "b"]]);
        assert_eq!(fields(":\n"), vec![vec!["", ""]]);
    }

    #[test]
    fn test_crlf_is_stripped() {
        assert_eq!(fields("t:0:x.log\r\n"), vec![vec!["t", "0", "x.log"]]);
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        assert_eq!(fields("t:1:\"/logs/a:b.log\"\n"), vec![vec!["t", "1", "/logs/a:b.log"]]);
        assert_eq!(fields("secret:\"ab:c\"\n"), vec![vec!["secret", "ab:c"]]);
    }

    #[test]
    fn test_doubled_quote_in_quoted_field() {
        assert_eq!(fields("secret:\"say \"\"hi\"\"\"\n"), vec![vec!["secret", "say \"hi\""]]);
    }

    #[test]
    fn test_quote_inside_field_is_literal() {
        assert_eq!(fields("secret:ab\"c\n"), vec![vec!["secret", "ab\"c"]]);
    }

    #[test]
    fn test_line_numbers() {
        let records = read_records("a:b\n\nc:d\n\"x\ny\":z\r\ne:f\n").unwrap();
        let lines: Vec<usize> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 3, 4, 6]);
        assert_eq!(records[2].fields, vec!["x\ny", "z"]);
    }
}
