//! Property-based tests for logcheck
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use logcheck::harness::catalog::parse_catalog;
use logcheck::harness::config::parse_secret;
use logcheck_core::proof::{PROOF_HEX_LEN, derive_proof, verify_proof};
use logcheck_core::protocol::{SALT_MAX, SALT_MIN, Salt};
use logcheck_core::records::read_records;
use proptest::prelude::*;
use std::path::Path;

fn salt_strategy() -> impl Strategy<Value = Salt> {
    (SALT_MIN..=SALT_MAX).prop_map(Salt::saturating)
}

/// Field text without delimiters, quotes or line breaks.
fn field_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./ -]{0,16}"
}

// =============================================================================
// Proof Properties
// =============================================================================

proptest! {
    /// Property: every proof is 64 lowercase hex digits
    #[test]
    fn proof_is_lowercase_hex(
        secret in ".*",
        task in ".*",
        salt in salt_strategy(),
        result in any::<i64>(),
    ) {
        let code = derive_proof(&secret, &task, salt, result);
        prop_assert_eq!(code.as_str().len(), PROOF_HEX_LEN);
        prop_assert!(code.as_str().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    /// Property: derivation is deterministic and verifies against itself
    #[test]
    fn proof_is_deterministic(
        secret in field_strategy(),
        task in field_strategy(),
        salt in salt_strategy(),
        result in any::<i64>(),
    ) {
        let first = derive_proof(&secret, &task, salt, result);
        let second = derive_proof(&secret, &task, salt, result);
        prop_assert_eq!(&first, &second);
        prop_assert!(verify_proof(&secret, &task, salt, result, first.as_str()));
    }

    /// Property: a different salt yields a different proof
    #[test]
    fn proof_depends_on_salt(
        secret in field_strategy(),
        task in field_strategy(),
        a in salt_strategy(),
        b in salt_strategy(),
        result in any::<i64>(),
    ) {
        prop_assume!(a != b);
        let code = derive_proof(&secret, &task, a, result);
        prop_assert!(!verify_proof(&secret, &task, b, result, code.as_str()));
    }

    /// Property: a proof made with another secret never verifies
    #[test]
    fn proof_depends_on_secret(
        secret in field_strategy(),
        other in field_strategy(),
        salt in salt_strategy(),
        result in any::<i64>(),
    ) {
        prop_assume!(secret != other);
        let forged = derive_proof(&other, "task", salt, result);
        prop_assert!(!verify_proof(&secret, "task", salt, result, forged.as_str()));
    }
}

// =============================================================================
// Record Properties
// =============================================================================

proptest! {
    /// Property: reading a joined record gives back its fields
    #[test]
    fn record_round_trips(fields in prop::collection::vec(field_strategy(), 1..6)) {
        let line = fields.join(":");
        prop_assume!(!line.is_empty());
        let records = read_records(&line).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(&records[0].fields, &fields);
    }

    /// Property: quoting any field keeps it whole, delimiters and quotes included
    #[test]
    fn quoted_field_round_trips(value in "[a-z:\" ]{0,16}") {
        let line = format!("secret:\"{}\"", value.replace('"', "\"\""));
        let records = read_records(&line).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].as_strs(), vec!["secret", value.as_str()]);
    }

    /// Property: only three-field records become cases
    #[test]
    fn catalog_keeps_only_three_field_records(
        rows in prop::collection::vec((1usize..6, any::<i32>()), 0..20),
    ) {
        let text: String = rows
            .iter()
            .map(|(n, value)| {
                let mut fields = vec![format!("task{value}"), value.to_string(), "logs/a.log".to_string()];
                fields.resize(*n, "x".to_string());
                fields.join(":") + "\n"
            })
            .collect();
        let cases = parse_catalog(&text, Path::new("tests.csv")).unwrap();
        let expected: Vec<i64> = rows.iter().filter(|(n, _)| *n == 3).map(|(_, v)| i64::from(*v)).collect();
        prop_assert_eq!(cases.iter().map(|c| c.expected_result).collect::<Vec<_>>(), expected);
    }

    /// Property: the last well-formed secret record wins
    #[test]
    fn last_secret_wins(secrets in prop::collection::vec("[a-zA-Z0-9]{1,12}", 1..5)) {
        let text: String = secrets.iter().map(|s| format!("secret:{s}\nnoise:1:2\n")).collect();
        let secret = parse_secret(&text, Path::new("default.cfg")).unwrap();
        prop_assert_eq!(secret.expose(), secrets.last().unwrap().as_str());
    }
}
