//! Recipient list ingestion.
//! Turns raw `address, amount` text into ordered valid/invalid recipient lists.

use serde::{Deserialize, Serialize};

/// Length of a `0x`-prefixed address: 2 prefix characters + 40 hex digits.
pub const ADDRESS_LENGTH: usize = 42;

/// One `address, amount` pair read from a CSV line.
///
/// `amount` is `None` when the line had no comma at all. Amounts stay in
/// human-readable form ("1.5") until the batch is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientEntry {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl RecipientEntry {
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            amount: Some(amount.into()),
        }
    }

    /// Amount text, or an empty string when the line carried none
    pub fn amount_str(&self) -> &str {
        self.amount.as_deref().unwrap_or("")
    }

    /// Length-only address rule used while the user is editing the list.
    ///
    /// Hex content and checksum casing are not inspected here;
    /// the stricter check runs at submission time.
    pub fn has_valid_length(&self) -> bool {
        !self.address.is_empty() && self.address.chars().count() == ADDRESS_LENGTH
    }
}

/// Valid and invalid entries, both in input line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: Vec<RecipientEntry>,
    pub invalid: Vec<RecipientEntry>,
}

impl ValidationResult {
    /// Number of input lines this result was built from
    pub fn line_count(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.invalid.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Parse a single CSV line, splitting on the first comma only.
pub fn parse_line(line: &str) -> RecipientEntry {
    match line.split_once(',') {
        Some((address, amount)) => RecipientEntry {
            address: address.trim().to_string(),
            amount: Some(amount.trim().to_string()),
        },
        None => RecipientEntry {
            address: line.trim().to_string(),
            amount: None,
        },
    }
}

/// Validate raw CSV text.
///
/// Every `'\n'`-separated line maps to exactly one entry in either list, blank
/// lines included. Empty text is one blank line, so it yields a single
/// invalid entry; a trailing newline likewise adds one blank invalid entry.
pub fn validate_csv(text: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    for line in text.split('\n') {
        let entry = parse_line(line);
        if entry.has_valid_length() {
            result.valid.push(entry);
        } else {
            result.invalid.push(entry);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_1: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_2: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_parse_line_trims_both_fields() {
        let entry = parse_line("  0xabc ,  1.5  ");
        assert_eq!(entry.address, "0xabc");
        assert_eq!(entry.amount.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_parse_line_without_comma_has_no_amount() {
        let entry = parse_line(ADDR_1);
        assert_eq!(entry.address, ADDR_1);
        assert_eq!(entry.amount, None);
    }

    #[test]
    fn test_parse_line_splits_on_first_comma_only() {
        let entry = parse_line("0xabc, 1, 2");
        assert_eq!(entry.address, "0xabc");
        assert_eq!(entry.amount.as_deref(), Some("1, 2"));
    }

    #[test]
    fn test_validate_example_scenario() {
        let text = format!("{}, 1.5\nbadaddr, 2\n{}, 0.5", ADDR_1, ADDR_2);
        let result = validate_csv(&text);

        assert_eq!(
            result.valid,
            vec![RecipientEntry::new(ADDR_1, "1.5"), RecipientEntry::new(ADDR_2, "0.5")]
        );
        assert_eq!(result.invalid, vec![RecipientEntry::new("badaddr", "2")]);
        assert!(result.has_errors());
    }

    #[test]
    fn test_validate_partitions_every_line() {
        let text = format!("{ADDR_1},1\n\nshort,2\n{ADDR_2},3\n   \nxyz");
        let result = validate_csv(&text);
        assert_eq!(result.line_count(), text.split('\n').count());
        assert_eq!(result.valid.len(), 2);
        assert_eq!(result.invalid.len(), 4);
        for entry in &result.valid {
            assert!(!result.invalid.contains(entry));
        }
    }

    #[test]
    fn test_validate_length_is_the_only_rule() {
        // 42 characters but not hex at all
        let not_hex = "0xZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZ";
        assert_eq!(not_hex.len(), ADDRESS_LENGTH);
        let result = validate_csv(&format!("{not_hex}, abc"));
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].amount.as_deref(), Some("abc"));

        // 41 and 43 characters are both rejected
        let result = validate_csv(&format!("{}, 1\n{}0, 1", &ADDR_1[..41], ADDR_1));
        assert!(result.valid.is_empty());
        assert_eq!(result.invalid.len(), 2);
    }

    #[test]
    fn test_validate_keeps_valid_line_without_amount() {
        let result = validate_csv(ADDR_1);
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].amount, None);
    }

    #[test]
    fn test_validate_handles_crlf_lines() {
        let text = format!("{ADDR_1}, 1\r\n{ADDR_2}, 2\r");
        let result = validate_csv(&text);
        assert_eq!(result.valid.len(), 2);
        assert_eq!(result.valid[1].amount.as_deref(), Some("2"));
    }

    #[test]
    fn test_validate_empty_input_is_one_blank_invalid_entry() {
        let result = validate_csv("");
        assert!(result.valid.is_empty());
        assert_eq!(result.invalid, vec![RecipientEntry { address: String::new(), amount: None }]);
    }

    #[test]
    fn test_validate_trailing_newline_adds_blank_invalid_entry() {
        let result = validate_csv(&format!("{ADDR_1}, 1\n"));
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].address, "");
    }

    #[test]
    fn test_validate_is_idempotent() {
        let text = format!("{ADDR_1}, 1\nnope\n{ADDR_2}, 2");
        assert_eq!(validate_csv(&text), validate_csv(&text));
    }
}
