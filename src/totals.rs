//! Aggregate totals for a recipient list and the insufficient-funds flag.

use crate::recipients::RecipientEntry;

/// Parse the longest leading decimal number in `input`, `parseFloat` style.
///
/// Leading whitespace is skipped and trailing garbage ignored (`"12abc"` is
/// 12). Returns `NaN` when no number can be read.
pub fn parse_float_lenient(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

/// Totals derived from the valid list and the account balance.
///
/// Fields are private so the flag can only change by recomputing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateTotals {
    total_amount: f64,
    account_balance: f64,
    insufficient_funds: bool,
}

impl AggregateTotals {
    pub fn compute(valid: &[RecipientEntry], account_balance: f64) -> Self {
        let total_amount = valid
            .iter()
            .map(|entry| entry.amount.as_deref().map_or(f64::NAN, parse_float_lenient))
            .fold(0.0, |acc, amount| acc + amount);

        Self {
            total_amount,
            account_balance,
            // A NaN total compares false, which keeps the gate closed
            insufficient_funds: !(total_amount <= account_balance),
        }
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn account_balance(&self) -> f64 {
        self.account_balance
    }

    pub fn insufficient_funds(&self) -> bool {
        self.insufficient_funds
    }

    /// Shortfall message shown under the review list
    pub fn shortfall_message(&self, token_symbol: &str) -> Option<String> {
        self.insufficient_funds.then(|| {
            format!(
                "Insufficient {} in your account. You need at least {:.4} {} to proceed with the transaction.",
                token_symbol, self.total_amount, token_symbol
            )
        })
    }
}

impl Default for AggregateTotals {
    fn default() -> Self {
        Self::compute(&[], 0.0)
    }
}
