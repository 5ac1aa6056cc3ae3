//! Review output for a parsed recipient list.

use crate::recipients::{RecipientEntry, ValidationResult};
use crate::staging::SubmissionOutcome;
use crate::totals::AggregateTotals;
use crate::units::{self, BASE_UNIT_DECIMALS};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const VALID_EXPORT_FILE: &str = "valid.csv";
pub const INVALID_EXPORT_FILE: &str = "invalid.csv";

/// Numbered `address → amount` lines, as shown before sending
pub fn summary_lines(entries: &[RecipientEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| match &e.amount {
            Some(amount) => format!("{:>4}. {} → {}", i + 1, e.address, amount),
            None => format!("{:>4}. {} → (no amount)", i + 1, e.address),
        })
        .collect()
}

/// Short review of a validation result against a balance
pub fn review_text(result: &ValidationResult, totals: &AggregateTotals, symbol: &str) -> String {
    let mut out = vec![format!(
        "{} valid recipient(s), {} invalid line(s)",
        result.valid.len(),
        result.invalid.len()
    )];
    out.extend(summary_lines(&result.valid));
    if result.has_errors() {
        out.push("Invalid lines:".to_string());
        out.extend(summary_lines(&result.invalid));
    }
    out.push(format!("Total: {} {}", totals.total_amount(), symbol));
    out.push(format!("Balance: {:.4} {}", totals.account_balance(), symbol));
    if let Some(message) = totals.shortfall_message(symbol) {
        out.push(message);
    }
    out.join("\n")
}

/// Post-send summary: recipient count, amount sent and the fee paid
pub fn outcome_summary(outcome: &SubmissionOutcome, decimals: u32, token_symbol: &str, native_symbol: &str) -> String {
    let gas = outcome.receipt.gas_used.unwrap_or(outcome.gas_estimate);
    let cost = match outcome.receipt.effective_gas_price {
        Some(price) => format!(
            "{:.6} {}",
            units::base_unit_to_f64(gas.saturating_mul(price), BASE_UNIT_DECIMALS),
            native_symbol
        ),
        None => "unknown".to_string(),
    };
    [
        format!("Recipients: {}", outcome.recipients),
        format!("Total sent: {} {}", units::from_base_unit(outcome.total, decimals), token_symbol),
        format!("Gas: {} used, {} estimated", gas, outcome.gas_estimate),
        format!("Approximate cost: {}", cost),
    ]
    .join("\n")
}

fn write_entries(path: &Path, entries: &[RecipientEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["address", "amount"])?;
    for entry in entries {
        writer.write_record([entry.address.as_str(), entry.amount_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `valid.csv` and `invalid.csv` into `dir`, returning both paths
pub fn export_review(dir: &Path, result: &ValidationResult) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let valid_path = dir.join(VALID_EXPORT_FILE);
    let invalid_path = dir.join(INVALID_EXPORT_FILE);
    write_entries(&valid_path, &result.valid)?;
    write_entries(&invalid_path, &result.invalid)?;
    info!(
        "Exported {} valid and {} invalid entries to {}",
        result.valid.len(),
        result.invalid.len(),
        dir.display()
    );
    Ok((valid_path, invalid_path))
}
