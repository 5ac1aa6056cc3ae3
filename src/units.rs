use ethers::types::{Address, U256};
use ethers::utils::{format_units, parse_units, to_checksum};
use anyhow::{anyhow, Result};

/// Decimal places of the canonical base unit (1 token = 10^18 smallest units)
pub const BASE_UNIT_DECIMALS: u32 = 18;

/// Convert a human-readable decimal string ("1.5") to the token's smallest unit
///
/// # Errors
/// Returns an error for empty, negative or non-numeric input, and for input
/// with more fractional digits than `decimals` allows.
pub fn to_base_unit(input: &str, decimals: u32) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Amount cannot be empty"));
    }
    if trimmed.starts_with('-') {
        return Err(anyhow!("Amount cannot be negative: {}", trimmed));
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(anyhow!("Invalid amount '{}': expected a plain decimal number", trimmed));
    }
    if fraction.len() > decimals as usize {
        return Err(anyhow!(
            "Invalid amount '{}': more than {} fractional digits",
            trimmed,
            decimals
        ));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    };
    parse_units(normalized.as_str(), decimals)
        .map(Into::into)
        .map_err(|e| anyhow!("Invalid amount '{}': {}", trimmed, e))
}

/// Format a smallest-unit integer as a decimal string
pub fn from_base_unit(value: U256, decimals: u32) -> String {
    format_units(value, decimals).unwrap_or_else(|_| "0.0".to_string())
}

/// Smallest-unit integer as a float, for balance comparisons and display
pub fn base_unit_to_f64(value: U256, decimals: u32) -> f64 {
    from_base_unit(value, decimals).parse().unwrap_or(0.0)
}

/// Strict address check applied right before submission.
///
/// Accepts an optional `0x` prefix followed by exactly 40 hex digits. All-lower
/// and all-upper hex are accepted as is; mixed case must match the EIP-55
/// checksum.
pub fn is_valid_address(input: &str) -> bool {
    let hex_part = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")).unwrap_or(input);
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }

    match hex_part.to_lowercase().parse::<Address>() {
        Ok(address) => to_checksum(&address, None)[2..] == *hex_part,
        Err(_) => false,
    }
}

/// Parse an address that already passed `is_valid_address`
pub fn parse_address(input: &str) -> Result<Address> {
    if !is_valid_address(input) {
        return Err(anyhow!("Invalid address: {}", input));
    }
    let hex_part = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")).unwrap_or(input);
    hex_part
        .to_lowercase()
        .parse()
        .map_err(|e| anyhow!("Invalid address '{}': {}", input, e))
}
