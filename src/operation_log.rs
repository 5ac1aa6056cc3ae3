//! Audit trail of submitted multisends and VIP purchases.

use crate::staging::{StagingError, SubmissionOutcome};
use crate::units;
use crate::wallet::Receipt;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const OPERATION_LOG_FILE: &str = "operation_log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Multisend,
    BuyVip,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Multisend => "multisend",
            Operation::BuyVip => "buy_vip",
        }
    }
}

/// One submission attempt, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub operation: Operation,
    pub chain_id: u64,
    pub details: Vec<(&'static str, String)>,
    /// Transaction hash on success, error text otherwise
    pub result: Result<String, String>,
}

impl OperationRecord {
    pub fn multisend(
        chain_id: u64,
        token: &str,
        decimals: u32,
        outcome: &Result<SubmissionOutcome, StagingError>,
    ) -> Self {
        let mut details = vec![("token", token.to_string())];
        let result = match outcome {
            Ok(done) => {
                details.push(("recipients", done.recipients.to_string()));
                details.push(("total", units::from_base_unit(done.total, decimals)));
                details.push(("gas_estimate", done.gas_estimate.to_string()));
                Ok(format!("{:?}", done.receipt.tx_hash))
            }
            Err(e) => Err(e.to_string()),
        };
        Self {
            operation: Operation::Multisend,
            chain_id,
            details,
            result,
        }
    }

    pub fn vip(chain_id: u64, tier: &str, outcome: &Result<Receipt>) -> Self {
        Self {
            operation: Operation::BuyVip,
            chain_id,
            details: vec![("tier", tier.to_string())],
            result: match outcome {
                Ok(receipt) => Ok(format!("{:?}", receipt.tx_hash)),
                Err(e) => Err(e.to_string()),
            },
        }
    }

    /// Header line plus indented `key=value` lines, blank line terminated
    pub fn render(&self, at: DateTime<Utc>) -> String {
        let status = if self.result.is_ok() { "ok" } else { "failed" };
        let mut out = format!(
            "[{}] chain_id={} operation={} status={}\n",
            at.to_rfc3339(),
            self.chain_id,
            self.operation.name(),
            status
        );
        for (key, value) in &self.details {
            out.push_str(&format!("  {}={}\n", key, value));
        }
        match &self.result {
            Ok(tx) => out.push_str(&format!("  tx={}\n", tx)),
            Err(e) => out.push_str(&format!("  error={}\n", e.replace('\n', " "))),
        }
        out.push('\n');
        out
    }
}

fn log_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("multisender"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(OPERATION_LOG_FILE)
}

pub fn log_file_path() -> String {
    log_path().display().to_string()
}

pub fn record(entry: &OperationRecord) -> Result<()> {
    record_to(&log_path(), entry)
}

pub fn record_to(path: &Path, entry: &OperationRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.render(Utc::now()).as_bytes())?;
    tracing::debug!("Recorded {} in {:?}", entry.operation.name(), path);
    Ok(())
}

pub fn read_log() -> Result<String> {
    read_log_from(&log_path())
}

pub fn read_log_from(path: &Path) -> Result<String> {
    if path.exists() {
        Ok(fs::read_to_string(path)?)
    } else {
        Ok(String::new())
    }
}
