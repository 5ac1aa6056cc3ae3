//! Transfer staging: the submission gate and the batched transfer hand-off.
//! Builds one `multisendToken` call from the valid recipient list and drives
//! it through a [`ContractCaller`] with bounded timeouts.

use crate::config::Config;
use crate::recipients::RecipientEntry;
use crate::totals::AggregateTotals;
use crate::units;
use crate::wallet::{CallError, ContractCaller, Receipt};
use ethers::types::{Address, U256};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StagingError {
    #[error("No valid recipients to send to")]
    NothingToSend,
    #[error("Insufficient balance: {needed:.4} needed, {available:.4} available")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("Some addresses are invalid. Please check and try again.")]
    InvalidAddresses(Vec<String>),
    #[error("Invalid token address: {0}")]
    InvalidToken(String),
    #[error("Recipient {index}: invalid amount '{amount}': {reason}")]
    InvalidAmount {
        index: usize,
        amount: String,
        reason: String,
    },
    #[error("A submission is already in progress")]
    AlreadyInFlight,
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },
    #[error(transparent)]
    Call(#[from] CallError),
}

impl StagingError {
    /// Whether trying the same submission again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StagingError::Timeout { .. } | StagingError::Call(CallError::Network(_))
        )
    }

    /// The user refused to sign; terminal for this attempt
    pub fn is_rejection(&self) -> bool {
        matches!(self, StagingError::Call(CallError::Rejected(_)))
    }
}

/// One batched transfer, built right before submission and dropped after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    pub token_address: Address,
    pub addresses: Vec<Address>,
    pub amounts: Vec<U256>,
}

impl TransferBatch {
    /// Build the batch from the valid list.
    ///
    /// Every address is re-checked with the strict checker first; if any fails
    /// no batch is built. Amounts are scaled by `10^decimals`, index-aligned
    /// with the addresses.
    pub fn build(token: &str, valid: &[RecipientEntry], decimals: u32) -> Result<Self, StagingError> {
        if valid.is_empty() {
            return Err(StagingError::NothingToSend);
        }

        let bad: Vec<String> = valid
            .iter()
            .filter(|entry| !units::is_valid_address(&entry.address))
            .map(|entry| entry.address.clone())
            .collect();
        if !bad.is_empty() {
            return Err(StagingError::InvalidAddresses(bad));
        }

        let token_address = units::parse_address(token.trim())
            .map_err(|_| StagingError::InvalidToken(token.to_string()))?;

        let mut addresses = Vec::with_capacity(valid.len());
        let mut amounts = Vec::with_capacity(valid.len());
        for (index, entry) in valid.iter().enumerate() {
            let address = units::parse_address(&entry.address)
                .map_err(|_| StagingError::InvalidAddresses(vec![entry.address.clone()]))?;
            let amount = units::to_base_unit(entry.amount_str(), decimals).map_err(|e| {
                StagingError::InvalidAmount {
                    index: index + 1,
                    amount: entry.amount_str().to_string(),
                    reason: e.to_string(),
                }
            })?;
            addresses.push(address);
            amounts.push(amount);
        }

        Ok(Self {
            token_address,
            addresses,
            amounts,
        })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Sum of all amounts in the smallest unit
    pub fn total(&self) -> U256 {
        self.amounts.iter().fold(U256::zero(), |acc, x| acc + *x)
    }
}

/// Whether the submit action should be enabled.
pub fn submission_enabled(valid: &[RecipientEntry], totals: &AggregateTotals, in_flight: bool) -> bool {
    !valid.is_empty() && !totals.insufficient_funds() && !in_flight
}

/// Everything a submission attempt needs from the page state
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    pub token_address: &'a str,
    pub decimals: u32,
    pub valid: &'a [RecipientEntry],
    pub totals: &'a AggregateTotals,
    pub from: Address,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub receipt: Receipt,
    pub gas_estimate: U256,
    pub recipients: usize,
    pub total: U256,
}

/// Executes one submission at a time against a contract-call collaborator
pub struct Submitter<C> {
    caller: C,
    estimate_timeout: Duration,
    submit_timeout: Duration,
    max_estimate_retries: u32,
    retry_delay: Duration,
    in_flight: Mutex<()>,
}

impl<C: ContractCaller> Submitter<C> {
    pub fn new(caller: C, estimate_timeout: Duration, submit_timeout: Duration) -> Self {
        Self {
            caller,
            estimate_timeout,
            submit_timeout,
            max_estimate_retries: 0,
            retry_delay: Duration::from_millis(500),
            in_flight: Mutex::new(()),
        }
    }

    pub fn from_config(caller: C, config: &Config) -> Self {
        Self::new(caller, config.estimate_timeout, config.submit_timeout)
            .with_estimate_retries(config.max_estimate_retries)
    }

    /// Retry a timed out or network-failed gas estimate up to `retries` times
    pub fn with_estimate_retries(mut self, retries: u32) -> Self {
        self.max_estimate_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run one submission attempt.
    ///
    /// A second call while one is running fails with
    /// [`StagingError::AlreadyInFlight`] instead of queueing.
    pub async fn submit(&self, request: SubmissionRequest<'_>) -> Result<SubmissionOutcome, StagingError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| StagingError::AlreadyInFlight)?;

        if request.valid.is_empty() {
            return Err(StagingError::NothingToSend);
        }
        if request.totals.insufficient_funds() {
            return Err(StagingError::InsufficientFunds {
                needed: request.totals.total_amount(),
                available: request.totals.account_balance(),
            });
        }

        let batch = TransferBatch::build(request.token_address, request.valid, request.decimals)?;
        info!(
            "Multisend: token {:?}, {} recipients, total {} (smallest unit), from {:?}",
            batch.token_address,
            batch.len(),
            batch.total(),
            request.from
        );

        let gas_estimate = self.estimate_with_retry(&batch, request.from).await?;
        info!("Gas estimate: {}", gas_estimate);

        let receipt = bounded(
            "Transaction submission",
            self.submit_timeout,
            self.caller.submit(&batch, request.from, gas_estimate),
        )
        .await
        .inspect_err(|e| error!("Multisend failed: {}", e))?;

        info!("Multisend complete! Tx: {:?}, Block: {:?}", receipt.tx_hash, receipt.block_number);

        Ok(SubmissionOutcome {
            receipt,
            gas_estimate,
            recipients: batch.len(),
            total: batch.total(),
        })
    }

    async fn estimate_with_retry(&self, batch: &TransferBatch, from: Address) -> Result<U256, StagingError> {
        let mut attempt = 0;
        let mut delay = self.retry_delay;

        loop {
            attempt += 1;
            match bounded("Gas estimation", self.estimate_timeout, self.caller.estimate_gas(batch, from)).await {
                Ok(gas) => return Ok(gas),
                Err(e) if e.is_retryable() && attempt <= self.max_estimate_retries => {
                    warn!(
                        "Gas estimation attempt {} failed ({}), retrying after {:?}",
                        attempt, e, delay
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    error!("Gas estimation failed after {} attempts: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

async fn bounded<T>(
    stage: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, CallError>>,
) -> Result<T, StagingError> {
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(StagingError::from),
        Err(_) => Err(StagingError::Timeout {
            stage,
            secs: limit.as_secs(),
        }),
    }
}
