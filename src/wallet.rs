//! Wallet and contract-call collaborators.
//!
//! The page controller only talks to the [`WalletProvider`] and
//! [`ContractCaller`] traits; [`EthersWallet`] is the concrete integration
//! backed by an ethers provider and a local signing key.

use crate::config::Config;
use crate::contract;
use crate::staging::TransferBatch;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure reported by a wallet or contract-call collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The user (or signer) refused to sign
    #[error("Transaction was rejected: {0}")]
    Rejected(String),
    /// The call reverted on-chain or during estimation
    #[error("Contract call reverted: {0}")]
    Reverted(String),
    /// Transport level failure (RPC unreachable, rate limited, ...)
    #[error("Network error: {0}")]
    Network(String),
    /// No wallet is connected or configured
    #[error("No wallet available: {0}")]
    WalletUnavailable(String),
    #[error("{0}")]
    Other(String),
}

impl CallError {
    /// Classify a collaborator error message
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("rejected") || lower.contains("denied") || lower.contains("user refused") {
            CallError::Rejected(message)
        } else if lower.contains("revert") || lower.contains("execution reverted") {
            CallError::Reverted(message)
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("network")
            || lower.contains("connection")
            || lower.contains("temporarily")
            || lower.contains("rate limit")
            || lower.contains("bad response")
            || lower.contains("error sending request")
        {
            CallError::Network(message)
        } else {
            CallError::Other(message)
        }
    }
}

/// Notifications pushed by the wallet when the session changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
}

/// Account and balance access
pub trait WalletProvider {
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, CallError>> + Send;

    /// Balance in the smallest unit
    fn get_balance(&self, account: Address) -> impl Future<Output = Result<U256, CallError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<u64, CallError>> + Send;
}

/// Batched transfer execution against the multisender contract
pub trait ContractCaller {
    fn estimate_gas(
        &self,
        batch: &TransferBatch,
        from: Address,
    ) -> impl Future<Output = Result<U256, CallError>> + Send;

    fn submit(
        &self,
        batch: &TransferBatch,
        from: Address,
        gas: U256,
    ) -> impl Future<Output = Result<Receipt, CallError>> + Send;
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Wallet backed by an HTTP provider and a local private key
#[derive(Clone)]
pub struct EthersWallet {
    client: Arc<SignerClient>,
    multisender: Address,
}

impl EthersWallet {
    /// Connect to the configured RPC and load the signing key
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let key = config
            .private_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("PRIVATE_KEY is not set; no wallet to connect"))?;
        let provider = config.get_provider().await?;
        let signer: LocalWallet = key.trim().parse::<LocalWallet>()?.with_chain_id(config.chain_id);
        info!("Connected wallet {:?} on chain {}", signer.address(), config.chain_id);

        let client = SignerMiddleware::new((*provider).clone(), signer);
        Ok(Self {
            client: Arc::new(client),
            multisender: config.multisender_address()?,
        })
    }

    pub fn address(&self) -> Address {
        self.client.address()
    }

    pub fn multisender(&self) -> Address {
        self.multisender
    }

    fn multisend_tx(&self, batch: &TransferBatch, from: Address) -> Result<TypedTransaction, CallError> {
        let calldata = contract::encode_multisend(batch).map_err(|e| CallError::Other(e.to_string()))?;
        debug!("multisendToken calldata: {} bytes", calldata.len());
        Ok(TransactionRequest::new()
            .from(from)
            .to(self.multisender)
            .data(calldata)
            .into())
    }

    /// Send an arbitrary call to `to` carrying `value` in the native token
    pub async fn send_call(&self, to: Address, calldata: Bytes, value: U256) -> Result<Receipt, CallError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(self.address())
            .to(to)
            .data(calldata)
            .value(value)
            .into();
        self.send_typed(tx).await
    }

    async fn send_typed(&self, tx: TypedTransaction) -> Result<Receipt, CallError> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| CallError::classify(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        info!("Transaction sent: {:?}", tx_hash);

        let receipt = pending
            .await
            .map_err(|e| CallError::classify(e.to_string()))?;

        match receipt {
            Some(receipt) => {
                if receipt.status == Some(U64::zero()) {
                    return Err(CallError::Reverted(format!("transaction {:?} reverted", tx_hash)));
                }
                Ok(Receipt {
                    tx_hash,
                    block_number: receipt.block_number.map(|n| n.as_u64()),
                    gas_used: receipt.gas_used,
                    effective_gas_price: receipt.effective_gas_price,
                })
            }
            None => Ok(Receipt {
                tx_hash,
                block_number: None,
                gas_used: None,
                effective_gas_price: None,
            }),
        }
    }
}

impl WalletProvider for EthersWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, CallError> {
        Ok(vec![self.address()])
    }

    async fn get_balance(&self, account: Address) -> Result<U256, CallError> {
        self.client
            .get_balance(account, None)
            .await
            .map_err(|e| CallError::classify(e.to_string()))
    }

    async fn chain_id(&self) -> Result<u64, CallError> {
        self.client
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| CallError::classify(e.to_string()))
    }
}

impl ContractCaller for EthersWallet {
    async fn estimate_gas(&self, batch: &TransferBatch, from: Address) -> Result<U256, CallError> {
        let tx = self.multisend_tx(batch, from)?;
        self.client
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| CallError::classify(e.to_string()))
    }

    async fn submit(&self, batch: &TransferBatch, from: Address, gas: U256) -> Result<Receipt, CallError> {
        let mut tx = self.multisend_tx(batch, from)?;
        tx.set_gas(gas);
        self.send_typed(tx).await
    }
}
