//! Token selection and the wallet token-balance indexer.

use crate::recipients::ADDRESS_LENGTH;
use crate::units::{self, BASE_UNIT_DECIMALS};
use ethers::types::U256;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Chains the indexer can answer for
pub const INDEXER_SUPPORTED_CHAINS: &[u64] = &[1, 56, 137, 17000, 80001, 80002, 10200];

pub fn indexer_supports(chain_id: u64) -> bool {
    INDEXER_SUPPORTED_CHAINS.contains(&chain_id)
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Unsupported network. Please connect to a supported network. (chain id {0})")]
    UnsupportedChain(u64),
    #[error("Token indexer API key is not configured")]
    MissingApiKey,
    #[error("Token indexer returned HTTP {0}")]
    Http(u16),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u32),
    Text(String),
}

fn de_decimals<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
        None => Ok(BASE_UNIT_DECIMALS),
    }
}

/// One ERC-20 holding of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    pub token_address: String,
    /// Raw balance in the token's smallest unit, as a decimal string
    pub balance: String,
    #[serde(deserialize_with = "de_decimals", default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    BASE_UNIT_DECIMALS
}

impl TokenBalance {
    /// Balance scaled down by the token's decimals
    pub fn display_balance(&self) -> f64 {
        match U256::from_dec_str(self.balance.trim()) {
            Ok(raw) => units::base_unit_to_f64(raw, self.decimals),
            Err(_) => 0.0,
        }
    }

    /// Token address shortened for the picker list
    pub fn short_address(&self) -> &str {
        let end = self.token_address.len().min(36);
        self.token_address.get(..end).unwrap_or(&self.token_address)
    }
}

/// The token the batch will transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedToken {
    pub address: String,
    pub decimals: u32,
}

impl SelectedToken {
    pub fn from_balance(token: &TokenBalance) -> Self {
        Self {
            address: token.token_address.clone(),
            decimals: token.decimals,
        }
    }

    /// Accept a manually typed token address (length rule only)
    pub fn manual(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.chars().count() == ADDRESS_LENGTH {
            Ok(Self {
                address: trimmed.to_string(),
                decimals: BASE_UNIT_DECIMALS,
            })
        } else {
            Err("Please enter a valid token address.".to_string())
        }
    }
}

/// Lists a wallet's token balances on a chain
pub trait TokenIndexer {
    fn get_wallet_token_balances(
        &self,
        address: &str,
        chain_id: u64,
    ) -> impl Future<Output = Result<Vec<TokenBalance>, IndexerError>> + Send;
}

/// Moralis-style REST indexer
#[derive(Clone)]
pub struct MoralisIndexer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MoralisIndexer {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, IndexerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn balances_url(&self, address: &str, chain_id: u64) -> String {
        format!(
            "{}/{}/erc20?chain=0x{:x}",
            self.base_url.trim_end_matches('/'),
            address,
            chain_id
        )
    }
}

impl TokenIndexer for MoralisIndexer {
    async fn get_wallet_token_balances(&self, address: &str, chain_id: u64) -> Result<Vec<TokenBalance>, IndexerError> {
        if !indexer_supports(chain_id) {
            return Err(IndexerError::UnsupportedChain(chain_id));
        }
        let api_key = self.api_key.as_deref().ok_or(IndexerError::MissingApiKey)?;

        let url = self.balances_url(address, chain_id);
        debug!("Fetching token balances from {}", url);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Token indexer error {} for {}", response.status(), address);
            return Err(IndexerError::Http(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_balance_deserializes_both_decimal_forms() {
        let json = r#"[
            {"token_address":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","name":"Tether","symbol":"USDT","balance":"2500000","decimals":6},
            {"token_address":"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb","name":"Other","symbol":"OTH","balance":"1500000000000000000","decimals":"18","logo":null}
        ]"#;
        let tokens: Vec<TokenBalance> = serde_json::from_str(json).unwrap();
        assert_eq!(tokens[0].decimals, 6);
        assert_eq!(tokens[0].display_balance(), 2.5);
        assert_eq!(tokens[1].decimals, 18);
        assert_eq!(tokens[1].display_balance(), 1.5);
    }

    #[test]
    fn test_display_balance_garbage_is_zero() {
        let token = TokenBalance {
            name: String::new(),
            symbol: String::new(),
            token_address: "0xabc".into(),
            balance: "lots".into(),
            decimals: 18,
        };
        assert_eq!(token.display_balance(), 0.0);
        assert_eq!(token.short_address(), "0xabc");
    }

    #[test]
    fn test_manual_token_selection() {
        let token = SelectedToken::manual(" 0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa ").unwrap();
        assert_eq!(token.address, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(token.decimals, BASE_UNIT_DECIMALS);
        assert_eq!(
            SelectedToken::manual("0x1234").unwrap_err(),
            "Please enter a valid token address."
        );
        assert!(SelectedToken::manual("").is_err());
    }

    #[test]
    fn test_indexer_support() {
        assert!(indexer_supports(137));
        assert!(indexer_supports(10200));
        assert!(!indexer_supports(11155111));
    }

    #[test]
    fn test_balances_url() {
        let indexer = MoralisIndexer::new("https://example.com/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            indexer.balances_url("0xabc", 56),
            "https://example.com/api/0xabc/erc20?chain=0x38"
        );
    }

    #[tokio::test]
    async fn test_unsupported_chain_fails_before_request() {
        let indexer = MoralisIndexer::new("http://127.0.0.1:9", Some("key".into()), Duration::from_secs(1)).unwrap();
        let err = indexer.get_wallet_token_balances("0xabc", 31337).await.unwrap_err();
        assert!(matches!(err, IndexerError::UnsupportedChain(31337)));
    }

    #[test]
    fn test_missing_api_key() {
        let indexer = MoralisIndexer::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        let result = tokio_test::block_on(indexer.get_wallet_token_balances("0xabc", 1));
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, IndexerError::MissingApiKey));
    }
}
