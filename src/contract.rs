use crate::staging::TransferBatch;
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use anyhow::Result;
use std::sync::OnceLock;

/// The deployed multisender contract
pub const MULTISENDER_CONTRACT_ADDRESS: &str = "0x86889B10376dB115763050eba1Ed20b1d4Eb0fd3";

/// Cached parsed multisender address (parsed once at first access)
static MULTISENDER_ADDRESS_PARSED: OnceLock<Option<Address>> = OnceLock::new();

/// Get the parsed default multisender address
pub fn default_multisender_address() -> Option<Address> {
    *MULTISENDER_ADDRESS_PARSED.get_or_init(|| MULTISENDER_CONTRACT_ADDRESS.parse().ok())
}

/// multisendToken(address token, address[] recipients, uint256[] amounts)
#[allow(deprecated)]
pub fn multisend_token_function() -> Function {
    Function {
        name: "multisendToken".to_string(),
        inputs: vec![
            Param {
                name: "token".to_string(),
                kind: ParamType::Address,
                internal_type: None,
            },
            Param {
                name: "recipients".to_string(),
                kind: ParamType::Array(Box::new(ParamType::Address)),
                internal_type: None,
            },
            Param {
                name: "amounts".to_string(),
                kind: ParamType::Array(Box::new(ParamType::Uint(256))),
                internal_type: None,
            },
        ],
        outputs: vec![],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

/// becomeVip(uint256 tier), paid in the native token
#[allow(deprecated)]
pub fn become_vip_function() -> Function {
    Function {
        name: "becomeVip".to_string(),
        inputs: vec![Param {
            name: "tier".to_string(),
            kind: ParamType::Uint(256),
            internal_type: None,
        }],
        outputs: vec![],
        constant: None,
        state_mutability: StateMutability::Payable,
    }
}

/// Encode the calldata for one batched transfer
pub fn encode_multisend(batch: &TransferBatch) -> Result<Bytes> {
    let func = multisend_token_function();
    let recipient_tokens: Vec<Token> = batch.addresses.iter().map(|a| Token::Address(*a)).collect();
    let amount_tokens: Vec<Token> = batch.amounts.iter().map(|a| Token::Uint(*a)).collect();
    let calldata = func.encode_input(&[
        Token::Address(batch.token_address),
        Token::Array(recipient_tokens),
        Token::Array(amount_tokens),
    ])?;
    Ok(calldata.into())
}

/// Encode the calldata for a VIP tier purchase
pub fn encode_become_vip(tier: u8) -> Result<Bytes> {
    let calldata = become_vip_function().encode_input(&[Token::Uint(U256::from(tier))])?;
    Ok(calldata.into())
}
