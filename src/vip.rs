//! VIP tier purchase through the multisender contract.

use crate::contract;
use crate::units::{self, BASE_UNIT_DECIMALS};
use crate::wallet::{EthersWallet, Receipt};
use anyhow::{anyhow, Result};
use ethers::types::{Address, Bytes, U256};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VipTier {
    pub id: u8,
    pub name: &'static str,
    /// Price in the native token
    pub price: f64,
}

pub const VIP_TIERS: &[VipTier] = &[
    VipTier { id: 0, name: "Starter - 1 day", price: 0.1 },
    VipTier { id: 1, name: "Professional - 7 days", price: 0.2 },
    VipTier { id: 2, name: "Business - 1 month", price: 1.4 },
];

pub fn find_tier(id: u8) -> Option<&'static VipTier> {
    VIP_TIERS.iter().find(|t| t.id == id)
}

/// A tier can be bought only when the balance covers its price
pub fn is_tier_active(tier: &VipTier, balance: f64) -> bool {
    balance >= tier.price
}

/// A ready-to-send tier purchase
#[derive(Debug, Clone, PartialEq)]
pub struct VipPurchase {
    pub tier: VipTier,
    pub value: U256,
    pub calldata: Bytes,
}

/// Check the tier against the balance and build the payable call
pub fn prepare_purchase(tier_id: Option<u8>, balance: f64) -> Result<VipPurchase> {
    let tier_id = tier_id.ok_or_else(|| anyhow!("Please select a VIP tier."))?;
    let tier = *find_tier(tier_id).ok_or_else(|| anyhow!("Invalid VIP tier selected."))?;
    if !is_tier_active(&tier, balance) {
        return Err(anyhow!(
            "Insufficient balance for {}: {} needed, {:.4} available",
            tier.name,
            tier.price,
            balance
        ));
    }

    Ok(VipPurchase {
        tier,
        value: units::to_base_unit(&tier.price.to_string(), BASE_UNIT_DECIMALS)?,
        calldata: contract::encode_become_vip(tier.id)?,
    })
}

/// Send the purchase to the multisender contract
pub async fn buy_vip(wallet: &EthersWallet, multisender: Address, purchase: VipPurchase) -> Result<Receipt> {
    info!("Buying VIP tier '{}' for {} wei", purchase.tier.name, purchase.value);
    let receipt = wallet
        .send_call(multisender, purchase.calldata, purchase.value)
        .await?;
    info!("Successfully purchased the {} VIP pack.", purchase.tier.name);
    Ok(receipt)
}
