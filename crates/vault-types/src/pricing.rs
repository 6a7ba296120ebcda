//! Pricing types for lead purchases.
//!
//! All amounts are held in wei as `U256` so totals are computed with exact
//! integer arithmetic. Formatting to decimal ETH happens only at the edges.

use crate::api::u256_serde;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four pricing brackets exposed by the leads contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
	Low,
	Base,
	Medium,
	High,
}

impl PricingTier {
	pub fn as_str(&self) -> &'static str {
		match self {
			PricingTier::Low => "low",
			PricingTier::Base => "base",
			PricingTier::Medium => "medium",
			PricingTier::High => "high",
		}
	}
}

impl fmt::Display for PricingTier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Snapshot of the contract's per-lead prices, in wei.
///
/// Stale as soon as it is read; the gateway re-reads it before every purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSchedule {
	#[serde(with = "u256_serde")]
	pub base: U256,
	#[serde(with = "u256_serde")]
	pub medium: U256,
	#[serde(with = "u256_serde")]
	pub high: U256,
	#[serde(with = "u256_serde")]
	pub low: U256,
}

impl PriceSchedule {
	/// Returns the per-lead price of the given tier.
	pub fn price_for(&self, tier: PricingTier) -> U256 {
		match tier {
			PricingTier::Low => self.low,
			PricingTier::Base => self.base,
			PricingTier::Medium => self.medium,
			PricingTier::High => self.high,
		}
	}
}

/// A priced purchase ready for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
	/// Number of leads to buy. Always positive.
	pub lead_count: u64,
	/// Tier id passed to the contract as `bd_id`.
	pub tier_id: u64,
	/// Per-lead price selected by the tier rule.
	#[serde(with = "u256_serde")]
	pub unit_price: U256,
}

impl PurchaseRequest {
	/// Value attached to the transaction: `unit_price * lead_count` in wei.
	///
	/// Returns `None` on overflow.
	pub fn total_value(&self) -> Option<U256> {
		self.unit_price.checked_mul(U256::from(self.lead_count))
	}
}

/// Confirmation-step payload shown to the user before a purchase is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseQuote {
	/// Package this quote was built for, if any.
	pub package_id: Option<u32>,
	pub lead_count: u64,
	pub tier_id: u64,
	pub tier: PricingTier,
	#[serde(with = "u256_serde")]
	pub unit_price: U256,
	#[serde(with = "u256_serde")]
	pub total: U256,
}

/// Result of a confirmed purchase. Never partially constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
	/// Transaction hash, 0x-prefixed.
	pub transaction_id: String,
	pub lead_count: u64,
	#[serde(with = "u256_serde")]
	pub total_paid: U256,
	/// Block the transaction was included in.
	pub block_number: u64,
}

/// A purchasable bundle of leads offered by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPackage {
	pub id: u32,
	pub lead_count: u64,
	/// Tier id sent with the purchase.
	#[serde(default = "default_package_tier_id")]
	pub tier_id: u64,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub popular: bool,
}

fn default_package_tier_id() -> u64 {
	2
}

impl LeadPackage {
	/// The catalogue offered when the configuration does not define one.
	pub fn default_catalogue() -> Vec<LeadPackage> {
		vec![
			LeadPackage {
				id: 1,
				lead_count: 10,
				tier_id: default_package_tier_id(),
				description: "Fresh leads for small outreach".to_string(),
				popular: false,
			},
			LeadPackage {
				id: 2,
				lead_count: 25,
				tier_id: default_package_tier_id(),
				description: "Most popular vault access".to_string(),
				popular: true,
			},
			LeadPackage {
				id: 3,
				lead_count: 50,
				tier_id: default_package_tier_id(),
				description: "Full vault access for large campaigns".to_string(),
				popular: false,
			},
		]
	}
}
