//! What the presentation layer renders.

use serde::Serialize;
use std::fmt;
use vault_gateway::{resolve_tier, resolve_unit_price, GatewayPhase};
use vault_types::{
	format_token_amount, shorten_address, u256_serde, AccessSummary, Address, Lead, LeadPackage,
	LeadsMetadata, PriceSchedule, PricingTier, PurchaseQuote, PurchaseReceipt, U256,
	NATIVE_DECIMALS,
};

/// User-facing status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Status {
	#[default]
	Idle,
	Loading(String),
	Error(String),
	Success(String),
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Status::Idle => Ok(()),
			Status::Loading(msg) | Status::Error(msg) | Status::Success(msg) => f.write_str(msg),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
	pub address: Address,
	/// `0x1234...abcd`
	pub short_address: String,
	pub chain_id: u64,
}

/// A catalogue entry together with its price under the current schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageView {
	#[serde(flatten)]
	pub package: LeadPackage,
	pub tier: PricingTier,
	/// Total in wei, absent until prices were read.
	#[serde(with = "option_u256")]
	pub total: Option<U256>,
	/// Total formatted in the native currency, e.g. `0.005 ETH`.
	pub display_total: Option<String>,
}

impl PackageView {
	pub fn new(package: &LeadPackage, prices: Option<&PriceSchedule>, symbol: &str) -> Self {
		let total = prices.and_then(|schedule| {
			resolve_unit_price(schedule, package.lead_count, package.tier_id)
				.checked_mul(U256::from(package.lead_count))
		});
		Self {
			package: package.clone(),
			tier: resolve_tier(package.lead_count, package.tier_id),
			total,
			display_total: total.map(|wei| format_eth(wei, symbol)),
		}
	}
}

/// Formats a wei amount as `<amount> <symbol>`.
pub fn format_eth(wei: U256, symbol: &str) -> String {
	format!("{} {}", format_token_amount(&wei.to_string(), NATIVE_DECIMALS), symbol)
}

/// Snapshot of the storefront.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontView {
	pub wallet: Option<WalletView>,
	pub phase: GatewayPhase,
	pub prices: Option<PriceSchedule>,
	pub packages: Vec<PackageView>,
	pub leads: Vec<Lead>,
	pub leads_loading: bool,
	/// Why the last leads reload failed; cleared by a successful one.
	pub leads_error: Option<String>,
	pub metadata: Option<LeadsMetadata>,
	pub access: Option<AccessSummary>,
	pub status: Status,
	pub pending_quote: Option<PurchaseQuote>,
	pub last_receipt: Option<PurchaseReceipt>,
	/// Explorer link of the last receipt's transaction.
	pub last_receipt_url: Option<String>,
	#[serde(with = "option_u256")]
	pub purchased_balance: Option<U256>,
}

impl WalletView {
	pub fn new(address: Address, chain_id: u64) -> Self {
		Self {
			address,
			short_address: shorten_address(&address),
			chain_id,
		}
	}
}

mod option_u256 {
	use super::u256_serde;
	use serde::Serializer;
	use vault_types::U256;

	pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => u256_serde::serialize(v, serializer),
			None => serializer.serialize_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wei(eth: &str) -> U256 {
		vault_types::parse_token_amount(eth, 18).unwrap()
	}

	#[test]
	fn test_package_prices_follow_tier_rule() {
		let schedule = PriceSchedule {
			base: wei("0.0005"),
			medium: wei("0.0004"),
			high: wei("0.0003"),
			low: wei("0.0002"),
		};
		let catalogue = LeadPackage::default_catalogue();
		let views: Vec<_> = catalogue
			.iter()
			.map(|p| PackageView::new(p, Some(&schedule), "ETH"))
			.collect();

		assert_eq!(views[0].display_total.as_deref(), Some("0.005 ETH"));
		// 25 leads is still the base tier.
		assert_eq!(views[1].tier, PricingTier::Base);
		assert_eq!(views[1].display_total.as_deref(), Some("0.0125 ETH"));
		assert_eq!(views[2].tier, PricingTier::Medium);
		assert_eq!(views[2].display_total.as_deref(), Some("0.02 ETH"));
	}

	#[test]
	fn test_package_without_prices() {
		let package = &LeadPackage::default_catalogue()[0];
		let view = PackageView::new(package, None, "ETH");
		assert!(view.total.is_none());
		assert!(view.display_total.is_none());

		let json = serde_json::to_value(&view).unwrap();
		assert_eq!(json["lead_count"], 10);
		assert!(json["total"].is_null());
	}

	#[test]
	fn test_status_wire_format() {
		let json = serde_json::to_value(Status::Success("done".into())).unwrap();
		assert_eq!(json, serde_json::json!({"kind": "success", "message": "done"}));
	}
}
