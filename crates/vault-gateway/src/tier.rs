//! Tier rule for per-lead pricing.
//!
//! Mirrors the rule the contract applies when it checks the attached value:
//! tier id 1 always pays the low price, otherwise the lead count picks the
//! tier (above 50 high, above 25 medium, else base).

use vault_types::{PriceSchedule, PricingTier, U256};

const HIGH_TIER_THRESHOLD: u64 = 50;
const MEDIUM_TIER_THRESHOLD: u64 = 25;
const LOW_PRICE_TIER_ID: u64 = 1;

/// Picks the pricing tier for a purchase.
pub fn resolve_tier(lead_count: u64, tier_id: u64) -> PricingTier {
	if tier_id == LOW_PRICE_TIER_ID {
		PricingTier::Low
	} else if lead_count > HIGH_TIER_THRESHOLD {
		PricingTier::High
	} else if lead_count > MEDIUM_TIER_THRESHOLD {
		PricingTier::Medium
	} else {
		PricingTier::Base
	}
}

/// Per-lead price for a purchase under `schedule`.
pub fn resolve_unit_price(schedule: &PriceSchedule, lead_count: u64, tier_id: u64) -> U256 {
	schedule.price_for(resolve_tier(lead_count, tier_id))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schedule() -> PriceSchedule {
		PriceSchedule {
			base: U256::from(500),
			medium: U256::from(400),
			high: U256::from(300),
			low: U256::from(200),
		}
	}

	#[test]
	fn test_tier_one_is_always_low() {
		for lead_count in [1, 10, 25, 26, 50, 51, 1_000] {
			assert_eq!(resolve_tier(lead_count, 1), PricingTier::Low);
			assert_eq!(resolve_unit_price(&schedule(), lead_count, 1), U256::from(200));
		}
	}

	#[test]
	fn test_tier_boundaries() {
		for tier_id in [0, 2, 3, 99] {
			assert_eq!(resolve_tier(1, tier_id), PricingTier::Base);
			assert_eq!(resolve_tier(25, tier_id), PricingTier::Base);
			assert_eq!(resolve_tier(26, tier_id), PricingTier::Medium);
			assert_eq!(resolve_tier(50, tier_id), PricingTier::Medium);
			assert_eq!(resolve_tier(51, tier_id), PricingTier::High);
		}
	}

	#[test]
	fn test_default_packages_price() {
		let schedule = schedule();
		assert_eq!(resolve_unit_price(&schedule, 10, 2), schedule.base);
		assert_eq!(resolve_unit_price(&schedule, 25, 2), schedule.base);
		assert_eq!(resolve_unit_price(&schedule, 50, 2), schedule.medium);
	}
}
