//! Binding for the priced leads contract.

use crate::GatewayError;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use vault_types::PriceSchedule;
use vault_wallet::WalletProvider;

sol! {
	/// Leads vault contract. Prices are per lead, in wei.
	#[allow(missing_docs)]
	interface ILeadsVault {
		function price_base() external view returns (uint256);
		function price_medium() external view returns (uint256);
		function price_high() external view returns (uint256);
		function price_low() external view returns (uint256);
		function buyLead(uint256 lead_amount, uint256 bd_id) external payable;
		function getLeads(uint256 bd_id, address user) external view returns (uint256);
	}
}

use ILeadsVault::{
	buyLeadCall, getLeadsCall, price_baseCall, price_highCall, price_lowCall, price_mediumCall,
};

/// A leads contract bound to an address. Calls go through the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadsContract {
	address: Address,
}

impl LeadsContract {
	pub fn new(address: Address) -> Self {
		Self { address }
	}

	pub fn address(&self) -> Address {
		self.address
	}

	async fn view<C: SolCall>(
		&self,
		wallet: &dyn WalletProvider,
		call: C,
	) -> Result<C::Return, GatewayError> {
		let output = wallet
			.call(self.address, Bytes::from(call.abi_encode()))
			.await
			.map_err(|e| GatewayError::Provider(format!("{} failed: {}", C::SIGNATURE, e)))?;
		// Calls to an address without code succeed with empty output.
		if output.is_empty() {
			return Err(GatewayError::ContractUnavailable);
		}
		C::abi_decode_returns(&output, true).map_err(|e| {
			GatewayError::Provider(format!("Failed to decode {} result: {}", C::SIGNATURE, e))
		})
	}

	/// Reads all four tier prices concurrently.
	pub async fn read_prices(
		&self,
		wallet: &dyn WalletProvider,
	) -> Result<PriceSchedule, GatewayError> {
		let (base, medium, high, low) = tokio::try_join!(
			self.view(wallet, price_baseCall {}),
			self.view(wallet, price_mediumCall {}),
			self.view(wallet, price_highCall {}),
			self.view(wallet, price_lowCall {}),
		)?;

		Ok(PriceSchedule {
			base: base._0,
			medium: medium._0,
			high: high._0,
			low: low._0,
		})
	}

	/// On-chain count of leads `user` bought under `tier_id`.
	pub async fn purchased_leads(
		&self,
		wallet: &dyn WalletProvider,
		tier_id: u64,
		user: Address,
	) -> Result<U256, GatewayError> {
		let result = self
			.view(
				wallet,
				getLeadsCall {
					bd_id: U256::from(tier_id),
					user,
				},
			)
			.await?;
		Ok(result._0)
	}

	/// Calldata of `buyLead(lead_count, tier_id)`.
	pub fn buy_lead_calldata(&self, lead_count: u64, tier_id: u64) -> Bytes {
		Bytes::from(
			buyLeadCall {
				lead_amount: U256::from(lead_count),
				bd_id: U256::from(tier_id),
			}
			.abi_encode(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_interface_signatures() {
		assert_eq!(buyLeadCall::SIGNATURE, "buyLead(uint256,uint256)");
		assert_eq!(getLeadsCall::SIGNATURE, "getLeads(uint256,address)");
		assert_eq!(price_baseCall::SIGNATURE, "price_base()");
	}

	#[test]
	fn test_buy_lead_calldata() {
		let contract = LeadsContract::new(Address::repeat_byte(0xcc));

		let data = contract.buy_lead_calldata(25, 2);

		assert_eq!(data[..4], buyLeadCall::SELECTOR);
		let decoded = buyLeadCall::abi_decode(&data, true).unwrap();
		assert_eq!(decoded.lead_amount, U256::from(25));
		assert_eq!(decoded.bd_id, U256::from(2));
	}
}
