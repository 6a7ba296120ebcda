//! Network parameters for wallet chain management.
//!
//! When a wallet does not know the chain the storefront runs on, the gateway
//! asks it to add the chain using these parameters before switching.

use serde::{Deserialize, Serialize};

/// Native currency descriptor, as expected by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

impl Default for NativeCurrency {
	fn default() -> Self {
		Self {
			name: "ETH".to_string(),
			symbol: "ETH".to_string(),
			decimals: 18,
		}
	}
}

/// Everything a wallet needs to register a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
	pub chain_id: u64,
	pub chain_name: String,
	pub native_currency: NativeCurrency,
	pub rpc_urls: Vec<String>,
	#[serde(default)]
	pub block_explorer_urls: Vec<String>,
}

impl ChainParams {
	/// Chain id in the `0x`-prefixed hex form used by EIP-1193 wallets.
	pub fn hex_chain_id(&self) -> String {
		format!("0x{:x}", self.chain_id)
	}

	/// JSON body of a `wallet_addEthereumChain` request parameter.
	pub fn to_add_chain_param(&self) -> serde_json::Value {
		serde_json::json!({
			"chainId": self.hex_chain_id(),
			"chainName": self.chain_name,
			"nativeCurrency": {
				"name": self.native_currency.name,
				"symbol": self.native_currency.symbol,
				"decimals": self.native_currency.decimals,
			},
			"rpcUrls": self.rpc_urls,
			"blockExplorerUrls": self.block_explorer_urls,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_chain_param_shape() {
		let params = ChainParams {
			chain_id: 8453,
			chain_name: "Base".to_string(),
			native_currency: NativeCurrency::default(),
			rpc_urls: vec!["https://mainnet.base.org".to_string()],
			block_explorer_urls: vec!["https://basescan.org".to_string()],
		};

		assert_eq!(params.hex_chain_id(), "0x2105");
		let value = params.to_add_chain_param();
		assert_eq!(value["chainId"], "0x2105");
		assert_eq!(value["nativeCurrency"]["decimals"], 18);
		assert_eq!(value["rpcUrls"][0], "https://mainnet.base.org");
	}
}
