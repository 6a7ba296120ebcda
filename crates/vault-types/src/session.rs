//! Wallet session state.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// The process's single active wallet connection.
///
/// Created by the gateway on a successful connect and dropped on explicit
/// disconnect or when the provider reports that the wallet went away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
	/// Primary account returned by the wallet.
	pub address: Address,
	/// Chain the wallet reported when the session was last updated.
	pub chain_id: u64,
	/// Whether the session is live.
	pub connected: bool,
}

impl WalletSession {
	pub fn new(address: Address, chain_id: u64) -> Self {
		Self {
			address,
			chain_id,
			connected: true,
		}
	}
}
