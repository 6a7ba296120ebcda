//! Wallet provider abstraction for the leads vault.
//!
//! A wallet provider is the capability the storefront pays through: it owns
//! the user's accounts, knows which chain it is pointed at, and signs and
//! broadcasts transactions. The storefront never sees keys; it only asks the
//! provider to switch networks, hand out accounts and send calls.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vault_types::{ChainParams, ConfigSchema, ImplementationRegistry};

pub mod implementations {
	pub mod eip1193;
	pub mod local;
}

/// Errors reported by wallet providers.
#[derive(Debug, Error)]
pub enum WalletError {
	/// The user declined the prompt.
	#[error("Request rejected by user")]
	UserRejected,
	/// The wallet has no configuration for the requested chain.
	#[error("Chain is not known to the wallet")]
	UnknownChain,
	/// The wallet refused or does not implement the request.
	#[error("Unsupported request: {0}")]
	Unsupported(String),
	/// The account cannot cover value plus gas.
	#[error("Insufficient funds: {0}")]
	InsufficientFunds(String),
	/// The call or transaction reverted during execution.
	#[error("Execution reverted: {0}")]
	Reverted(String),
	/// The wallet or node answered with an error that fits no other kind.
	#[error("Request rejected: {0}")]
	Rejected(String),
	/// The wallet or node could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The implementation configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Maps an EIP-1193 / JSON-RPC error object onto the wallet error kinds.
pub fn classify_rpc_error(code: i64, message: &str) -> WalletError {
	let lowered = message.to_lowercase();
	match code {
		4001 => WalletError::UserRejected,
		4902 => WalletError::UnknownChain,
		4100 | 4200 => WalletError::Unsupported(message.to_string()),
		_ if lowered.contains("insufficient funds") => {
			WalletError::InsufficientFunds(message.to_string())
		},
		_ if lowered.contains("execution reverted") || code == 3 => {
			WalletError::Reverted(message.to_string())
		},
		_ if lowered.contains("user rejected") || lowered.contains("user denied") => {
			WalletError::UserRejected
		},
		_ if lowered.contains("unrecognized chain") => WalletError::UnknownChain,
		_ => WalletError::Rejected(format!("RPC error {}: {}", code, message)),
	}
}

/// A value-carrying contract call to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCall {
	pub from: Address,
	pub to: Address,
	pub data: Bytes,
	pub value: U256,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletReceipt {
	pub tx_hash: B256,
	pub block_number: u64,
	/// `false` when the transaction reverted.
	pub success: bool,
}

/// Notifications a wallet pushes to its host outside of any request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ProviderEvent {
	AccountsChanged(Vec<Address>),
	ChainChanged(u64),
	Disconnected,
}

/// Capability interface of a wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
	/// Returns the configuration schema for this wallet implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Chain the wallet currently signs for.
	async fn chain_id(&self) -> Result<u64, WalletError>;

	/// Points the wallet at another chain. Fails with
	/// [`WalletError::UnknownChain`] when the chain was never added.
	async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

	/// Registers a chain with the wallet so it can be switched to.
	async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError>;

	/// Asks the user for account access. The first entry is the primary account.
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// Read-only contract call on the current chain.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;

	/// Signs and broadcasts a transaction, returning its hash.
	async fn send_transaction(&self, tx: TransactionCall) -> Result<B256, WalletError>;

	/// Waits until the transaction is mined with the requested number of
	/// confirmations. Callers bound the wait.
	async fn wait_for_receipt(
		&self,
		tx_hash: B256,
		confirmations: u64,
	) -> Result<WalletReceipt, WalletError>;

	/// Native currency balance of `address` on the current chain.
	async fn get_balance(&self, address: Address) -> Result<U256, WalletError>;
}

/// Type alias for wallet factory functions.
///
/// Factories receive the implementation's TOML table and the parameters of
/// the chain the storefront sells on.
pub type WalletFactory =
	fn(&toml::Value, &ChainParams) -> Result<Box<dyn WalletProvider>, WalletError>;

/// Registry trait for wallet implementations.
pub trait WalletRegistry: ImplementationRegistry<Factory = WalletFactory> {}

/// Get all registered wallet implementations.
pub fn get_all_implementations() -> Vec<(&'static str, WalletFactory)> {
	use implementations::{eip1193, local};

	vec![
		(local::Registry::NAME, local::Registry::factory()),
		(eip1193::Registry::NAME, eip1193::Registry::factory()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_provider_codes_are_classified() {
		assert!(matches!(
			classify_rpc_error(4001, "User rejected the request."),
			WalletError::UserRejected
		));
		assert!(matches!(
			classify_rpc_error(4902, "Unrecognized chain ID \"0x2105\""),
			WalletError::UnknownChain
		));
		assert!(matches!(
			classify_rpc_error(4100, "unauthorized"),
			WalletError::Unsupported(_)
		));
		assert!(matches!(
			classify_rpc_error(4200, "method not supported"),
			WalletError::Unsupported(_)
		));
	}

	#[test]
	fn test_node_messages_are_classified() {
		assert!(matches!(
			classify_rpc_error(-32000, "insufficient funds for gas * price + value"),
			WalletError::InsufficientFunds(_)
		));
		assert!(matches!(
			classify_rpc_error(3, "execution reverted: wrong value"),
			WalletError::Reverted(_)
		));
	}

	#[test]
	fn test_other_error_responses_are_rejections() {
		assert!(matches!(
			classify_rpc_error(-32000, "nonce too low"),
			WalletError::Rejected(_)
		));
		match classify_rpc_error(-32603, "internal error") {
			WalletError::Rejected(msg) => assert_eq!(msg, "RPC error -32603: internal error"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_registered_implementations() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["local", "eip1193"]);
	}

	#[test]
	fn test_provider_event_wire_format() {
		let event = ProviderEvent::ChainChanged(8453);
		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json, serde_json::json!({"type": "chainChanged", "value": 8453}));

		let parsed: ProviderEvent =
			serde_json::from_value(serde_json::json!({"type": "disconnected"})).unwrap();
		assert_eq!(parsed, ProviderEvent::Disconnected);
	}
}
