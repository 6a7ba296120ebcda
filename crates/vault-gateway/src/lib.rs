//! Chain gateway for the leads vault.
//!
//! The gateway owns everything the storefront does on chain: the wallet
//! session, making sure the wallet is on the right network, the binding to
//! the leads contract, price reads, and the paying `buyLead` transaction.

pub mod contract;
mod gateway;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod tier;

use alloy_primitives::U256;
use thiserror::Error;
use vault_wallet::WalletError;

pub use contract::LeadsContract;
pub use gateway::{ChainGateway, GatewayPhase, GatewaySettings};
pub use tier::{resolve_tier, resolve_unit_price};

/// Errors reported by the chain gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("No wallet provider is available")]
	WalletUnavailable,
	#[error("Wallet could not be switched to chain {expected}: {reason}")]
	NetworkMismatch { expected: u64, reason: String },
	#[error("Wallet returned no accounts")]
	NoAccounts,
	#[error("Leads contract is not available")]
	ContractUnavailable,
	#[error("No wallet session")]
	NotConnected,
	#[error("A purchase is already in progress")]
	PurchaseInProgress,
	/// Declined in the wallet or refused by the node before broadcast.
	#[error("Transaction was rejected")]
	TransactionRejected,
	#[error("Insufficient funds: {0}")]
	InsufficientFunds(String),
	#[error("Transaction reverted: {0}")]
	Reverted(String),
	/// The transaction was sent but did not confirm in time. Its outcome is
	/// unknown and shows up on a later refresh.
	#[error("Transaction {tx_hash} was not confirmed in time")]
	ConfirmationTimeout { tx_hash: String },
	/// The fresh on-chain total differs from the total the user confirmed.
	#[error("Price changed from {quoted} to {current} wei")]
	PriceChanged { quoted: U256, current: U256 },
	/// A newer connect attempt replaced this one before it finished.
	#[error("Connection attempt was superseded")]
	ConnectSuperseded,
	#[error("Invalid purchase: {0}")]
	InvalidPurchase(String),
	#[error("Provider error: {0}")]
	Provider(String),
}

impl From<WalletError> for GatewayError {
	fn from(err: WalletError) -> Self {
		match err {
			WalletError::UserRejected => GatewayError::TransactionRejected,
			WalletError::InsufficientFunds(msg) => GatewayError::InsufficientFunds(msg),
			WalletError::Reverted(msg) => GatewayError::Reverted(msg),
			other => GatewayError::Provider(other.to_string()),
		}
	}
}
