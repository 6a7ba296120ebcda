//! Purchase orchestration for the leads vault storefront.
//!
//! [`Storefront`] sequences what the user does (connect, pick a package,
//! confirm, refresh) across the chain gateway and the leads source, and keeps
//! the projection the presentation layer renders.

mod event_bus;
mod state;
mod storefront;

use thiserror::Error;
use vault_gateway::GatewayError;

pub use event_bus::{EventBus, StorefrontEvent};
pub use state::{format_eth, PackageView, Status, StorefrontView, WalletView};
pub use storefront::{PurchaseOutcome, Storefront, StorefrontSettings};

/// Errors surfaced by storefront operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
	#[error(transparent)]
	Gateway(#[from] GatewayError),
	#[error("Leads data source unavailable: {0}")]
	DataSourceUnavailable(String),
	#[error("No package selected")]
	NoSelection,
	#[error("Unknown package {0}")]
	UnknownPackage(u32),
}

impl StorefrontError {
	/// Message shown to the user for this failure.
	pub fn user_message(&self) -> String {
		match self {
			StorefrontError::Gateway(GatewayError::WalletUnavailable) => {
				"Please install a wallet to connect".to_string()
			},
			StorefrontError::Gateway(GatewayError::NotConnected) => {
				"Please connect your wallet first to purchase leads".to_string()
			},
			StorefrontError::Gateway(GatewayError::NetworkMismatch { .. }) => {
				"Please switch your wallet to the storefront network".to_string()
			},
			StorefrontError::Gateway(GatewayError::TransactionRejected) => {
				"Transaction was rejected by the wallet or the network".to_string()
			},
			StorefrontError::Gateway(GatewayError::PriceChanged { .. }) => {
				"Prices changed since your confirmation, please review the new price".to_string()
			},
			StorefrontError::Gateway(GatewayError::ConnectSuperseded) => {
				"Another connection request replaced this one".to_string()
			},
			StorefrontError::Gateway(GatewayError::InsufficientFunds(_)) => {
				"Insufficient funds to complete the purchase".to_string()
			},
			StorefrontError::Gateway(GatewayError::ConfirmationTimeout { tx_hash }) => format!(
				"Transaction {} is still pending, check back shortly",
				tx_hash
			),
			other => other.to_string(),
		}
	}
}
