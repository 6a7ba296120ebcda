//! Broadcast channel for storefront state changes.

use crate::state::Status;
use serde::Serialize;
use tokio::sync::broadcast;
use vault_types::{Address, PriceSchedule, PurchaseQuote, PurchaseReceipt, U256};

/// A change the presentation layer may want to react to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorefrontEvent {
	StatusChanged { status: Status },
	WalletConnected { address: Address },
	WalletDisconnected,
	PricesUpdated { prices: PriceSchedule },
	LeadsUpdated { count: usize },
	QuoteReady { quote: PurchaseQuote },
	PurchaseCancelled,
	PurchaseConfirmed { receipt: PurchaseReceipt },
	PurchaseFailed { message: String },
	BalanceUpdated {
		#[serde(with = "vault_types::u256_serde")]
		purchased: U256,
	},
}

/// Fan-out of [`StorefrontEvent`]s to any number of subscribers.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: StorefrontEvent,
	) -> Result<usize, broadcast::error::SendError<StorefrontEvent>> {
		self.sender.send(event)
	}
}
