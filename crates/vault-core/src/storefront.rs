use crate::event_bus::{EventBus, StorefrontEvent};
use crate::state::{format_eth, PackageView, Status, StorefrontView, WalletView};
use crate::StorefrontError;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use vault_gateway::{ChainGateway, GatewayError};
use vault_leads::LeadsSource;
use vault_types::{
	Address, Lead, LeadPackage, LeadsMetadata, PriceSchedule, PurchaseQuote, PurchaseReceipt,
	U256,
};
use vault_wallet::ProviderEvent;

/// Tier id used for purchases and balance reads when the catalogue is empty.
const DEFAULT_TIER_ID: u64 = 2;

/// Presentation settings of a storefront.
#[derive(Debug, Clone)]
pub struct StorefrontSettings {
	pub packages: Vec<LeadPackage>,
	/// Wait before reloading leads after a wallet connects.
	pub post_connect_refresh_delay: Duration,
	/// Wait before reloading leads after a purchase confirms; the backend
	/// indexes purchase events asynchronously.
	pub post_purchase_refresh_delay: Duration,
	/// Block explorer base URL for transaction links.
	pub explorer_url: Option<String>,
	pub currency_symbol: String,
}

impl Default for StorefrontSettings {
	fn default() -> Self {
		Self {
			packages: LeadPackage::default_catalogue(),
			post_connect_refresh_delay: Duration::from_millis(1500),
			post_purchase_refresh_delay: Duration::from_millis(2000),
			explorer_url: None,
			currency_symbol: "ETH".to_string(),
		}
	}
}

/// Result of a confirmed purchase.
///
/// The receipt is always present; `refresh_error` reports a failed leads
/// reload that followed it.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
	pub receipt: PurchaseReceipt,
	pub refresh_error: Option<String>,
}

#[derive(Debug, Default)]
struct StorefrontState {
	leads: Vec<Lead>,
	metadata: Option<LeadsMetadata>,
	leads_loading: bool,
	leads_error: Option<String>,
	prices: Option<PriceSchedule>,
	status: Status,
	pending_quote: Option<PurchaseQuote>,
	last_receipt: Option<PurchaseReceipt>,
	purchased_balance: Option<U256>,
}

/// The storefront orchestrator.
pub struct Storefront {
	gateway: Arc<ChainGateway>,
	leads: Arc<dyn LeadsSource>,
	settings: StorefrontSettings,
	state: Mutex<StorefrontState>,
	events: EventBus,
}

impl Storefront {
	pub fn new(
		gateway: Arc<ChainGateway>,
		leads: Arc<dyn LeadsSource>,
		settings: StorefrontSettings,
	) -> Self {
		Self {
			gateway,
			leads,
			settings,
			state: Mutex::new(StorefrontState::default()),
			events: EventBus::new(256),
		}
	}

	fn state(&self) -> MutexGuard<'_, StorefrontState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	pub fn gateway(&self) -> &Arc<ChainGateway> {
		&self.gateway
	}

	pub fn packages(&self) -> &[LeadPackage] {
		&self.settings.packages
	}

	pub fn currency_symbol(&self) -> &str {
		&self.settings.currency_symbol
	}

	pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
		self.events.subscribe()
	}

	fn publish(&self, event: StorefrontEvent) {
		// No subscribers is fine.
		self.events.publish(event).ok();
	}

	fn set_status(&self, status: Status) {
		self.state().status = status.clone();
		self.publish(StorefrontEvent::StatusChanged { status });
	}

	fn balance_tier_id(&self) -> u64 {
		self.settings
			.packages
			.first()
			.map(|p| p.tier_id)
			.unwrap_or(DEFAULT_TIER_ID)
	}

	/// Snapshot of everything the presentation layer shows.
	pub fn view(&self) -> StorefrontView {
		let session = self.gateway.session();
		let phase = self.gateway.phase();
		let state = self.state();
		let packages = self
			.settings
			.packages
			.iter()
			.map(|p| PackageView::new(p, state.prices.as_ref(), &self.settings.currency_symbol))
			.collect();
		let last_receipt_url = match (&self.settings.explorer_url, &state.last_receipt) {
			(Some(base), Some(receipt)) => Some(format!(
				"{}/tx/{}",
				base.trim_end_matches('/'),
				receipt.transaction_id
			)),
			_ => None,
		};

		StorefrontView {
			wallet: session.map(|s| WalletView::new(s.address, s.chain_id)),
			phase,
			prices: state.prices,
			packages,
			leads: state.leads.clone(),
			leads_loading: state.leads_loading,
			leads_error: state.leads_error.clone(),
			metadata: state.metadata.clone(),
			access: state.metadata.as_ref().map(|m| m.access_summary()),
			status: state.status.clone(),
			pending_quote: state.pending_quote.clone(),
			last_receipt: state.last_receipt.clone(),
			last_receipt_url,
			purchased_balance: state.purchased_balance,
		}
	}

	/// Reloads the leads list. On success the list and metadata are replaced
	/// as a whole, even by an empty page; on failure they are left as they were.
	pub async fn refresh_leads(&self) -> Result<usize, StorefrontError> {
		self.state().leads_loading = true;
		let user = self.gateway.current_address();
		let result = self.leads.fetch(user).await;

		let mut state = self.state();
		state.leads_loading = false;
		match result {
			Ok(page) => {
				let count = page.items.len();
				state.leads = page.items;
				state.metadata = page.metadata;
				state.leads_error = None;
				drop(state);
				info!(count, connected = user.is_some(), "Leads refreshed");
				self.publish(StorefrontEvent::LeadsUpdated { count });
				Ok(count)
			},
			Err(e) => {
				state.leads_error = Some(e.to_string());
				drop(state);
				warn!(error = %e, "Failed to load leads");
				let err = StorefrontError::DataSourceUnavailable(e.to_string());
				self.set_status(Status::Error(format!("Failed to load leads: {}", e)));
				Err(err)
			},
		}
	}

	/// Re-reads the price schedule for display.
	pub async fn refresh_prices(&self) -> Result<PriceSchedule, StorefrontError> {
		let prices = self.gateway.read_prices().await?;
		self.state().prices = Some(prices);
		self.publish(StorefrontEvent::PricesUpdated { prices });
		Ok(prices)
	}

	/// Re-reads how many leads the connected wallet bought on chain.
	pub async fn refresh_balance(&self) -> Result<U256, StorefrontError> {
		let address = self
			.gateway
			.current_address()
			.ok_or(GatewayError::NotConnected)?;
		let purchased = self
			.gateway
			.purchased_leads(address, self.balance_tier_id())
			.await?;
		self.state().purchased_balance = Some(purchased);
		self.publish(StorefrontEvent::BalanceUpdated { purchased });
		Ok(purchased)
	}

	/// Connects the wallet, then loads prices, purchased balance and leads.
	///
	/// The follow-up loads can each fail on their own; the connection stands.
	pub async fn connect(&self) -> Result<Address, StorefrontError> {
		self.set_status(Status::Loading("Connecting wallet...".to_string()));
		let address = match self.gateway.connect().await {
			Ok(address) => address,
			Err(e) => {
				let err = StorefrontError::from(e);
				self.set_status(Status::Error(err.user_message()));
				return Err(err);
			},
		};
		self.publish(StorefrontEvent::WalletConnected { address });
		self.set_status(Status::Success("Wallet connected successfully!".to_string()));

		if let Err(e) = self.refresh_prices().await {
			warn!(error = %e, "Failed to load prices after connect");
			self.set_status(Status::Error(format!("Failed to load prices: {}", e)));
		}
		if let Err(e) = self.refresh_balance().await {
			warn!(error = %e, "Failed to load purchased balance after connect");
		}

		tokio::time::sleep(self.settings.post_connect_refresh_delay).await;
		// Failure already reported through the status line.
		self.refresh_leads().await.ok();

		Ok(address)
	}

	/// Drops the wallet session and everything derived from it.
	pub fn disconnect(&self) {
		self.gateway.disconnect();
		self.clear_wallet_state();
		self.publish(StorefrontEvent::WalletDisconnected);
		self.set_status(Status::Success("Wallet disconnected".to_string()));
	}

	fn clear_wallet_state(&self) {
		let mut state = self.state();
		state.prices = None;
		state.pending_quote = None;
		state.purchased_balance = None;
	}

	/// Forwards a wallet notification to the gateway and mirrors its effect.
	pub fn handle_provider_event(&self, event: ProviderEvent) {
		self.gateway.handle_provider_event(event);
		if !self.gateway.is_connected() {
			self.clear_wallet_state();
			self.publish(StorefrontEvent::WalletDisconnected);
			self.set_status(Status::Success("Wallet disconnected".to_string()));
		}
	}

	fn find_package(&self, package_id: u32) -> Result<LeadPackage, StorefrontError> {
		self.settings
			.packages
			.iter()
			.find(|p| p.id == package_id)
			.cloned()
			.ok_or(StorefrontError::UnknownPackage(package_id))
	}

	/// First step of a purchase: prices the package and holds the quote for
	/// confirmation.
	pub async fn select_package(&self, package_id: u32) -> Result<PurchaseQuote, StorefrontError> {
		let package = self.find_package(package_id)?;
		if !self.gateway.is_connected() {
			let err = StorefrontError::Gateway(GatewayError::NotConnected);
			self.set_status(Status::Error(err.user_message()));
			return Err(err);
		}

		let mut quote = self.gateway.quote(package.lead_count, package.tier_id).await?;
		quote.package_id = Some(package.id);
		self.state().pending_quote = Some(quote.clone());
		self.publish(StorefrontEvent::QuoteReady {
			quote: quote.clone(),
		});
		Ok(quote)
	}

	/// Buys the package held by [`Storefront::select_package`].
	pub async fn confirm_purchase(&self) -> Result<PurchaseOutcome, StorefrontError> {
		let quote = self
			.state()
			.pending_quote
			.take()
			.ok_or(StorefrontError::NoSelection)?;
		let package_id = quote.package_id.ok_or(StorefrontError::NoSelection)?;
		let package = self.find_package(package_id)?;
		self.buy(package, Some(&quote)).await
	}

	/// Discards the held quote. Returns whether there was one.
	pub fn cancel_purchase(&self) -> bool {
		let cancelled = self.state().pending_quote.take().is_some();
		if cancelled {
			self.publish(StorefrontEvent::PurchaseCancelled);
		}
		cancelled
	}

	/// Buys a package from the catalogue.
	///
	/// On failure nothing but the status line changes. On success the leads
	/// list is reloaded after the configured delay; a failed reload is reported
	/// in the outcome and the status line while the receipt is still returned.
	pub async fn purchase(&self, package_id: u32) -> Result<PurchaseOutcome, StorefrontError> {
		let package = self.find_package(package_id)?;
		self.buy(package, None).await
	}

	/// Sends the purchase. With a confirmed quote, a total that moved since
	/// the quote aborts before anything is sent.
	async fn buy(
		&self,
		package: LeadPackage,
		quote: Option<&PurchaseQuote>,
	) -> Result<PurchaseOutcome, StorefrontError> {
		let package_id = package.id;
		if !self.gateway.is_connected() {
			let err = StorefrontError::Gateway(GatewayError::NotConnected);
			self.set_status(Status::Error(err.user_message()));
			return Err(err);
		}

		self.set_status(Status::Loading(format!(
			"Processing purchase of {} leads...",
			package.lead_count
		)));
		let submitted = match quote {
			Some(quote) => self.gateway.submit_quoted_purchase(quote).await,
			None => {
				self.gateway
					.submit_purchase(package.lead_count, package.tier_id)
					.await
			},
		};
		let receipt = match submitted {
			Ok(receipt) => receipt,
			Err(e) => {
				let err = StorefrontError::from(e);
				let message = err.user_message();
				warn!(package_id, error = %err, "Purchase failed");
				self.publish(StorefrontEvent::PurchaseFailed {
					message: message.clone(),
				});
				self.set_status(Status::Error(message));
				return Err(err);
			},
		};

		info!(
			package_id,
			tx_hash = %receipt.transaction_id,
			paid = %format_eth(receipt.total_paid, &self.settings.currency_symbol),
			"Purchase confirmed"
		);
		self.state().last_receipt = Some(receipt.clone());
		self.publish(StorefrontEvent::PurchaseConfirmed {
			receipt: receipt.clone(),
		});
		self.set_status(Status::Success(format!(
			"Vault access completed! You now have access to {} additional fresh leads.",
			receipt.lead_count
		)));

		tokio::time::sleep(self.settings.post_purchase_refresh_delay).await;
		let refresh_error = match self.refresh_leads().await {
			Ok(_) => None,
			Err(e) => {
				let message = format!(
					"Purchase confirmed ({}) but leads could not be refreshed: {}",
					receipt.transaction_id, e
				);
				self.set_status(Status::Error(message.clone()));
				Some(message)
			},
		};
		if let Err(e) = self.refresh_balance().await {
			warn!(error = %e, "Failed to refresh purchased balance");
		}

		Ok(PurchaseOutcome {
			receipt,
			refresh_error,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::collections::VecDeque;
	use vault_gateway::testing::{eth, ScriptedWallet, SendOutcome};
	use vault_gateway::{GatewayPhase, GatewaySettings};
	use vault_leads::LeadsError;
	use vault_types::{
		AccessSummary, ChainParams, ConfigSchema, LeadsPage, NativeCurrency, Schema,
		ValidationError,
	};
	use vault_wallet::WalletProvider;

	const BASE: u64 = 8453;

	/// Leads source answering from a queue; an empty queue yields an empty page.
	#[derive(Default)]
	struct QueuedLeads {
		pages: Mutex<VecDeque<Result<LeadsPage, String>>>,
		users: Mutex<Vec<Option<Address>>>,
	}

	impl QueuedLeads {
		fn push(&self, page: Result<LeadsPage, String>) {
			self.pages.lock().unwrap().push_back(page);
		}

		fn users(&self) -> Vec<Option<Address>> {
			self.users.lock().unwrap().clone()
		}
	}

	struct AnySchema;

	impl ConfigSchema for AnySchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	#[async_trait]
	impl LeadsSource for QueuedLeads {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(AnySchema)
		}

		async fn fetch(&self, user: Option<Address>) -> Result<LeadsPage, LeadsError> {
			self.users.lock().unwrap().push(user);
			match self.pages.lock().unwrap().pop_front() {
				Some(Ok(page)) => Ok(page),
				Some(Err(message)) => Err(LeadsError::Unavailable(message)),
				None => Ok(LeadsPage::default()),
			}
		}
	}

	fn page(names: &[&str], metadata: Option<LeadsMetadata>) -> LeadsPage {
		LeadsPage {
			items: names
				.iter()
				.map(|name| Lead {
					name: name.to_string(),
					handle: name.to_lowercase(),
					bio: String::new(),
					avatar: None,
					tags: vec![],
				})
				.collect(),
			metadata,
		}
	}

	struct Harness {
		wallet: Arc<ScriptedWallet>,
		leads: Arc<QueuedLeads>,
		storefront: Storefront,
	}

	fn harness() -> Harness {
		let wallet = Arc::new(ScriptedWallet::new(BASE));
		wallet.script().prices = PriceSchedule {
			base: eth("0.0005"),
			medium: eth("0.0004"),
			high: eth("0.0003"),
			low: eth("0.0002"),
		};
		let gateway = Arc::new(ChainGateway::new(
			Some(wallet.clone() as Arc<dyn WalletProvider>),
			GatewaySettings {
				contract_address: Address::repeat_byte(0xcc),
				chain: ChainParams {
					chain_id: BASE,
					chain_name: "Base".to_string(),
					native_currency: NativeCurrency::default(),
					rpc_urls: vec!["https://mainnet.base.org".to_string()],
					block_explorer_urls: vec![],
				},
				confirmations: 1,
				confirmation_timeout: Duration::from_secs(30),
			},
		));
		let leads = Arc::new(QueuedLeads::default());
		let storefront = Storefront::new(
			gateway,
			leads.clone(),
			StorefrontSettings {
				post_connect_refresh_delay: Duration::ZERO,
				post_purchase_refresh_delay: Duration::ZERO,
				explorer_url: Some("https://basescan.org".to_string()),
				..StorefrontSettings::default()
			},
		);
		Harness {
			wallet,
			leads,
			storefront,
		}
	}

	#[tokio::test]
	async fn test_refresh_replaces_wholesale() {
		let h = harness();
		let metadata = LeadsMetadata {
			is_limited: true,
			free_count: 2,
			max_available: 40,
			..Default::default()
		};
		h.leads.push(Ok(page(&["Ada", "Grace"], Some(metadata))));
		h.leads.push(Ok(page(&[], None)));

		assert_eq!(h.storefront.refresh_leads().await.unwrap(), 2);
		let view = h.storefront.view();
		assert_eq!(view.leads.len(), 2);
		assert_eq!(
			view.access,
			Some(AccessSummary::Limited {
				free: 2,
				purchased: 0,
				total: 40
			})
		);

		assert_eq!(h.storefront.refresh_leads().await.unwrap(), 0);
		let view = h.storefront.view();
		assert!(view.leads.is_empty());
		assert!(view.metadata.is_none());
		assert_eq!(h.leads.users(), vec![None, None]);
	}

	#[tokio::test]
	async fn test_refresh_failure_keeps_previous_list() {
		let h = harness();
		h.leads.push(Ok(page(&["Ada"], None)));
		h.leads.push(Err("connection refused".to_string()));

		h.storefront.refresh_leads().await.unwrap();
		let err = h.storefront.refresh_leads().await.unwrap_err();

		assert!(matches!(err, StorefrontError::DataSourceUnavailable(_)));
		let view = h.storefront.view();
		assert_eq!(view.leads.len(), 1);
		assert!(!view.leads_loading);
		assert!(matches!(view.status, Status::Error(_)));
	}

	#[tokio::test]
	async fn test_connect_loads_prices_then_leads() {
		let h = harness();
		let mut events = h.storefront.subscribe();
		h.leads.push(Ok(page(&["Ada"], None)));

		let address = h.storefront.connect().await.unwrap();

		assert_eq!(h.leads.users(), vec![Some(address)]);
		let view = h.storefront.view();
		assert_eq!(view.wallet.unwrap().address, address);
		assert_eq!(view.prices.unwrap().base, eth("0.0005"));
		assert_eq!(view.packages[0].display_total.as_deref(), Some("0.005 ETH"));
		assert_eq!(view.purchased_balance, Some(U256::ZERO));
		assert_eq!(
			view.status,
			Status::Success("Wallet connected successfully!".to_string())
		);

		let mut saw_connected = false;
		while let Ok(event) = events.try_recv() {
			if matches!(event, StorefrontEvent::WalletConnected { address: a } if a == address) {
				saw_connected = true;
			}
		}
		assert!(saw_connected);
	}

	#[tokio::test]
	async fn test_connect_survives_failed_leads_refresh() {
		let h = harness();
		h.leads.push(Err("timeout".to_string()));

		assert!(h.storefront.connect().await.is_ok());
		assert!(h.storefront.gateway().is_connected());
		assert!(matches!(h.storefront.view().status, Status::Error(_)));
	}

	#[tokio::test]
	async fn test_purchase_requires_session() {
		let h = harness();

		let err = h.storefront.purchase(1).await.unwrap_err();

		assert!(matches!(
			err,
			StorefrontError::Gateway(GatewayError::NotConnected)
		));
		assert_eq!(
			h.storefront.view().status,
			Status::Error("Please connect your wallet first to purchase leads".to_string())
		);
		assert!(h.wallet.script().sent.is_empty());
		assert!(h.leads.users().is_empty());
	}

	#[tokio::test]
	async fn test_purchase_returns_receipt_when_refresh_fails() {
		let h = harness();
		h.leads.push(Ok(page(&["Ada", "Grace"], None)));
		h.storefront.connect().await.unwrap();
		h.leads.push(Err("backend down".to_string()));

		let outcome = h.storefront.purchase(1).await.unwrap();

		assert_eq!(outcome.receipt.lead_count, 10);
		assert_eq!(outcome.receipt.total_paid, eth("0.005"));
		assert!(outcome.refresh_error.is_some());
		let view = h.storefront.view();
		assert_eq!(view.leads.len(), 2);
		assert_eq!(view.last_receipt, Some(outcome.receipt.clone()));
		assert_eq!(
			view.last_receipt_url,
			Some(format!("https://basescan.org/tx/{}", outcome.receipt.transaction_id))
		);
		assert_eq!(view.phase, GatewayPhase::Connected);
	}

	#[tokio::test]
	async fn test_failed_purchase_leaves_list_untouched() {
		let h = harness();
		h.leads.push(Ok(page(&["Ada"], None)));
		h.storefront.connect().await.unwrap();
		h.wallet.script().send = SendOutcome::Reject;

		let err = h.storefront.purchase(2).await.unwrap_err();

		assert!(matches!(
			err,
			StorefrontError::Gateway(GatewayError::TransactionRejected)
		));
		assert_eq!(h.leads.users().len(), 1);
		let view = h.storefront.view();
		assert_eq!(view.leads.len(), 1);
		assert!(view.last_receipt.is_none());
	}

	#[tokio::test]
	async fn test_select_confirm_and_cancel() {
		let h = harness();
		h.storefront.connect().await.unwrap();

		assert!(matches!(
			h.storefront.confirm_purchase().await,
			Err(StorefrontError::NoSelection)
		));
		assert!(matches!(
			h.storefront.select_package(9).await,
			Err(StorefrontError::UnknownPackage(9))
		));

		let quote = h.storefront.select_package(3).await.unwrap();
		assert_eq!(quote.package_id, Some(3));
		assert_eq!(quote.total, eth("0.02"));
		assert!(h.storefront.cancel_purchase());
		assert!(!h.storefront.cancel_purchase());
		assert!(h.wallet.script().sent.is_empty());

		h.storefront.select_package(2).await.unwrap();
		let outcome = h.storefront.confirm_purchase().await.unwrap();
		assert_eq!(outcome.receipt.lead_count, 25);
		assert_eq!(outcome.receipt.total_paid, eth("0.0125"));
		assert!(h.storefront.view().pending_quote.is_none());
	}

	#[tokio::test]
	async fn test_confirm_aborts_when_price_moved() {
		let h = harness();
		h.storefront.connect().await.unwrap();
		let quote = h.storefront.select_package(2).await.unwrap();
		assert_eq!(quote.total, eth("0.0125"));

		h.wallet.script().prices.base = eth("0.0006");
		let err = h.storefront.confirm_purchase().await.unwrap_err();

		match err {
			StorefrontError::Gateway(GatewayError::PriceChanged { quoted, current }) => {
				assert_eq!(quoted, eth("0.0125"));
				assert_eq!(current, eth("0.015"));
			},
			other => panic!("unexpected error: {other}"),
		}
		assert!(h.wallet.script().sent.is_empty());
		let view = h.storefront.view();
		assert_eq!(view.phase, GatewayPhase::Connected);
		assert!(view.pending_quote.is_none());
		assert!(view.last_receipt.is_none());
		assert!(matches!(view.status, Status::Error(_)));
	}

	#[tokio::test]
	async fn test_leads_error_tracks_last_reload() {
		let h = harness();
		h.leads.push(Err("timeout".to_string()));
		h.storefront.connect().await.unwrap();
		assert_eq!(
			h.storefront.view().leads_error.as_deref(),
			Some("Leads source unavailable: timeout")
		);

		h.leads.push(Ok(page(&["Ada"], None)));
		h.storefront.refresh_leads().await.unwrap();
		let view = h.storefront.view();
		assert!(view.leads_error.is_none());
		assert_eq!(view.leads.len(), 1);
	}

	#[tokio::test]
	async fn test_price_failure_is_not_a_leads_failure() {
		let h = harness();
		h.wallet.script().fail_reads = true;
		h.leads.push(Ok(page(&["Ada"], None)));

		h.storefront.connect().await.unwrap();

		let view = h.storefront.view();
		assert!(matches!(view.status, Status::Error(_)));
		assert!(view.prices.is_none());
		assert!(view.leads_error.is_none());
		assert_eq!(view.leads.len(), 1);
	}

	#[tokio::test]
	async fn test_disconnect_clears_wallet_state() {
		let h = harness();
		h.storefront.connect().await.unwrap();
		h.storefront.select_package(1).await.unwrap();

		h.storefront.disconnect();

		let view = h.storefront.view();
		assert!(view.wallet.is_none());
		assert!(view.prices.is_none());
		assert!(view.pending_quote.is_none());
		assert_eq!(view.status, Status::Success("Wallet disconnected".to_string()));
	}

	#[tokio::test]
	async fn test_provider_disconnect_event() {
		let h = harness();
		h.storefront.connect().await.unwrap();

		h.storefront
			.handle_provider_event(ProviderEvent::AccountsChanged(vec![]));

		assert!(!h.storefront.gateway().is_connected());
		assert!(h.storefront.view().wallet.is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn test_post_purchase_refresh_waits_for_indexing() {
		let h = harness();
		let storefront = Storefront::new(
			h.storefront.gateway().clone(),
			h.leads.clone(),
			StorefrontSettings {
				post_connect_refresh_delay: Duration::ZERO,
				..StorefrontSettings::default()
			},
		);
		storefront.connect().await.unwrap();

		let started = tokio::time::Instant::now();
		storefront.purchase(1).await.unwrap();
		assert!(started.elapsed() >= Duration::from_millis(2000));
		assert_eq!(h.leads.users().len(), 2);
	}
}
