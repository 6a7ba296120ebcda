use crate::contract::LeadsContract;
use crate::tier::{resolve_tier, resolve_unit_price};
use crate::GatewayError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, instrument, warn};
use vault_types::{
	truncate_id, with_0x_prefix, ChainParams, PriceSchedule, PurchaseQuote, PurchaseReceipt,
	PurchaseRequest, WalletSession,
};
use vault_wallet::{ProviderEvent, TransactionCall, WalletError, WalletProvider};

/// Where the gateway is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPhase {
	Disconnected,
	Connecting,
	Connected,
	/// A purchase is being priced and sent.
	Submitting,
	/// A purchase was sent and is waiting for confirmation.
	Confirming,
}

impl GatewayPhase {
	fn is_purchasing(self) -> bool {
		matches!(self, GatewayPhase::Submitting | GatewayPhase::Confirming)
	}
}

/// Static settings of a gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
	pub contract_address: Address,
	/// The chain purchases must happen on.
	pub chain: ChainParams,
	pub confirmations: u64,
	pub confirmation_timeout: Duration,
}

#[derive(Debug)]
struct GatewayState {
	phase: GatewayPhase,
	session: Option<WalletSession>,
	contract: Option<LeadsContract>,
	prices: Option<PriceSchedule>,
	/// Bumped by every connect so only the latest attempt commits.
	connect_epoch: u64,
}

/// On-chain side of the storefront. One per storefront, shared by reference.
pub struct ChainGateway {
	wallet: Option<Arc<dyn WalletProvider>>,
	settings: GatewaySettings,
	state: Mutex<GatewayState>,
}

impl ChainGateway {
	/// Creates a gateway. Without a wallet every chain operation reports
	/// [`GatewayError::WalletUnavailable`].
	pub fn new(wallet: Option<Arc<dyn WalletProvider>>, settings: GatewaySettings) -> Self {
		Self {
			wallet,
			settings,
			state: Mutex::new(GatewayState {
				phase: GatewayPhase::Disconnected,
				session: None,
				contract: None,
				prices: None,
				connect_epoch: 0,
			}),
		}
	}

	fn state(&self) -> MutexGuard<'_, GatewayState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn wallet(&self) -> Result<Arc<dyn WalletProvider>, GatewayError> {
		self.wallet.clone().ok_or(GatewayError::WalletUnavailable)
	}

	pub fn settings(&self) -> &GatewaySettings {
		&self.settings
	}

	pub fn phase(&self) -> GatewayPhase {
		self.state().phase
	}

	pub fn is_connected(&self) -> bool {
		self.state().session.as_ref().is_some_and(|s| s.connected)
	}

	pub fn current_address(&self) -> Option<Address> {
		self.state().session.as_ref().map(|s| s.address)
	}

	pub fn session(&self) -> Option<WalletSession> {
		self.state().session.clone()
	}

	/// Last schedule read from the contract, if any.
	pub fn last_prices(&self) -> Option<PriceSchedule> {
		self.state().prices
	}

	/// Makes sure the wallet is on `expected_chain_id`, switching and, when
	/// the wallet does not know the chain, adding it first.
	#[instrument(skip_all, fields(expected = expected_chain_id))]
	pub async fn ensure_network(&self, expected_chain_id: u64) -> Result<(), GatewayError> {
		let wallet = self.wallet()?;
		let current = wallet.chain_id().await?;
		if current == expected_chain_id {
			return Ok(());
		}

		let mismatch = |reason: String| GatewayError::NetworkMismatch {
			expected: expected_chain_id,
			reason,
		};

		info!(current, "Requesting network switch");
		match wallet.switch_chain(expected_chain_id).await {
			Ok(()) => {},
			Err(WalletError::UnknownChain) if expected_chain_id == self.settings.chain.chain_id => {
				info!(chain = %self.settings.chain.chain_name, "Wallet does not know the chain, requesting add");
				wallet
					.add_chain(&self.settings.chain)
					.await
					.map_err(|e| mismatch(e.to_string()))?;
				wallet
					.switch_chain(expected_chain_id)
					.await
					.map_err(|e| mismatch(e.to_string()))?;
			},
			Err(e) => return Err(mismatch(e.to_string())),
		}

		let now = wallet.chain_id().await?;
		if now != expected_chain_id {
			return Err(mismatch(format!("wallet reports chain {} after switching", now)));
		}
		Ok(())
	}

	/// Connects the wallet: network first, then accounts. On success the
	/// contract is bound and the primary account address returned.
	#[instrument(skip_all)]
	pub async fn connect(&self) -> Result<Address, GatewayError> {
		let wallet = self.wallet()?;
		let attempt = self.begin_connect()?;

		let session = match self.establish_session(wallet.as_ref()).await {
			Ok(session) => session,
			Err(e) => {
				warn!(error = %e, "Wallet connection failed");
				return Err(e);
			},
		};

		let address = session.address;
		if !attempt.commit(session, LeadsContract::new(self.settings.contract_address)) {
			warn!(address = %address, "Wallet connection superseded by a newer attempt");
			return Err(GatewayError::ConnectSuperseded);
		}
		info!(address = %address, "Wallet connected");
		Ok(address)
	}

	fn begin_connect(&self) -> Result<ConnectAttempt<'_>, GatewayError> {
		let mut state = self.state();
		if state.phase.is_purchasing() {
			return Err(GatewayError::PurchaseInProgress);
		}
		state.connect_epoch += 1;
		state.phase = GatewayPhase::Connecting;
		state.session = None;
		state.contract = None;
		Ok(ConnectAttempt {
			gateway: self,
			epoch: state.connect_epoch,
			committed: false,
		})
	}

	async fn establish_session(
		&self,
		wallet: &dyn WalletProvider,
	) -> Result<WalletSession, GatewayError> {
		let expected = self.settings.chain.chain_id;
		self.ensure_network(expected).await?;

		let accounts = wallet.request_accounts().await?;
		let address = accounts.first().copied().ok_or(GatewayError::NoAccounts)?;
		Ok(WalletSession::new(address, expected))
	}

	/// Tears down the session and the contract binding.
	pub fn disconnect(&self) {
		let mut state = self.state();
		state.session = None;
		state.contract = None;
		if !state.phase.is_purchasing() {
			state.phase = GatewayPhase::Disconnected;
		}
		info!("Wallet disconnected");
	}

	/// Applies a notification pushed by the wallet.
	pub fn handle_provider_event(&self, event: ProviderEvent) {
		match event {
			ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
				None => self.disconnect(),
				Some(address) => {
					if let Some(session) = self.state().session.as_mut() {
						session.address = *address;
					}
					info!(address = %address, "Wallet account changed");
				},
			},
			ProviderEvent::ChainChanged(chain_id) => {
				if let Some(session) = self.state().session.as_mut() {
					session.chain_id = chain_id;
				}
				if chain_id != self.settings.chain.chain_id {
					warn!(chain_id, expected = self.settings.chain.chain_id, "Wallet moved to another chain");
				}
			},
			ProviderEvent::Disconnected => self.disconnect(),
		}
	}

	fn bound(&self) -> Result<(Arc<dyn WalletProvider>, LeadsContract), GatewayError> {
		let wallet = self.wallet()?;
		let contract = self.state().contract.ok_or(GatewayError::ContractUnavailable)?;
		Ok((wallet, contract))
	}

	/// Reads the current price schedule from the contract.
	pub async fn read_prices(&self) -> Result<PriceSchedule, GatewayError> {
		let (wallet, contract) = self.bound()?;
		self.fetch_prices(wallet.as_ref(), &contract).await
	}

	async fn fetch_prices(
		&self,
		wallet: &dyn WalletProvider,
		contract: &LeadsContract,
	) -> Result<PriceSchedule, GatewayError> {
		let schedule = contract.read_prices(wallet).await?;
		self.state().prices = Some(schedule);
		Ok(schedule)
	}

	/// Prices a purchase against a fresh schedule without sending anything.
	pub async fn quote(&self, lead_count: u64, tier_id: u64) -> Result<PurchaseQuote, GatewayError> {
		let schedule = self.read_prices().await?;
		let request = price_request(&schedule, lead_count, tier_id)?;
		let total = checked_total(&request)?;
		Ok(PurchaseQuote {
			package_id: None,
			lead_count,
			tier_id,
			tier: resolve_tier(lead_count, tier_id),
			unit_price: request.unit_price,
			total,
		})
	}

	/// On-chain count of leads `user` bought under `tier_id`.
	pub async fn purchased_leads(&self, user: Address, tier_id: u64) -> Result<U256, GatewayError> {
		let (wallet, contract) = self.bound()?;
		contract.purchased_leads(wallet.as_ref(), tier_id, user).await
	}

	/// Native currency balance of the session account.
	pub async fn native_balance(&self) -> Result<U256, GatewayError> {
		let wallet = self.wallet()?;
		let address = self.current_address().ok_or(GatewayError::NotConnected)?;
		Ok(wallet.get_balance(address).await?)
	}

	/// Buys `lead_count` leads under `tier_id` and waits for confirmation.
	///
	/// The schedule is re-read first so the attached value matches what the
	/// contract will check. Only one purchase runs at a time; a second call
	/// fails with [`GatewayError::PurchaseInProgress`] and leaves the first
	/// untouched.
	#[instrument(skip_all, fields(lead_count, tier_id))]
	pub async fn submit_purchase(
		&self,
		lead_count: u64,
		tier_id: u64,
	) -> Result<PurchaseReceipt, GatewayError> {
		self.purchase(lead_count, tier_id, None).await
	}

	/// Like [`ChainGateway::submit_purchase`], but aborts with
	/// [`GatewayError::PriceChanged`] before sending when the fresh total no
	/// longer matches the confirmed quote.
	pub async fn submit_quoted_purchase(
		&self,
		quote: &PurchaseQuote,
	) -> Result<PurchaseReceipt, GatewayError> {
		self.purchase(quote.lead_count, quote.tier_id, Some(quote.total))
			.await
	}

	async fn purchase(
		&self,
		lead_count: u64,
		tier_id: u64,
		expected_total: Option<U256>,
	) -> Result<PurchaseReceipt, GatewayError> {
		if lead_count == 0 {
			return Err(GatewayError::InvalidPurchase(
				"lead count must be positive".to_string(),
			));
		}
		let wallet = self.wallet()?;
		let (slot, session, contract) = self.begin_purchase()?;

		if session.chain_id != self.settings.chain.chain_id {
			return Err(GatewayError::NetworkMismatch {
				expected: self.settings.chain.chain_id,
				reason: format!("session is on chain {}", session.chain_id),
			});
		}

		let schedule = self.fetch_prices(wallet.as_ref(), &contract).await?;
		let request = price_request(&schedule, lead_count, tier_id)?;
		let total = checked_total(&request)?;
		if let Some(quoted) = expected_total.filter(|quoted| *quoted != total) {
			warn!(quoted = %quoted, current = %total, "Price changed since the quote");
			return Err(GatewayError::PriceChanged {
				quoted,
				current: total,
			});
		}

		let tx_hash = wallet
			.send_transaction(TransactionCall {
				from: session.address,
				to: contract.address(),
				data: contract.buy_lead_calldata(request.lead_count, request.tier_id),
				value: total,
			})
			.await
			.map_err(|e| match e {
				WalletError::Rejected(reason) => {
					warn!(%reason, "Purchase transaction refused");
					GatewayError::TransactionRejected
				},
				other => GatewayError::from(other),
			})?;
		let transaction_id = with_0x_prefix(&hex::encode(tx_hash));
		info!(tx_hash = %truncate_id(&transaction_id), value = %total, "Purchase submitted");

		slot.set_phase(GatewayPhase::Confirming);
		let waited = tokio::time::timeout(
			self.settings.confirmation_timeout,
			wallet.wait_for_receipt(tx_hash, self.settings.confirmations),
		)
		.await;
		let receipt = match waited {
			Ok(result) => result?,
			Err(_) => {
				warn!(
					tx_hash = %truncate_id(&transaction_id),
					"Purchase not confirmed after {} seconds",
					self.settings.confirmation_timeout.as_secs()
				);
				return Err(GatewayError::ConfirmationTimeout {
					tx_hash: transaction_id,
				});
			},
		};

		if !receipt.success {
			return Err(GatewayError::Reverted(format!(
				"transaction {} reverted in block {}",
				transaction_id, receipt.block_number
			)));
		}

		info!(tx_hash = %truncate_id(&transaction_id), block = receipt.block_number, "Purchase confirmed");
		Ok(PurchaseReceipt {
			transaction_id,
			lead_count: request.lead_count,
			total_paid: total,
			block_number: receipt.block_number,
		})
	}

	fn begin_purchase(
		&self,
	) -> Result<(PurchaseSlot<'_>, WalletSession, LeadsContract), GatewayError> {
		let mut state = self.state();
		let session = state.session.clone().ok_or(GatewayError::NotConnected)?;
		let contract = state.contract.ok_or(GatewayError::ContractUnavailable)?;
		if state.phase.is_purchasing() {
			return Err(GatewayError::PurchaseInProgress);
		}
		state.phase = GatewayPhase::Submitting;
		Ok((PurchaseSlot { gateway: self }, session, contract))
	}
}

fn price_request(
	schedule: &PriceSchedule,
	lead_count: u64,
	tier_id: u64,
) -> Result<PurchaseRequest, GatewayError> {
	if lead_count == 0 {
		return Err(GatewayError::InvalidPurchase(
			"lead count must be positive".to_string(),
		));
	}
	Ok(PurchaseRequest {
		lead_count,
		tier_id,
		unit_price: resolve_unit_price(schedule, lead_count, tier_id),
	})
}

fn checked_total(request: &PurchaseRequest) -> Result<U256, GatewayError> {
	request
		.total_value()
		.ok_or_else(|| GatewayError::InvalidPurchase("total price overflows".to_string()))
}

/// Holds the purchase phase. Dropping it, including when the purchase future
/// is cancelled, hands the gateway back to `Connected` (or `Disconnected` if
/// the session went away meanwhile).
struct PurchaseSlot<'a> {
	gateway: &'a ChainGateway,
}

impl PurchaseSlot<'_> {
	fn set_phase(&self, phase: GatewayPhase) {
		self.gateway.state().phase = phase;
	}
}

impl Drop for PurchaseSlot<'_> {
	fn drop(&mut self) {
		let mut state = self.gateway.state();
		state.phase = if state.session.is_some() {
			GatewayPhase::Connected
		} else {
			GatewayPhase::Disconnected
		};
	}
}

/// An in-flight connect. Unless committed, dropping it returns the gateway
/// to `Disconnected`, provided no newer connect has started.
struct ConnectAttempt<'a> {
	gateway: &'a ChainGateway,
	epoch: u64,
	committed: bool,
}

impl ConnectAttempt<'_> {
	/// Installs the session if no newer attempt started. Returns whether it did.
	fn commit(mut self, session: WalletSession, contract: LeadsContract) -> bool {
		self.committed = true;
		let mut state = self.gateway.state();
		if state.connect_epoch != self.epoch {
			return false;
		}
		state.session = Some(session);
		state.contract = Some(contract);
		state.phase = GatewayPhase::Connected;
		true
	}
}

impl Drop for ConnectAttempt<'_> {
	fn drop(&mut self) {
		if self.committed {
			return;
		}
		let mut state = self.gateway.state();
		if state.connect_epoch == self.epoch && state.phase == GatewayPhase::Connecting {
			state.phase = GatewayPhase::Disconnected;
		}
	}
}
