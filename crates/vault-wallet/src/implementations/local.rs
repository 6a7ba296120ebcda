//! Local private-key wallet backed by alloy HTTP providers.
//!
//! Signs with a key held in process memory. Each chain the wallet knows gets
//! its own provider; switching to a chain without one reports
//! [`WalletError::UnknownChain`] exactly like a browser wallet would, and
//! adding a chain registers a provider for its first RPC URL.

use crate::{
	classify_rpc_error, TransactionCall, WalletError, WalletProvider, WalletReceipt,
};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use vault_types::{
	with_0x_prefix, ChainParams, ConfigSchema, Field, FieldType, Schema, SecretString,
	ValidationError,
};

type HttpProvider = Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>;

/// Wallet that signs locally and talks to chains over HTTP RPC.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	providers: RwLock<HashMap<u64, HttpProvider>>,
	active_chain: AtomicU64,
	poll_interval: Duration,
}

impl LocalWallet {
	/// Creates a wallet with providers for `rpc_urls`, pointed at `start_chain_id`.
	pub fn new(
		signer: PrivateKeySigner,
		rpc_urls: HashMap<u64, String>,
		start_chain_id: u64,
		poll_interval: Duration,
	) -> Result<Self, WalletError> {
		if !rpc_urls.contains_key(&start_chain_id) {
			return Err(WalletError::InvalidConfig(format!(
				"No RPC URL configured for start chain {}",
				start_chain_id
			)));
		}

		let mut providers = HashMap::new();
		for (chain_id, url) in &rpc_urls {
			providers.insert(*chain_id, build_provider(&signer, *chain_id, url)?);
		}

		Ok(Self {
			signer,
			providers: RwLock::new(providers),
			active_chain: AtomicU64::new(start_chain_id),
			poll_interval,
		})
	}

	/// Address of the signing key.
	pub fn address(&self) -> Address {
		self.signer.address()
	}

	fn provider(&self) -> Result<HttpProvider, WalletError> {
		let chain_id = self.active_chain.load(Ordering::SeqCst);
		let providers = self
			.providers
			.read()
			.map_err(|_| WalletError::Network("provider table poisoned".to_string()))?;
		providers
			.get(&chain_id)
			.cloned()
			.ok_or(WalletError::UnknownChain)
	}
}

fn build_provider(
	signer: &PrivateKeySigner,
	chain_id: u64,
	rpc_url: &str,
) -> Result<HttpProvider, WalletError> {
	let url: reqwest::Url = rpc_url.parse().map_err(|e| {
		WalletError::InvalidConfig(format!("Invalid RPC URL for chain {}: {}", chain_id, e))
	})?;

	let chain_signer = signer.clone().with_chain_id(Some(chain_id));
	let provider = ProviderBuilder::new()
		.with_recommended_fillers()
		.wallet(EthereumWallet::from(chain_signer))
		.on_http(url);

	Ok(Arc::new(provider))
}

fn map_transport_error(context: &str, err: TransportError) -> WalletError {
	match err.as_error_resp() {
		Some(payload) => classify_rpc_error(payload.code, &payload.message),
		None => WalletError::Network(format!("{}: {}", context, err)),
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().unwrap_or_default();
					let hex = key.strip_prefix("0x").unwrap_or(key);
					if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
						return Err("private_key must be 32 bytes of hex".to_string());
					}
					Ok(())
				}),
			],
			vec![
				Field::new(
					"start_chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
				Field::new(
					"poll_interval_ms",
					FieldType::Integer {
						min: Some(10),
						max: Some(60_000),
					},
				),
				Field::new("rpc_urls", FieldType::Table(Schema::new(vec![], vec![])))
					.with_validator(|value| {
						let table = value
							.as_table()
							.ok_or_else(|| "rpc_urls must be a table".to_string())?;
						for (key, url) in table {
							if key.parse::<u64>().is_err() {
								return Err(format!("Invalid chain ID in rpc_urls: {}", key));
							}
							if !url.is_str() {
								return Err(format!("RPC URL for chain {} must be a string", key));
							}
						}
						Ok(())
					}),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletProvider for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		Ok(self.active_chain.load(Ordering::SeqCst))
	}

	async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
		let known = self
			.providers
			.read()
			.map_err(|_| WalletError::Network("provider table poisoned".to_string()))?
			.contains_key(&chain_id);
		if !known {
			return Err(WalletError::UnknownChain);
		}
		self.active_chain.store(chain_id, Ordering::SeqCst);
		tracing::info!(chain_id, "Switched local wallet chain");
		Ok(())
	}

	async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError> {
		let rpc_url = params.rpc_urls.first().ok_or_else(|| {
			WalletError::InvalidConfig(format!("Chain {} has no RPC URL", params.chain_id))
		})?;
		let provider = build_provider(&self.signer, params.chain_id, rpc_url)?;
		self.providers
			.write()
			.map_err(|_| WalletError::Network("provider table poisoned".to_string()))?
			.insert(params.chain_id, provider);
		tracing::info!(chain_id = params.chain_id, chain = %params.chain_name, "Added chain to local wallet");
		Ok(())
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(vec![self.signer.address()])
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
		let provider = self.provider()?;
		provider
			.call(&TransactionRequest::default().to(to).input(data.into()))
			.await
			.map_err(|e| map_transport_error("Call failed", e))
	}

	async fn send_transaction(&self, tx: TransactionCall) -> Result<B256, WalletError> {
		if tx.from != self.signer.address() {
			return Err(WalletError::Unsupported(format!(
				"Cannot sign for {}",
				tx.from
			)));
		}

		let provider = self.provider()?;
		let request = TransactionRequest::default()
			.from(tx.from)
			.to(tx.to)
			.input(tx.data.into())
			.value(tx.value);

		let pending = provider
			.send_transaction(request)
			.await
			.map_err(|e| map_transport_error("Failed to send transaction", e))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(
			tx_hash = %with_0x_prefix(&hex::encode(tx_hash.0)),
			chain_id = self.active_chain.load(Ordering::SeqCst),
			"Submitted transaction"
		);
		Ok(tx_hash)
	}

	async fn wait_for_receipt(
		&self,
		tx_hash: B256,
		confirmations: u64,
	) -> Result<WalletReceipt, WalletError> {
		let provider = self.provider()?;

		loop {
			let receipt = match provider.get_transaction_receipt(tx_hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					tokio::time::sleep(self.poll_interval).await;
					continue;
				},
				Err(e) => return Err(map_transport_error("Failed to get receipt", e)),
			};

			let current_block = provider
				.get_block_number()
				.await
				.map_err(|e| map_transport_error("Failed to get block number", e))?;

			let tx_block = receipt.block_number.unwrap_or(current_block);
			// The inclusion block counts as the first confirmation.
			let current_confirmations = current_block.saturating_sub(tx_block) + 1;
			if current_confirmations >= confirmations {
				return Ok(WalletReceipt {
					tx_hash,
					block_number: tx_block,
					success: receipt.status(),
				});
			}

			tracing::debug!(
				"Waiting for {} more confirmations...",
				confirmations.saturating_sub(current_confirmations)
			);
			tokio::time::sleep(self.poll_interval).await;
		}
	}

	async fn get_balance(&self, address: Address) -> Result<U256, WalletError> {
		let provider = self.provider()?;
		provider
			.get_balance(address)
			.await
			.map_err(|e| map_transport_error("Failed to get balance", e))
	}
}

/// Factory function to create a local wallet from configuration.
///
/// Configuration keys:
/// - `private_key` (required): hex signing key
/// - `rpc_urls` (optional): map of chain id to RPC URL
/// - `start_chain_id` (optional): chain selected at startup; defaults to the
///   storefront chain, whose RPC URL is then registered automatically
/// - `poll_interval_ms` (optional): receipt polling interval, default 2000
pub fn create_local_wallet(
	config: &toml::Value,
	chain: &ChainParams,
) -> Result<Box<dyn WalletProvider>, WalletError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| WalletError::InvalidConfig(e.to_string()))?;

	let private_key = SecretString::from_config(config, "private_key")
		.ok_or_else(|| WalletError::InvalidConfig("private_key is required".to_string()))?;
	let signer: PrivateKeySigner = private_key.with_exposed(|key| {
		key.parse()
			.map_err(|_| WalletError::InvalidConfig("Invalid private key format".to_string()))
	})?;

	let mut rpc_urls: HashMap<u64, String> = HashMap::new();
	if let Some(table) = config.get("rpc_urls").and_then(|v| v.as_table()) {
		for (key, url) in table {
			if let (Ok(chain_id), Some(url)) = (key.parse::<u64>(), url.as_str()) {
				rpc_urls.insert(chain_id, url.to_string());
			}
		}
	}

	let start_chain_id = match config.get("start_chain_id").and_then(|v| v.as_integer()) {
		Some(id) => id as u64,
		None => {
			if let Some(url) = chain.rpc_urls.first() {
				rpc_urls.entry(chain.chain_id).or_insert_with(|| url.clone());
			}
			chain.chain_id
		},
	};

	let poll_interval = Duration::from_millis(
		config
			.get("poll_interval_ms")
			.and_then(|v| v.as_integer())
			.unwrap_or(2000) as u64,
	);

	Ok(Box::new(LocalWallet::new(
		signer,
		rpc_urls,
		start_chain_id,
		poll_interval,
	)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl vault_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_local_wallet
	}
}

impl crate::WalletRegistry for Registry {}
