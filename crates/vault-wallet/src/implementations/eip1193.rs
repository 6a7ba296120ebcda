//! EIP-1193 wallet reached through a JSON-RPC bridge.
//!
//! Browser and mobile wallets expose the EIP-1193 `request` interface. A
//! bridge process forwards JSON-RPC envelopes posted to its endpoint into that
//! interface and relays the wallet's answer, including its provider error
//! codes, which are mapped by [`classify_rpc_error`].

use crate::{
	classify_rpc_error, TransactionCall, WalletError, WalletProvider, WalletReceipt,
};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use vault_types::{
	with_0x_prefix, ChainParams, ConfigSchema, Field, FieldType, Schema, ValidationError,
};

/// Wallet provider speaking EIP-1193 over HTTP JSON-RPC.
pub struct Eip1193Wallet {
	client: reqwest::Client,
	endpoint: String,
	next_id: AtomicU64,
	poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
	block_number: Option<U64>,
	status: Option<U64>,
}

impl Eip1193Wallet {
	pub fn new(
		endpoint: String,
		request_timeout: Duration,
		poll_interval: Duration,
	) -> Result<Self, WalletError> {
		let client = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|e| {
				WalletError::InvalidConfig(format!("Failed to build HTTP client: {}", e))
			})?;

		Ok(Self {
			client,
			endpoint,
			next_id: AtomicU64::new(1),
			poll_interval,
		})
	}

	async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
		let payload = json!({
			"jsonrpc": "2.0",
			"id": self.next_id.fetch_add(1, Ordering::Relaxed),
			"method": method,
			"params": params,
		});

		let response = self
			.client
			.post(&self.endpoint)
			.json(&payload)
			.send()
			.await
			.map_err(|e| WalletError::Network(format!("{} request failed: {}", method, e)))?;
		let status = response.status();
		let body: Value = response
			.json()
			.await
			.map_err(|e| WalletError::Network(format!("{} response decode failed: {}", method, e)))?;

		if let Some(err) = body.get("error") {
			let err: RpcErrorObject = serde_json::from_value(err.clone()).map_err(|_| {
				WalletError::Network(format!("{} returned malformed error: {}", method, err))
			})?;
			return Err(classify_rpc_error(err.code, &err.message));
		}
		if !status.is_success() {
			return Err(WalletError::Network(format!(
				"{} bridge status {}",
				method, status
			)));
		}

		body.get("result")
			.cloned()
			.ok_or_else(|| WalletError::Network(format!("{} response missing result", method)))
	}

	async fn request_as<T: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
	) -> Result<T, WalletError> {
		let result = self.request(method, params).await?;
		serde_json::from_value(result)
			.map_err(|e| WalletError::Network(format!("{} returned unexpected result: {}", method, e)))
	}
}

fn parse_chain_id(value: &Value) -> Result<u64, WalletError> {
	if let Some(n) = value.as_u64() {
		return Ok(n);
	}
	let raw = value
		.as_str()
		.ok_or_else(|| WalletError::Network("chain id must be string or number".to_string()))?;
	match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16),
		None => raw.parse(),
	}
	.map_err(|e| WalletError::Network(format!("invalid chain id {}: {}", raw, e)))
}

/// Configuration schema for the EIP-1193 bridge wallet.
pub struct Eip1193WalletSchema;

impl Eip1193WalletSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for Eip1193WalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("bridge_url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("bridge_url must be an http(s) URL".to_string()),
				}
			})],
			vec![
				Field::new(
					"request_timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(600),
					},
				),
				Field::new(
					"poll_interval_ms",
					FieldType::Integer {
						min: Some(10),
						max: Some(60_000),
					},
				),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletProvider for Eip1193Wallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(Eip1193WalletSchema)
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		let result = self.request("eth_chainId", json!([])).await?;
		parse_chain_id(&result)
	}

	async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
		self.request(
			"wallet_switchEthereumChain",
			json!([{ "chainId": format!("0x{:x}", chain_id) }]),
		)
		.await?;
		Ok(())
	}

	async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError> {
		self.request("wallet_addEthereumChain", json!([params.to_add_chain_param()]))
			.await?;
		Ok(())
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		self.request_as("eth_requestAccounts", json!([])).await
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
		self.request_as("eth_call", json!([{ "to": to, "data": data }, "latest"]))
			.await
	}

	async fn send_transaction(&self, tx: TransactionCall) -> Result<B256, WalletError> {
		let tx_hash: B256 = self
			.request_as(
				"eth_sendTransaction",
				json!([{
					"from": tx.from,
					"to": tx.to,
					"data": tx.data,
					"value": format!("0x{:x}", tx.value),
				}]),
			)
			.await?;
		tracing::info!(tx_hash = %with_0x_prefix(&hex::encode(tx_hash.0)), "Submitted transaction through wallet bridge");
		Ok(tx_hash)
	}

	async fn wait_for_receipt(
		&self,
		tx_hash: B256,
		confirmations: u64,
	) -> Result<WalletReceipt, WalletError> {
		loop {
			let receipt: Option<RpcReceipt> = self
				.request_as("eth_getTransactionReceipt", json!([tx_hash]))
				.await?;

			let Some(receipt) = receipt else {
				tokio::time::sleep(self.poll_interval).await;
				continue;
			};
			let Some(block_number) = receipt.block_number.map(|b| b.to::<u64>()) else {
				tokio::time::sleep(self.poll_interval).await;
				continue;
			};

			let current_block: U64 = self.request_as("eth_blockNumber", json!([])).await?;
			let current_confirmations =
				current_block.to::<u64>().saturating_sub(block_number) + 1;
			if current_confirmations >= confirmations {
				return Ok(WalletReceipt {
					tx_hash,
					block_number,
					success: receipt.status.map(|s| s == U64::from(1)).unwrap_or(false),
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
		self.request_as("eth_getBalance", json!([address, "latest"]))
			.await
	}
}

/// Factory function to create an EIP-1193 bridge wallet from configuration.
///
/// Configuration keys:
/// - `bridge_url` (required): JSON-RPC endpoint of the wallet bridge
/// - `request_timeout_seconds` (optional): per-request timeout, default 120
///   (wallet prompts wait on the user)
/// - `poll_interval_ms` (optional): receipt polling interval, default 2000
pub fn create_eip1193_wallet(
	config: &toml::Value,
	_chain: &ChainParams,
) -> Result<Box<dyn WalletProvider>, WalletError> {
	Eip1193WalletSchema::validate_config(config)
		.map_err(|e| WalletError::InvalidConfig(e.to_string()))?;

	let endpoint = config
		.get("bridge_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| WalletError::InvalidConfig("bridge_url is required".to_string()))?
		.to_string();
	let request_timeout = config
		.get("request_timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(120) as u64;
	let poll_interval = config
		.get("poll_interval_ms")
		.and_then(|v| v.as_integer())
		.unwrap_or(2000) as u64;

	Ok(Box::new(Eip1193Wallet::new(
		endpoint,
		Duration::from_secs(request_timeout),
		Duration::from_millis(poll_interval),
	)?))
}

/// Registry for the EIP-1193 bridge wallet implementation.
pub struct Registry;

impl vault_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "eip1193";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_eip1193_wallet
	}
}

impl crate::WalletRegistry for Registry {}
