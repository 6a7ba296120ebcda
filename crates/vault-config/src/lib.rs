//! Configuration module for the leads vault.
//!
//! Configuration is read from TOML. `${VAR}` and `${VAR:-default}` references
//! are resolved from the environment before parsing, and a file may pull in
//! other files with `include = ["wallet.toml"]` as long as every top-level
//! section is defined exactly once.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use vault_types::{Address, ChainParams, LeadPackage, NativeCurrency};

pub use loader::ConfigLoader;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering echoes the whole input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration of the storefront.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub storefront: StorefrontConfig,
	/// The chain purchases are made on.
	#[serde(default)]
	pub network: NetworkConfig,
	/// The priced leads contract.
	pub contract: ContractConfig,
	/// Wallet provider. When absent every chain operation reports that no
	/// wallet is available.
	pub wallet: Option<WalletConfig>,
	/// Leads API source.
	pub leads: LeadsConfig,
	/// Optional HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Storefront identity and presentation behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorefrontConfig {
	pub id: String,
	/// Origin reported to the leads API in the `x-origin` header.
	#[serde(default = "default_origin")]
	pub origin: String,
	/// Delay before reloading leads after a wallet connects.
	#[serde(default = "default_post_connect_refresh_delay_ms")]
	pub post_connect_refresh_delay_ms: u64,
	/// Delay before reloading leads after a confirmed purchase, giving the
	/// backend time to index the purchase event.
	#[serde(default = "default_post_purchase_refresh_delay_ms")]
	pub post_purchase_refresh_delay_ms: u64,
	#[serde(default = "LeadPackage::default_catalogue")]
	pub packages: Vec<LeadPackage>,
}

fn default_origin() -> String {
	"http://localhost:3000".to_string()
}

fn default_post_connect_refresh_delay_ms() -> u64 {
	1500
}

fn default_post_purchase_refresh_delay_ms() -> u64 {
	2000
}

/// Chain the storefront sells on. Defaults to Base mainnet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	#[serde(default = "default_chain_name")]
	pub chain_name: String,
	#[serde(default = "default_rpc_url")]
	pub rpc_url: String,
	#[serde(default = "default_explorer_url")]
	pub explorer_url: Option<String>,
	#[serde(default)]
	pub native_currency: NativeCurrency,
}

fn default_chain_id() -> u64 {
	8453
}

fn default_chain_name() -> String {
	"Base".to_string()
}

fn default_rpc_url() -> String {
	"https://mainnet.base.org".to_string()
}

fn default_explorer_url() -> Option<String> {
	Some("https://basescan.org".to_string())
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			chain_id: default_chain_id(),
			chain_name: default_chain_name(),
			rpc_url: default_rpc_url(),
			explorer_url: default_explorer_url(),
			native_currency: NativeCurrency::default(),
		}
	}
}

impl NetworkConfig {
	/// Parameters handed to a wallet that does not know this chain yet.
	pub fn chain_params(&self) -> ChainParams {
		ChainParams {
			chain_id: self.chain_id,
			chain_name: self.chain_name.clone(),
			native_currency: self.native_currency.clone(),
			rpc_urls: vec![self.rpc_url.clone()],
			block_explorer_urls: self.explorer_url.iter().cloned().collect(),
		}
	}
}

/// The leads contract and how long to wait for its transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	pub address: Address,
	/// Confirmations required before a purchase counts as confirmed.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Upper bound on waiting for a purchase to confirm.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

fn default_confirmations() -> u64 {
	1
}

fn default_confirmation_timeout_seconds() -> u64 {
	300
}

/// Wallet provider selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of wallet implementation names to their raw configuration.
	pub implementations: HashMap<String, toml::Value>,
}

/// Leads API source selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeadsConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds. Purchases wait for confirmation inside the
	/// request, so when enabled this must exceed the confirmation timeout
	/// plus the post-purchase refresh delay.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

fn default_api_timeout() -> u64 {
	600
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with the default
/// in `${VAR_NAME:-default}` when the variable is unset. Inputs are limited
/// to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Purchase confirmation timeout as a duration.
	pub fn confirmation_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.contract.confirmation_timeout_seconds)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.storefront.id.is_empty() {
			return Err(ConfigError::Validation(
				"Storefront ID cannot be empty".into(),
			));
		}

		if self.storefront.packages.is_empty() {
			return Err(ConfigError::Validation(
				"At least one lead package must be configured".into(),
			));
		}
		let mut package_ids = HashSet::new();
		for package in &self.storefront.packages {
			if package.lead_count == 0 {
				return Err(ConfigError::Validation(format!(
					"Package {} must contain at least one lead",
					package.id
				)));
			}
			if !package_ids.insert(package.id) {
				return Err(ConfigError::Validation(format!(
					"Duplicate package id {}",
					package.id
				)));
			}
		}

		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		if self.network.rpc_url.is_empty() {
			return Err(ConfigError::Validation(
				"network.rpc_url cannot be empty".into(),
			));
		}

		if self.contract.address == Address::ZERO {
			return Err(ConfigError::Validation(
				"contract.address cannot be the zero address".into(),
			));
		}
		if self.contract.confirmations == 0 {
			return Err(ConfigError::Validation(
				"contract.confirmations must be at least 1".into(),
			));
		}
		if self.contract.confirmations > 100 {
			return Err(ConfigError::Validation(
				"contract.confirmations cannot exceed 100".into(),
			));
		}
		if self.contract.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"contract.confirmation_timeout_seconds must be greater than 0".into(),
			));
		}
		if self.contract.confirmation_timeout_seconds > 3600 {
			return Err(ConfigError::Validation(
				"contract.confirmation_timeout_seconds cannot exceed 3600 (1 hour)".into(),
			));
		}

		if let Some(api) = self.api.as_ref().filter(|api| api.enabled) {
			if api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"api.timeout_seconds must be greater than 0".into(),
				));
			}
			// A purchase request waits for confirmation and then the leads reload.
			let purchase_ms = self
				.contract
				.confirmation_timeout_seconds
				.saturating_mul(1000)
				.saturating_add(self.storefront.post_purchase_refresh_delay_ms);
			if api.timeout_seconds.saturating_mul(1000) <= purchase_ms {
				return Err(ConfigError::Validation(format!(
					"api.timeout_seconds ({}) must exceed contract.confirmation_timeout_seconds ({}) plus storefront.post_purchase_refresh_delay_ms ({})",
					api.timeout_seconds,
					self.contract.confirmation_timeout_seconds,
					self.storefront.post_purchase_refresh_delay_ms
				)));
			}
		}

		if let Some(ref wallet) = self.wallet {
			if !wallet.implementations.contains_key(&wallet.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary wallet '{}' not found in implementations",
					wallet.primary
				)));
			}
		}

		if !self.leads.implementations.contains_key(&self.leads.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary leads source '{}' not found in implementations",
				self.leads.primary
			)));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[storefront]
id = "vault-test"

[contract]
address = "0xA55cD301A354Fdffcfa494eFD8A218440bbf227E"

[wallet]
primary = "local"
[wallet.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[leads]
primary = "http"
[leads.implementations.http]
api_base_url = "http://localhost:3003/api"
site_access_key = "secret"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("VAULT_TEST_HOST", "localhost");
		std::env::set_var("VAULT_TEST_PORT", "3003");

		let input = "url = \"http://${VAULT_TEST_HOST}:${VAULT_TEST_PORT}/api\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:3003/api\"");

		std::env::remove_var("VAULT_TEST_HOST");
		std::env::remove_var("VAULT_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${VAULT_MISSING_VAR:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${VAULT_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("VAULT_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = BASE_CONFIG.parse().unwrap();

		assert_eq!(config.network.chain_id, 8453);
		assert_eq!(config.network.chain_name, "Base");
		assert_eq!(config.contract.confirmations, 1);
		assert_eq!(config.confirmation_timeout().as_secs(), 300);
		assert_eq!(config.storefront.post_connect_refresh_delay_ms, 1500);
		assert_eq!(config.storefront.post_purchase_refresh_delay_ms, 2000);
		assert_eq!(config.storefront.packages.len(), 3);
		assert!(config.api.is_none());

		let params = config.network.chain_params();
		assert_eq!(params.rpc_urls, vec!["https://mainnet.base.org"]);
		assert_eq!(params.block_explorer_urls, vec!["https://basescan.org"]);
	}

	#[test]
	fn test_wallet_section_is_optional() {
		let without_wallet = BASE_CONFIG.replace(
			"[wallet]\nprimary = \"local\"\n[wallet.implementations.local]\nprivate_key = \"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80\"\n",
			"",
		);
		let config: Config = without_wallet.parse().unwrap();
		assert!(config.wallet.is_none());
	}

	#[test]
	fn test_unknown_primary_wallet_rejected() {
		let config = BASE_CONFIG.replace("primary = \"local\"", "primary = \"ledger\"");
		let err = Config::from_str(&config).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary wallet 'ledger' not found in implementations"));
	}

	#[test]
	fn test_zero_contract_address_rejected() {
		let config = BASE_CONFIG.replace(
			"0xA55cD301A354Fdffcfa494eFD8A218440bbf227E",
			"0x0000000000000000000000000000000000000000",
		);
		let err = Config::from_str(&config).unwrap_err();
		assert!(err.to_string().contains("zero address"));
	}

	#[test]
	fn test_duplicate_package_ids_rejected() {
		let config = format!(
			"{}\n{}",
			BASE_CONFIG,
			r#"
[[storefront.packages]]
id = 1
lead_count = 10

[[storefront.packages]]
id = 1
lead_count = 20
"#
		);
		let err = Config::from_str(&config).unwrap_err();
		assert!(err.to_string().contains("Duplicate package id 1"));
	}

	#[test]
	fn test_confirmation_timeout_bounds() {
		let config = BASE_CONFIG.replace(
			"address = \"0xA55cD301A354Fdffcfa494eFD8A218440bbf227E\"",
			"address = \"0xA55cD301A354Fdffcfa494eFD8A218440bbf227E\"\nconfirmation_timeout_seconds = 0",
		);
		let err = Config::from_str(&config).unwrap_err();
		assert!(err.to_string().contains("confirmation_timeout_seconds"));
	}

	#[test]
	fn test_api_timeout_must_cover_confirmation() {
		let with_api = |timeout: u64, enabled: bool| {
			format!(
				"{}\n[api]\nenabled = {}\ntimeout_seconds = {}\n",
				BASE_CONFIG, enabled, timeout
			)
		};

		let err = Config::from_str(&with_api(60, true)).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
		assert!(err.to_string().contains("api.timeout_seconds (60)"));

		// 300 s confirmation plus the 2 s refresh delay.
		assert!(Config::from_str(&with_api(302, true)).is_err());
		let config = Config::from_str(&with_api(303, true)).unwrap();
		assert_eq!(config.api.unwrap().timeout_seconds, 303);

		assert!(Config::from_str(&with_api(60, false)).is_ok());
	}
}
