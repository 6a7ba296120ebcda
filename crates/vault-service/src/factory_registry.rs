//! Factory registry for wallet providers and leads sources.
//!
//! Implementations register themselves by name through each crate's
//! `get_all_implementations`; the configuration then picks one by its
//! `primary` key.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use vault_config::Config;
use vault_core::{Storefront, StorefrontSettings};
use vault_gateway::{ChainGateway, GatewaySettings};
use vault_leads::{LeadsFactory, LeadsSource};
use vault_wallet::{WalletFactory, WalletProvider};

/// Global registry of implementation factories.
pub struct FactoryRegistry {
	pub wallet: HashMap<String, WalletFactory>,
	pub leads: HashMap<String, LeadsFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			wallet: HashMap::new(),
			leads: HashMap::new(),
		}
	}

	pub fn register_wallet(&mut self, name: impl Into<String>, factory: WalletFactory) {
		self.wallet.insert(name.into(), factory);
	}

	pub fn register_leads(&mut self, name: impl Into<String>, factory: LeadsFactory) {
		self.leads.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in vault_wallet::get_all_implementations() {
			tracing::debug!("Registering wallet implementation: {}", name);
			registry.register_wallet(name, factory);
		}

		for (name, factory) in vault_leads::get_all_implementations() {
			tracing::debug!("Registering leads implementation: {}", name);
			registry.register_leads(name, factory);
		}

		registry
	})
}

/// Looks up the factory named by a config section's `primary` key.
macro_rules! resolve_factory {
	($registry:expr, $registry_field:ident, $name:expr, $type_name:literal) => {{
		match $registry.$registry_field.get($name) {
			Some(factory) => *factory,
			None => {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					$name,
					available.join(", ")
				)
				.into());
			},
		}
	}};
}

/// Wires the storefront described by `config`.
///
/// A config without a `[wallet]` section yields a storefront whose gateway
/// reports `WalletUnavailable` on connect; leads can still be browsed.
pub fn build_storefront(config: &Config) -> Result<Storefront, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let chain = config.network.chain_params();

	let wallet: Option<Arc<dyn WalletProvider>> = match &config.wallet {
		Some(wallet_config) => {
			let factory = resolve_factory!(registry, wallet, &wallet_config.primary, "wallet");
			let implementation_config = wallet_config
				.implementations
				.get(&wallet_config.primary)
				.ok_or_else(|| format!("Missing wallet config for '{}'", wallet_config.primary))?;
			let provider = factory(implementation_config, &chain)?;
			tracing::info!(implementation = %wallet_config.primary, "Wallet provider ready");
			Some(Arc::from(provider))
		},
		None => {
			tracing::warn!("No [wallet] section configured; purchases are unavailable");
			None
		},
	};

	let factory = resolve_factory!(registry, leads, &config.leads.primary, "leads");
	let leads_config = config
		.leads
		.implementations
		.get(&config.leads.primary)
		.ok_or_else(|| format!("Missing leads config for '{}'", config.leads.primary))?;
	let leads: Arc<dyn LeadsSource> = Arc::from(factory(leads_config, &config.storefront.origin)?);

	let gateway = Arc::new(ChainGateway::new(
		wallet,
		GatewaySettings {
			contract_address: config.contract.address,
			chain,
			confirmations: config.contract.confirmations,
			confirmation_timeout: config.confirmation_timeout(),
		},
	));

	let settings = StorefrontSettings {
		packages: config.storefront.packages.clone(),
		post_connect_refresh_delay: Duration::from_millis(
			config.storefront.post_connect_refresh_delay_ms,
		),
		post_purchase_refresh_delay: Duration::from_millis(
			config.storefront.post_purchase_refresh_delay_ms,
		),
		explorer_url: config.network.explorer_url.clone(),
		currency_symbol: config.network.native_currency.symbol.clone(),
	};

	Ok(Storefront::new(gateway, leads, settings))
}
