//! Leads backend reached over HTTP.
//!
//! Issues `GET {api_base_url}/prospects-vendables`. Every request carries the
//! site access key (`x-site-access`) and the storefront origin (`x-origin`);
//! `x-user-address` is added only when a wallet is connected.

use crate::{LeadsError, LeadsSource};
use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::debug;
use vault_types::{ConfigSchema, Field, FieldType, LeadsPage, Schema, SecretString, ValidationError};

const LEADS_PATH: &str = "/prospects-vendables";
const SITE_ACCESS_HEADER: &str = "x-site-access";
const ORIGIN_HEADER: &str = "x-origin";
const USER_ADDRESS_HEADER: &str = "x-user-address";

/// HTTP client for the leads backend.
pub struct HttpLeadsSource {
	client: reqwest::Client,
	base_url: String,
}

impl std::fmt::Debug for HttpLeadsSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpLeadsSource")
			.field("base_url", &self.base_url)
			.finish_non_exhaustive()
	}
}

impl HttpLeadsSource {
	pub fn new(
		base_url: &str,
		site_access_key: &SecretString,
		origin: &str,
		timeout: Duration,
	) -> Result<Self, LeadsError> {
		let mut access = site_access_key
			.with_exposed(HeaderValue::from_str)
			.map_err(|_| LeadsError::InvalidConfig("site_access_key is not a valid header value".into()))?;
		access.set_sensitive(true);
		let origin = HeaderValue::from_str(origin)
			.map_err(|_| LeadsError::InvalidConfig(format!("Invalid origin: {}", origin)))?;

		let mut headers = HeaderMap::new();
		headers.insert(SITE_ACCESS_HEADER, access);
		headers.insert(ORIGIN_HEADER, origin);
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = reqwest::Client::builder()
			.default_headers(headers)
			.connect_timeout(Duration::from_secs(10))
			.timeout(timeout)
			.build()
			.map_err(|e| LeadsError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

/// Configuration schema for the HTTP leads source.
pub struct HttpLeadsSchema;

impl HttpLeadsSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for HttpLeadsSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("api_base_url", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
							Ok(())
						},
						_ => Err("api_base_url must be an http(s) URL".to_string()),
					}
				}),
				Field::new("site_access_key", FieldType::String),
			],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl LeadsSource for HttpLeadsSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpLeadsSchema)
	}

	async fn fetch(&self, user: Option<Address>) -> Result<LeadsPage, LeadsError> {
		let url = format!("{}{}", self.base_url, LEADS_PATH);
		let mut request = self.client.get(&url);
		if let Some(address) = user {
			request = request.header(USER_ADDRESS_HEADER, address.to_string());
		}

		debug!(url = %url, user = ?user, "Fetching leads");
		let response = request
			.send()
			.await
			.map_err(|e| LeadsError::Unavailable(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(LeadsError::Status {
				status: status.as_u16(),
				message,
			});
		}

		response
			.json::<LeadsPage>()
			.await
			.map_err(|e| LeadsError::InvalidResponse(e.to_string()))
	}
}

/// Factory function to create the HTTP leads source from configuration.
///
/// Configuration keys:
/// - `api_base_url` (required): base URL of the leads API, e.g. `http://localhost:3003/api`
/// - `site_access_key` (required): value of the `x-site-access` header
/// - `timeout_seconds` (optional): request timeout, default 15
pub fn create_http_source(
	config: &toml::Value,
	origin: &str,
) -> Result<Box<dyn LeadsSource>, LeadsError> {
	HttpLeadsSchema::validate_config(config)
		.map_err(|e| LeadsError::InvalidConfig(e.to_string()))?;

	let base_url = config
		.get("api_base_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LeadsError::InvalidConfig("api_base_url is required".into()))?;
	let site_access_key = SecretString::from_config(config, "site_access_key")
		.ok_or_else(|| LeadsError::InvalidConfig("site_access_key is required".into()))?;
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(15) as u64;

	Ok(Box::new(HttpLeadsSource::new(
		base_url,
		&site_access_key,
		origin,
		Duration::from_secs(timeout),
	)?))
}

/// Registry for the HTTP leads source.
pub struct Registry;

impl vault_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::LeadsFactory;

	fn factory() -> Self::Factory {
		create_http_source
	}
}

impl crate::LeadsRegistry for Registry {}
