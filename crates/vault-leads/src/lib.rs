//! Leads data sources for the vault storefront.
//!
//! A leads source returns the current page of sellable leads plus the access
//! metadata the backend computed for the caller. The connected wallet address,
//! when there is one, is passed along so the backend can account for leads the
//! wallet already bought.

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use vault_types::{ConfigSchema, ImplementationRegistry, LeadsPage};

pub mod implementations {
	pub mod file;
	pub mod http;
}

/// Errors that can occur while fetching leads.
#[derive(Debug, Error)]
pub enum LeadsError {
	/// The source could not be reached or timed out.
	#[error("Leads source unavailable: {0}")]
	Unavailable(String),
	/// The source answered with a non-success status.
	#[error("Leads source returned status {status}: {message}")]
	Status { status: u16, message: String },
	/// The payload did not match the expected shape.
	#[error("Invalid leads response: {0}")]
	InvalidResponse(String),
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Trait implemented by every leads source.
#[async_trait]
pub trait LeadsSource: Send + Sync {
	/// Returns the configuration schema for this source.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the current leads page, correlated with `user` when given.
	async fn fetch(&self, user: Option<Address>) -> Result<LeadsPage, LeadsError>;
}

/// Type alias for leads source factory functions.
///
/// The second argument is the storefront origin reported to the backend.
pub type LeadsFactory = fn(&toml::Value, &str) -> Result<Box<dyn LeadsSource>, LeadsError>;

/// Registry trait for leads source implementations.
pub trait LeadsRegistry: ImplementationRegistry<Factory = LeadsFactory> {}

/// Get all registered leads source implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LeadsFactory)> {
	use implementations::{file, http};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(file::Registry::NAME, file::Registry::factory()),
	]
}
