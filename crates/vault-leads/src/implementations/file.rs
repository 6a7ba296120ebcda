//! Leads read from a JSON file shaped like the API response.
//!
//! Useful for demos and for running the storefront without a backend. The file
//! is re-read on every fetch, so edits show up on the next refresh. The user
//! address is ignored.

use crate::{LeadsError, LeadsSource};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::path::PathBuf;
use vault_types::{ConfigSchema, Field, FieldType, LeadsPage, Schema, ValidationError};

pub struct FileLeadsSource {
	path: PathBuf,
}

impl FileLeadsSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

pub struct FileLeadsSchema;

impl ConfigSchema for FileLeadsSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("path", FieldType::String)], vec![]).validate(config)
	}
}

#[async_trait]
impl LeadsSource for FileLeadsSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileLeadsSchema)
	}

	async fn fetch(&self, _user: Option<Address>) -> Result<LeadsPage, LeadsError> {
		let content = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|e| LeadsError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
		serde_json::from_str(&content).map_err(|e| LeadsError::InvalidResponse(e.to_string()))
	}
}

/// Factory function for the file source. Requires `path`.
pub fn create_file_source(
	config: &toml::Value,
	_origin: &str,
) -> Result<Box<dyn LeadsSource>, LeadsError> {
	FileLeadsSchema
		.validate(config)
		.map_err(|e| LeadsError::InvalidConfig(e.to_string()))?;
	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LeadsError::InvalidConfig("path is required".into()))?;
	Ok(Box::new(FileLeadsSource::new(path)))
}

pub struct Registry;

impl vault_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::LeadsFactory;

	fn factory() -> Self::Factory {
		create_file_source
	}
}

impl crate::LeadsRegistry for Registry {}
