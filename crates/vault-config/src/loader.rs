//! Multi-file configuration loading.
//!
//! A configuration file may list other files under `include`. Included files
//! can include further files. Every top-level section must come from exactly
//! one file, and a file may only be loaded once per load.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths seen during this load.
	loaded_files: HashSet<PathBuf>,
	/// Which file defined each top-level section.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `config_path`.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let mut combined = toml::Table::new();
		self.merge_file(&config_path, &mut combined).await?;

		let config_str = toml::to_string(&combined).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		config_str.parse()
	}

	/// Reads one file, recursing into its includes before merging its own
	/// sections into `combined`.
	async fn merge_file(
		&mut self,
		path: &Path,
		combined: &mut toml::Table,
	) -> Result<(), ConfigError> {
		let content = self.load_file(path).await?;
		let mut table: toml::Table = toml::from_str(&content)?;
		let includes = extract_includes(&table)?;
		table.remove("include");

		for (key, value) in table {
			if let Some(existing_source) = self.section_sources.get(&key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing_source.display(),
					path.display()
				)));
			}
			self.section_sources.insert(key.clone(), path.to_path_buf());
			combined.insert(key, value);
		}

		for include in includes {
			let resolved = self.resolve_path(&include)?;
			debug!(file = %resolved.display(), "Loading included configuration");
			Box::pin(self.merge_file(&resolved, combined)).await?;
		}

		Ok(())
	}

	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical_path = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

fn extract_includes(table: &toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const STOREFRONT: &str = r#"
[storefront]
id = "vault-test"

[contract]
address = "0xA55cD301A354Fdffcfa494eFD8A218440bbf227E"
"#;

	const SOURCES: &str = r#"
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

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		fs::write(&config_path, format!("{}{}", STOREFRONT, SOURCES)).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.storefront.id, "vault-test");
		assert_eq!(config.leads.primary, "http");
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();
		let main_config = format!("include = [\"sources.toml\"]\n{}", STOREFRONT);

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("sources.toml"), SOURCES).unwrap();

		let config = Config::from_file(temp_dir.path().join("main.toml").to_str().unwrap())
			.await
			.unwrap();

		assert_eq!(config.storefront.id, "vault-test");
		assert_eq!(config.wallet.unwrap().primary, "local");
	}

	#[tokio::test]
	async fn test_nested_includes() {
		let temp_dir = TempDir::new().unwrap();
		let main_config = format!("include = \"middle.toml\"\n{}", STOREFRONT);
		let middle = r#"
include = ["leaf.toml"]

[network]
chain_id = 84532
chain_name = "Base Sepolia"
rpc_url = "https://sepolia.base.org"
"#;

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("middle.toml"), middle).unwrap();
		fs::write(temp_dir.path().join("leaf.toml"), SOURCES).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.network.chain_id, 84532);
		assert_eq!(config.leads.primary, "http");
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();
		let main_config = format!("include = [\"duplicate.toml\"]\n{}", STOREFRONT);
		let duplicate_config = "[storefront]\nid = \"another-vault\"\n";

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("duplicate.toml"), duplicate_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("main.toml")
			.await
			.unwrap_err()
			.to_string();

		assert!(error_msg.contains("Duplicate section 'storefront'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();
		let config = format!("include = [\"self.toml\"]\n{}", STOREFRONT);
		fs::write(temp_dir.path().join("self.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("self.toml")
			.await
			.unwrap_err()
			.to_string();

		assert!(error_msg.contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		let config = format!("include = [\"missing.toml\"]\n{}", STOREFRONT);
		fs::write(temp_dir.path().join("main.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("main.toml")
			.await
			.unwrap_err()
			.to_string();

		assert!(error_msg.contains("Configuration file not found"));
	}
}
