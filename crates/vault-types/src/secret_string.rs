//! Secret string type for private keys and API access keys.
//!
//! `SecretString` zeroes its memory on drop and never prints its content in
//! `Debug`, `Display` or serialized output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret to a closure, limiting where it is visible.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Reads a non-empty string field of an implementation config table.
	pub fn from_config(config: &toml::Value, key: &str) -> Option<Self> {
		config
			.get(key)
			.and_then(|v| v.as_str())
			.filter(|v| !v.is_empty())
			.map(Self::from)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(***REDACTED***)")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_redacted_output() {
		let secret = SecretString::from("web3-prospects-secret");
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(secret.to_string(), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&secret).unwrap(),
			"\"***REDACTED***\""
		);
		assert_eq!(secret.with_exposed(|s| s.len()), 21);
	}

	#[test]
	fn test_from_config() {
		let config: toml::Value =
			toml::from_str("site_access_key = \"abc\"\nprivate_key = \"\"").unwrap();
		let key = SecretString::from_config(&config, "site_access_key").unwrap();
		assert_eq!(key.with_exposed(str::to_string), "abc");
		assert!(SecretString::from_config(&config, "private_key").is_none());
		assert!(SecretString::from_config(&config, "missing").is_none());
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let secret: SecretString = serde_json::from_str("\"0xabc\"").unwrap();
		assert_eq!(secret, SecretString::from("0xabc"));
		assert!(!secret.is_empty());
	}
}
