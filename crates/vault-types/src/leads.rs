//! Lead records and listing metadata returned by the leads API.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Reads an explicit `null` as the type's default. The leads API sends
/// `null` for fields it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single prospect shown in the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
	/// Display name. The API sends it as `nom`.
	#[serde(rename = "nom", alias = "name")]
	pub name: String,
	/// Social handle without the leading `@`.
	pub handle: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub bio: String,
	#[serde(default)]
	pub avatar: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub tags: Vec<String>,
}

impl Lead {
	/// Profile URL derived from the handle.
	pub fn profile_url(&self) -> String {
		format!("https://x.com/{}", self.handle.trim_start_matches('@'))
	}
}

/// Access metadata attached to a leads listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsMetadata {
	/// Whether the caller only sees a limited slice of the vault.
	#[serde(default, deserialize_with = "null_as_default")]
	pub is_limited: bool,
	/// Banner message supplied by the backend.
	#[serde(default, deserialize_with = "null_as_default")]
	pub message: String,
	#[serde(default, rename = "freeProspects", deserialize_with = "null_as_default")]
	pub free_count: u64,
	#[serde(default, rename = "leadsPurchased", deserialize_with = "null_as_default")]
	pub purchased_count: u64,
	#[serde(default, rename = "maxAvailableProspects", deserialize_with = "null_as_default")]
	pub max_available: u64,
	#[serde(default, rename = "remainingLeads", deserialize_with = "null_as_default")]
	pub remaining_in_queue: u64,
}

impl LeadsMetadata {
	/// Projects the metadata onto the branch the storefront renders.
	pub fn access_summary(&self) -> AccessSummary {
		if self.is_limited {
			AccessSummary::Limited {
				free: self.free_count,
				purchased: self.purchased_count,
				total: self.max_available,
			}
		} else if self.remaining_in_queue > 0 {
			AccessSummary::Queued {
				remaining: self.remaining_in_queue,
			}
		} else {
			AccessSummary::Complete
		}
	}
}

/// The three ways listing metadata is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessSummary {
	/// Limited access: free plus purchased leads out of the total.
	Limited { free: u64, purchased: u64, total: u64 },
	/// Unlimited access with leads still waiting in the queue.
	Queued { remaining: u64 },
	/// Unlimited access and the queue is exhausted.
	Complete,
}

impl fmt::Display for AccessSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessSummary::Limited {
				free,
				purchased,
				total,
			} => write!(
				f,
				"{} free + {} purchased on {} total",
				free, purchased, total
			),
			AccessSummary::Queued { remaining } => {
				write!(f, "{} additional leads in queue", remaining)
			},
			AccessSummary::Complete => write!(f, "vault access complete"),
		}
	}
}

/// One response from the leads API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadsPage {
	#[serde(rename = "prospects", default, deserialize_with = "null_as_default")]
	pub items: Vec<Lead>,
	#[serde(default)]
	pub metadata: Option<LeadsMetadata>,
}
