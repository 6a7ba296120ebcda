//! Common types module for the leads vault.
//!
//! This module defines the data model shared by the wallet, gateway,
//! leads and storefront crates, along with configuration validation
//! helpers and formatting utilities.

/// API types for the HTTP presentation boundary.
pub mod api;
/// Lead records and the metadata returned by the leads API.
pub mod leads;
/// Network parameters used when asking a wallet to add a chain.
pub mod networks;
/// Price schedules, purchase requests and receipts.
pub mod pricing;
/// Registry trait for named implementations.
pub mod registry;
/// Redacting wrapper for private keys and access keys.
pub mod secret_string;
/// Wallet session state.
pub mod session;
/// Utility functions for amount and address formatting.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use alloy_primitives::{Address, U256};
pub use api::*;
pub use leads::*;
pub use networks::{ChainParams, NativeCurrency};
pub use pricing::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use session::WalletSession;
pub use utils::{
	format_token_amount, parse_token_amount, shorten_address, truncate_id, with_0x_prefix,
	without_0x_prefix, NATIVE_DECIMALS,
};
pub use validation::*;
