//! Utility functions for amount and address formatting.

pub mod formatting;

pub use formatting::{
	format_token_amount, parse_token_amount, shorten_address, truncate_id, with_0x_prefix,
	without_0x_prefix, NATIVE_DECIMALS,
};
