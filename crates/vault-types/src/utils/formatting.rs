//! String formatting utilities.
//!
//! Converts wei amounts to and from decimal strings without floating point,
//! and shortens hashes and addresses for log lines and display.

use alloy_primitives::{Address, U256};

/// Decimals of the chain's native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Truncates a hex string for display, keeping the first 8 characters.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Shortens an address to the `0x1234...abcd` form used in the wallet badge.
pub fn shorten_address(address: &Address) -> String {
	let full = address.to_string();
	format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Formats a raw token amount with decimal places for display.
///
/// Trailing zeros of the fractional part are dropped, so
/// `format_token_amount("5000000000000000", 18)` is `"0.005"`.
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let decimal_places = decimals as usize;

	let (integer_part, decimal_part) = if amount.len() <= decimal_places {
		let decimal_str = format!("{:0>width$}", amount, width = decimal_places);
		("0".to_string(), decimal_str)
	} else {
		let split_pos = amount.len() - decimal_places;
		(
			amount[..split_pos].to_string(),
			amount[split_pos..].to_string(),
		)
	};

	let decimal_trimmed = decimal_part.trim_end_matches('0');

	if decimal_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, decimal_trimmed)
	}
}

/// Parses a decimal amount such as `"0.0005"` into its smallest-unit integer.
///
/// Returns `None` for malformed input, more fractional digits than
/// `decimals`, or overflow.
pub fn parse_token_amount(amount: &str, decimals: u8) -> Option<U256> {
	let amount = amount.trim();
	let (integer_part, fraction_part) = match amount.split_once('.') {
		Some((int, frac)) => (int, frac),
		None => (amount, ""),
	};

	if integer_part.is_empty() && fraction_part.is_empty() {
		return None;
	}
	if fraction_part.len() > decimals as usize {
		return None;
	}
	if !integer_part
		.chars()
		.chain(fraction_part.chars())
		.all(|c| c.is_ascii_digit())
	{
		return None;
	}

	let digits = format!(
		"{}{:0<width$}",
		integer_part,
		fraction_part,
		width = decimals as usize
	);
	let digits = digits.trim_start_matches('0');
	if digits.is_empty() {
		return Some(U256::ZERO);
	}
	U256::from_str_radix(digits, 10).ok()
}
