//! Scripted wallet for exercising the gateway without a chain.
//!
//! Answers the leads contract's view calls from a [`Script`], records what it
//! was asked to do, and can hold receipts back to keep a purchase pending.

use crate::contract::ILeadsVault::{
	getLeadsCall, price_baseCall, price_highCall, price_lowCall, price_mediumCall,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use vault_types::{
	parse_token_amount, ChainParams, ConfigSchema, PriceSchedule, Schema, ValidationError,
};
use vault_wallet::{TransactionCall, WalletError, WalletProvider, WalletReceipt};

/// Parses a decimal ether amount into wei.
pub fn eth(amount: &str) -> U256 {
	parse_token_amount(amount, 18).expect("valid ether amount")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
	Accept,
	Reject,
	/// The node refuses the transaction, e.g. a stale nonce.
	NodeRejected,
	InsufficientFunds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
	Success,
	Reverted,
	/// The transaction never gets mined.
	Never,
}

/// Behaviour and call log of a [`ScriptedWallet`].
#[derive(Debug)]
pub struct Script {
	pub chain_id: u64,
	pub known_chains: HashSet<u64>,
	pub accounts: Vec<Address>,
	pub decline_switch: bool,
	/// `wallet_switchEthereumChain` is not implemented.
	pub switch_unsupported: bool,
	pub fail_add_chain: bool,
	/// Fail every contract view call.
	pub fail_reads: bool,
	pub prices: PriceSchedule,
	pub purchased: U256,
	pub balance: U256,
	pub send: SendOutcome,
	pub receipt: ReceiptOutcome,
	/// Keep `wait_for_receipt` blocked until [`ScriptedWallet::release_receipts`].
	pub hold_receipts: bool,
	pub switch_requests: Vec<u64>,
	pub added_chains: Vec<u64>,
	pub sent: Vec<TransactionCall>,
	pub block_number: u64,
}

pub struct ScriptedWallet {
	script: Mutex<Script>,
	entered_wait: Notify,
	release: Notify,
}

impl ScriptedWallet {
	/// A wallet on `chain_id` with one account and a 0.001 ETH flat schedule.
	pub fn new(chain_id: u64) -> Self {
		let flat = eth("0.001");
		Self {
			script: Mutex::new(Script {
				chain_id,
				known_chains: HashSet::from([chain_id]),
				accounts: vec![Address::repeat_byte(0xa1)],
				decline_switch: false,
				switch_unsupported: false,
				fail_add_chain: false,
				fail_reads: false,
				prices: PriceSchedule {
					base: flat,
					medium: flat,
					high: flat,
					low: flat,
				},
				purchased: U256::ZERO,
				balance: U256::ZERO,
				send: SendOutcome::Accept,
				receipt: ReceiptOutcome::Success,
				hold_receipts: false,
				switch_requests: Vec::new(),
				added_chains: Vec::new(),
				sent: Vec::new(),
				block_number: 100,
			}),
			entered_wait: Notify::new(),
			release: Notify::new(),
		}
	}

	pub fn script(&self) -> MutexGuard<'_, Script> {
		self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// The primary account.
	pub fn account(&self) -> Address {
		self.script().accounts[0]
	}

	/// Resolves once a purchase is waiting for its receipt.
	pub async fn waiting_for_receipt(&self) {
		self.entered_wait.notified().await;
	}

	pub fn release_receipts(&self) {
		self.script().hold_receipts = false;
		self.release.notify_waiters();
	}
}

struct ScriptedSchema;

impl ConfigSchema for ScriptedSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ScriptedSchema)
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		Ok(self.script().chain_id)
	}

	async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
		let mut script = self.script();
		script.switch_requests.push(chain_id);
		if script.switch_unsupported {
			return Err(WalletError::Unsupported(
				"wallet_switchEthereumChain".to_string(),
			));
		}
		if script.decline_switch {
			return Err(WalletError::UserRejected);
		}
		if !script.known_chains.contains(&chain_id) {
			return Err(WalletError::UnknownChain);
		}
		script.chain_id = chain_id;
		Ok(())
	}

	async fn add_chain(&self, params: &ChainParams) -> Result<(), WalletError> {
		let mut script = self.script();
		script.added_chains.push(params.chain_id);
		if script.fail_add_chain {
			return Err(WalletError::Rejected(
				"RPC error -32602: invalid chain parameters".to_string(),
			));
		}
		script.known_chains.insert(params.chain_id);
		Ok(())
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(self.script().accounts.clone())
	}

	async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, WalletError> {
		let script = self.script();
		if script.fail_reads {
			return Err(WalletError::Network("connection reset".to_string()));
		}
		let selector: [u8; 4] = data
			.get(..4)
			.and_then(|s| s.try_into().ok())
			.ok_or_else(|| WalletError::Reverted("missing selector".to_string()))?;
		let value = if selector == price_baseCall::SELECTOR {
			script.prices.base
		} else if selector == price_mediumCall::SELECTOR {
			script.prices.medium
		} else if selector == price_highCall::SELECTOR {
			script.prices.high
		} else if selector == price_lowCall::SELECTOR {
			script.prices.low
		} else if selector == getLeadsCall::SELECTOR {
			script.purchased
		} else {
			return Err(WalletError::Reverted("unknown selector".to_string()));
		};
		Ok(Bytes::from(value.abi_encode()))
	}

	async fn send_transaction(&self, tx: TransactionCall) -> Result<B256, WalletError> {
		let mut script = self.script();
		match script.send {
			SendOutcome::Reject => return Err(WalletError::UserRejected),
			SendOutcome::NodeRejected => {
				return Err(WalletError::Rejected(
					"RPC error -32000: nonce too low".to_string(),
				))
			},
			SendOutcome::InsufficientFunds => {
				return Err(WalletError::InsufficientFunds(
					"insufficient funds for gas * price + value".to_string(),
				))
			},
			SendOutcome::Accept => {},
		}
		script.sent.push(tx);
		let nonce = script.sent.len() as u8;
		Ok(B256::repeat_byte(nonce))
	}

	async fn wait_for_receipt(
		&self,
		tx_hash: B256,
		_confirmations: u64,
	) -> Result<WalletReceipt, WalletError> {
		let released = self.release.notified();
		self.entered_wait.notify_one();
		let hold = self.script().hold_receipts;
		if hold {
			released.await;
		}

		let (outcome, block_number) = {
			let mut script = self.script();
			script.block_number += 1;
			(script.receipt, script.block_number)
		};
		match outcome {
			ReceiptOutcome::Never => std::future::pending().await,
			ReceiptOutcome::Success | ReceiptOutcome::Reverted => Ok(WalletReceipt {
				tx_hash,
				block_number,
				success: outcome == ReceiptOutcome::Success,
			}),
		}
	}

	async fn get_balance(&self, _address: Address) -> Result<U256, WalletError> {
		Ok(self.script().balance)
	}
}
