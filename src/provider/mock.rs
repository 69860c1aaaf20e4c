//! Scripted wallet for unit tests
//!
//! Emulates an injected wallet in front of a deployed Transactions contract:
//! `addToBlockchain` sends are ABI-decoded and appended to an in-memory
//! ledger, views are answered from it, receipts are mined on demand.

use super::{codes, methods, ProviderRpcError, WalletProvider};
use crate::config::ContractSettings;
use crate::gateway::{Transactions, TransferStruct};
use alloy::hex;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const ALICE: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const BOB: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

/// 2024-06-10T06:13:20Z
pub const BLOCK_TIME: u64 = 1_718_000_000;

pub fn contract_settings() -> ContractSettings {
    ContractSettings {
        address: CONTRACT.to_string(),
        receipt_poll_interval_ms: 1,
        ..ContractSettings::default()
    }
}

/// Raw contract record moving `ether` whole ether
pub fn record(sender: &str, receiver: &str, ether: u64, message: &str, timestamp: u64) -> TransferStruct {
    raw_record(sender, receiver, ether, message, U256::from(timestamp))
}

pub fn raw_record(
    sender: &str,
    receiver: &str,
    ether: u64,
    message: &str,
    timestamp: U256,
) -> TransferStruct {
    TransferStruct {
        sender: sender.parse().unwrap(),
        receiver: receiver.parse().unwrap(),
        amount: U256::from(ether) * U256::from(10u64).pow(U256::from(18)),
        message: message.to_string(),
        timestamp,
        keyword: String::new(),
    }
}

#[derive(Default)]
struct MockState {
    authorized: Vec<String>,
    grant: Vec<String>,
    reject_connect: bool,
    failures: HashMap<String, ProviderRpcError>,
    record_failure: Option<ProviderRpcError>,
    revert: bool,
    call_override: Option<String>,
    receipt_delay: usize,
    records: Vec<TransferStruct>,
    requests: Vec<String>,
    sent: Vec<Value>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    accounts_tx: broadcast::Sender<Vec<String>>,
}

impl MockWallet {
    pub fn new() -> Self {
        let (accounts_tx, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MockState {
                grant: vec![ALICE.to_string()],
                ..MockState::default()
            }),
            accounts_tx,
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut MockState)) -> Self {
        f(self.state.get_mut().unwrap());
        self
    }

    pub fn with_authorized(self, accounts: &[&str]) -> Self {
        let accounts: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        self.configure(|s| s.authorized = accounts)
    }

    pub fn rejecting_connect(self) -> Self {
        self.configure(|s| s.reject_connect = true)
    }

    /// Fail every request for `method`
    pub fn failing(self, method: &str, err: ProviderRpcError) -> Self {
        let method = method.to_string();
        self.configure(|s| {
            s.failures.insert(method, err);
        })
    }

    /// Fail only the contract recording send
    pub fn failing_record(self, err: ProviderRpcError) -> Self {
        self.configure(|s| s.record_failure = Some(err))
    }

    pub fn reverting(self) -> Self {
        self.configure(|s| s.revert = true)
    }

    pub fn with_record(self, record: TransferStruct) -> Self {
        self.configure(|s| s.records.push(record))
    }

    /// Answer every `eth_call` with this hex payload
    pub fn with_call_override(self, data: &str) -> Self {
        let data = data.to_string();
        self.configure(|s| s.call_override = Some(data))
    }

    /// Return `polls` empty receipts before the transaction is mined
    pub fn with_receipt_delay(self, polls: usize) -> Self {
        self.configure(|s| s.receipt_delay = polls)
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn sent(&self) -> Vec<Value> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn listeners(&self) -> usize {
        self.accounts_tx.receiver_count()
    }

    /// Simulate the user switching or disconnecting accounts in the wallet
    pub fn emit_accounts(&self, accounts: &[&str]) {
        let accounts: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        self.state.lock().unwrap().authorized = accounts.clone();
        let _ = self.accounts_tx.send(accounts);
    }
}

impl MockState {
    fn send(&mut self, params: Value) -> Result<Value, ProviderRpcError> {
        let tx = params.get(0).cloned().unwrap_or(Value::Null);
        self.sent.push(tx.clone());
        let hash = B256::with_last_byte(self.sent.len() as u8);

        let to = tx["to"].as_str().unwrap_or_default().to_lowercase();
        if to == CONTRACT.to_lowercase() {
            if let Some(err) = self.record_failure.clone() {
                return Err(err);
            }
            let data: Bytes = serde_json::from_value(tx["data"].clone())
                .map_err(|e| ProviderRpcError::new(codes::INVALID_PARAMS, e.to_string()))?;
            let call = Transactions::addToBlockchainCall::abi_decode(&data)
                .map_err(|e| ProviderRpcError::new(-32000, format!("execution reverted: {}", e)))?;
            let sender: Address = tx["from"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();

            self.records.push(TransferStruct {
                sender,
                receiver: call.receiver,
                amount: call.amount,
                message: call.message,
                timestamp: U256::from(BLOCK_TIME),
                keyword: call.keyword,
            });
        }

        Ok(json!(hash))
    }

    fn call(&self, params: Value) -> Result<Value, ProviderRpcError> {
        if let Some(ref data) = self.call_override {
            return Ok(json!(data));
        }

        let data: Bytes = serde_json::from_value(params[0]["data"].clone())
            .map_err(|e| ProviderRpcError::new(codes::INVALID_PARAMS, e.to_string()))?;
        let selector = data.get(..4).unwrap_or_default();

        let encoded = if selector == Transactions::getAllTransactionsCall::SELECTOR {
            Transactions::getAllTransactionsCall::abi_encode_returns(&self.records)
        } else if selector == Transactions::getTransactionCountCall::SELECTOR {
            Transactions::getTransactionCountCall::abi_encode_returns(&U256::from(
                self.records.len(),
            ))
        } else {
            return Err(ProviderRpcError::new(-32000, "execution reverted"));
        };

        Ok(json!(hex::encode_prefixed(encoded)))
    }

    fn receipt(&mut self, params: Value) -> Result<Value, ProviderRpcError> {
        if self.receipt_delay > 0 {
            self.receipt_delay -= 1;
            return Ok(Value::Null);
        }
        Ok(json!({
            "transactionHash": params[0],
            "blockNumber": "0x10",
            "status": if self.revert { "0x0" } else { "0x1" },
        }))
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(method.to_string());

        if let Some(err) = state.failures.get(method) {
            return Err(err.clone());
        }

        match method {
            methods::ETH_ACCOUNTS => Ok(json!(state.authorized)),
            methods::ETH_REQUEST_ACCOUNTS => {
                if state.reject_connect {
                    return Err(ProviderRpcError::user_rejected("User rejected the request."));
                }
                state.authorized = state.grant.clone();
                Ok(json!(state.authorized))
            }
            methods::ETH_SEND_TRANSACTION => state.send(params),
            methods::ETH_CALL => state.call(params),
            methods::ETH_GET_TRANSACTION_RECEIPT => state.receipt(params),
            other => Err(ProviderRpcError::new(
                codes::UNSUPPORTED_METHOD,
                format!("Unsupported method: {}", other),
            )),
        }
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>> {
        self.accounts_tx.subscribe()
    }
}
