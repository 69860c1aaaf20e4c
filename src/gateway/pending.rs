//! Pending transfer confirmation

use crate::provider::{methods, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::B256;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Receipt summary for a confirmed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub hash: B256,
    pub block_number: Option<u64>,
}

/// A recorded transfer waiting to be mined
pub struct PendingTransfer {
    hash: B256,
    provider: Arc<dyn WalletProvider>,
    poll_interval: Duration,
}

impl PendingTransfer {
    pub(crate) fn new(hash: B256, provider: Arc<dyn WalletProvider>, poll_interval: Duration) -> Self {
        Self {
            hash,
            provider,
            poll_interval,
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Poll for the receipt until the transaction is mined
    ///
    /// There is no timeout here; the wallet or node decides when to give up.
    pub async fn confirm(self) -> Result<TransferReceipt> {
        let mut polls = 0u64;
        loop {
            let raw = self
                .provider
                .request(methods::ETH_GET_TRANSACTION_RECEIPT, json!([self.hash]))
                .await
                .map_err(|e| Error::TransferFailed(e.message))?;

            if !raw.is_null() {
                tracing::debug!(hash = %self.hash, polls, "Receipt available");
                return parse_receipt(self.hash, &raw);
            }

            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn parse_receipt(hash: B256, raw: &Value) -> Result<TransferReceipt> {
    let block_number = raw
        .get("blockNumber")
        .and_then(Value::as_str)
        .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok());

    // Pre-Byzantium receipts carry no status field
    match raw.get("status").and_then(Value::as_str) {
        None | Some("0x1") => Ok(TransferReceipt { hash, block_number }),
        Some(status) => Err(Error::TransferFailed(format!(
            "transaction {} reverted (status {})",
            hash, status
        ))),
    }
}
