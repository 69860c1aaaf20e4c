//! Wallet provider boundary
//!
//! Models an EIP-1193 provider: a single `request(method, params)` entry point
//! plus an `accountsChanged` notification stream. The session layer never
//! talks to a chain directly, only through a provider handed to it by the
//! application shell.

mod local;
#[cfg(test)]
pub(crate) mod mock;

pub use local::{Approval, LocalKeyProvider};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// JSON-RPC method names used by this crate
pub mod methods {
    pub const ETH_ACCOUNTS: &str = "eth_accounts";
    pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const ETH_CALL: &str = "eth_call";
    pub const ETH_GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// EIP-1193 provider error codes
pub mod codes {
    pub const USER_REJECTED_REQUEST: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Error returned by a wallet provider request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(codes::USER_REJECTED_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(codes::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    /// True when the user dismissed the wallet prompt
    pub fn is_user_rejection(&self) -> bool {
        self.code == codes::USER_REJECTED_REQUEST
    }
}

/// Injected wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issue a JSON-RPC request through the wallet
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    /// Register for `accountsChanged` notifications
    ///
    /// Dropping the receiver unregisters the listener.
    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>>;
}
