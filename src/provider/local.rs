//! Local-key wallet provider
//!
//! Plays the role of an injected browser wallet for the CLI shell: it owns a
//! signing key, asks for approval before exposing accounts or sending
//! transactions, and forwards everything else to a JSON-RPC endpoint.
//!
//! SECURITY NOTE:
//! - The key stays inside `SecureWallet`; only the address is ever returned
//! - Nothing is signed until the approval policy says yes

use super::{codes, methods, ProviderRpcError, WalletProvider};
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// How wallet prompts are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approval {
    /// Approve every prompt without asking
    Always,
    /// Refuse every prompt (answers with code 4001)
    Never,
    /// Ask on the terminal
    #[default]
    Prompt,
}

/// Wallet provider backed by a local key and an HTTP JSON-RPC endpoint
pub struct LocalKeyProvider {
    wallet: SecureWallet,
    rpc: DynProvider,
    approval: Approval,
    authorized: AtomicBool,
    accounts_tx: broadcast::Sender<Vec<String>>,
}

impl LocalKeyProvider {
    /// Create a provider for `wallet` talking to `rpc_url`
    pub fn connect(wallet: SecureWallet, rpc_url: &str, approval: Approval) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;

        let rpc = ProviderBuilder::new()
            .wallet(wallet.wallet().clone())
            .connect_http(url)
            .erased();

        Ok(Self::with_rpc(wallet, rpc, approval))
    }

    /// Create a provider over an already-built signing RPC client
    pub(crate) fn with_rpc(wallet: SecureWallet, rpc: DynProvider, approval: Approval) -> Self {
        let (accounts_tx, _) = broadcast::channel(16);

        Self {
            wallet,
            rpc,
            approval,
            authorized: AtomicBool::new(false),
            accounts_tx,
        }
    }

    /// Start out with the account already authorized (remembered from an earlier run)
    pub fn with_authorized(self, authorized: bool) -> Self {
        self.authorized.store(authorized, Ordering::SeqCst);
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Withdraw the authorization and notify listeners with an empty account list
    pub fn revoke(&self) -> bool {
        let revoked = self.authorized.swap(false, Ordering::SeqCst);
        if revoked {
            tracing::info!(account = %self.wallet.account_id(), "Wallet authorization revoked");
            let _ = self.accounts_tx.send(Vec::new());
        }
        revoked
    }

    /// Authorize the account without prompting and notify listeners
    pub fn grant(&self) -> bool {
        let granted = !self.authorized.swap(true, Ordering::SeqCst);
        if granted {
            tracing::info!(account = %self.wallet.account_id(), "Wallet authorization granted");
            let _ = self.accounts_tx.send(self.accounts());
        }
        granted
    }

    /// Follow an authorization decision made elsewhere (another process, a stored flag)
    ///
    /// Returns true when the state changed and listeners were notified.
    pub fn sync_authorization(&self, authorized: bool) -> bool {
        if authorized {
            self.grant()
        } else {
            self.revoke()
        }
    }

    fn accounts(&self) -> Vec<String> {
        if self.is_authorized() {
            vec![self.wallet.account_id()]
        } else {
            Vec::new()
        }
    }

    async fn approve(&self, prompt: String) -> bool {
        match self.approval {
            Approval::Always => true,
            Approval::Never => false,
            Approval::Prompt => tokio::task::spawn_blocking(move || {
                eprint!("{} [y/N] ", prompt);
                let _ = std::io::stderr().flush();
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .map(|_| matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
                    .unwrap_or(false)
            })
            .await
            .unwrap_or(false),
        }
    }

    async fn request_accounts(&self) -> std::result::Result<Value, ProviderRpcError> {
        if !self.is_authorized() {
            let prompt = format!("Connect account {} to this application?", self.wallet.address());
            if !self.approve(prompt).await {
                return Err(ProviderRpcError::user_rejected("User rejected the request."));
            }
            self.grant();
        }
        Ok(json!(self.accounts()))
    }

    async fn send_transaction(&self, params: Value) -> std::result::Result<Value, ProviderRpcError> {
        if !self.is_authorized() {
            return Err(ProviderRpcError::unauthorized(
                "The requested account has not been authorized by the user.",
            ));
        }

        let tx_object = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderRpcError::new(codes::INVALID_PARAMS, "Missing transaction object"))?;
        let tx: TransactionRequest = serde_json::from_value(tx_object)
            .map_err(|e| ProviderRpcError::new(codes::INVALID_PARAMS, e.to_string()))?;

        if let Some(from) = tx.from {
            if from != self.wallet.address() {
                return Err(ProviderRpcError::unauthorized(format!(
                    "Account {} is not managed by this wallet",
                    from
                )));
            }
        }

        let prompt = format!(
            "Send transaction to {} with value {} wei?",
            tx.to
                .and_then(|kind| kind.to().copied())
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "<contract creation>".to_string()),
            tx.value.unwrap_or_default()
        );
        if !self.approve(prompt).await {
            return Err(ProviderRpcError::user_rejected("User denied transaction signature."));
        }

        let pending = self.rpc.send_transaction(tx).await.map_err(rpc_error)?;
        let hash = *pending.tx_hash();
        tracing::info!(%hash, "Transaction broadcast");
        Ok(json!(hash))
    }
}

#[async_trait]
impl WalletProvider for LocalKeyProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderRpcError> {
        tracing::debug!(method, "Wallet request");
        match method {
            methods::ETH_ACCOUNTS => Ok(json!(self.accounts())),
            methods::ETH_REQUEST_ACCOUNTS => self.request_accounts().await,
            methods::ETH_SEND_TRANSACTION => self.send_transaction(params).await,
            _ => self
                .rpc
                .raw_request::<_, Value>(Cow::Owned(method.to_string()), params)
                .await
                .map_err(rpc_error),
        }
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>> {
        self.accounts_tx.subscribe()
    }
}

impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyProvider")
            .field("wallet", &self.wallet)
            .field("approval", &self.approval)
            .field("authorized", &self.is_authorized())
            .finish()
    }
}

/// Keep the JSON-RPC error code when the node returned one
fn rpc_error(err: TransportError) -> ProviderRpcError {
    match err.as_error_resp() {
        Some(payload) => ProviderRpcError::new(payload.code, payload.message.to_string()),
        None => ProviderRpcError::internal(err.to_string()),
    }
}
