//! Wallet/contract gateway
//!
//! Thin wrapper over the injected wallet provider and the Transactions
//! contract. Every operation may hit the wallet or the network; none of the
//! writes are idempotent on-chain, resubmitting creates a new transaction.

mod contract;
mod pending;

pub use contract::{Transactions, TransactionsContract, TransferStruct};
pub use pending::{PendingTransfer, TransferReceipt};

use crate::config::ContractSettings;
use crate::error::Rejection;
use crate::provider::{methods, ProviderRpcError, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

pub struct Gateway {
    provider: Option<Arc<dyn WalletProvider>>,
    settings: ContractSettings,
}

impl Gateway {
    /// Create a gateway over the injected provider (`None` when no wallet is installed)
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, settings: ContractSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ContractSettings {
        &self.settings
    }

    /// The injected wallet, if there is one
    pub fn resolve_provider(&self) -> Result<Arc<dyn WalletProvider>> {
        self.provider.clone().ok_or_else(|| {
            tracing::error!("Wallet provider not found");
            Error::NoWalletInstalled
        })
    }

    /// Bind the fixed contract address to the wallet provider
    pub fn build_contract_handle(&self) -> Result<TransactionsContract> {
        let provider = self
            .resolve_provider()
            .map_err(|e| Error::ContractInit(e.to_string()))?;

        let address = Address::from_str(self.settings.address.trim()).map_err(|e| {
            Error::ContractInit(format!(
                "invalid contract address '{}': {}",
                self.settings.address, e
            ))
        })?;

        tracing::debug!(contract = %address, "Contract handle initialized");
        Ok(TransactionsContract::new(address, provider))
    }

    /// Accounts the wallet has already authorized (no prompt)
    pub async fn list_accounts(&self) -> Result<Vec<String>> {
        let provider = self.resolve_provider()?;
        let raw = provider
            .request(methods::ETH_ACCOUNTS, json!([]))
            .await
            .map_err(|e| Error::Wallet(format!("Failed to access your wallet: {}", e.message)))?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Prompt the user to authorize accounts
    pub async fn request_account_access(&self) -> Result<Vec<String>> {
        let provider = self.resolve_provider()?;
        let raw = provider
            .request(methods::ETH_REQUEST_ACCOUNTS, json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    Error::UserDenied(Rejection::Connection)
                } else {
                    Error::Provider(e)
                }
            })?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Every recorded transfer, undecoded
    pub async fn read_all_transactions(&self) -> Result<Vec<TransferStruct>> {
        self.resolve_provider()?;
        self.build_contract_handle()?.get_all_transactions().await
    }

    pub async fn read_transaction_count(&self) -> Result<U256> {
        self.resolve_provider()?;
        self.build_contract_handle()?.get_transaction_count().await
    }

    /// Send `amount` wei to `recipient`, then record the transfer on the contract
    ///
    /// The returned handle tracks the contract call; the native transfer is
    /// not awaited separately.
    pub async fn submit_transfer(
        &self,
        from: &str,
        recipient: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> Result<PendingTransfer> {
        let provider = self.resolve_provider()?;
        let contract = self.build_contract_handle()?;

        tracing::info!(
            from,
            to = %recipient,
            amount = %amount,
            "Sending native transfer"
        );
        let params = json!([{
            "from": from,
            "to": recipient,
            "gas": format!("{:#x}", self.settings.transfer_gas_limit),
            "value": format!("0x{:x}", amount),
        }]);
        let transfer_hash = provider
            .request(methods::ETH_SEND_TRANSACTION, params)
            .await
            .map_err(transfer_error)?;

        tracing::info!(
            transfer_hash = transfer_hash.as_str().unwrap_or_default(),
            "Native transfer sent, recording on contract"
        );
        let hash = contract
            .add_to_blockchain(from, recipient, amount, message, keyword)
            .await
            .map_err(transfer_error)?;

        Ok(PendingTransfer::new(
            hash,
            provider,
            self.settings.receipt_poll_interval(),
        ))
    }
}

/// Tell a dismissed wallet prompt apart from everything else
fn transfer_error(err: ProviderRpcError) -> Error {
    if err.is_user_rejection() {
        Error::UserDenied(Rejection::Transaction)
    } else {
        Error::TransferFailed(err.message)
    }
}
