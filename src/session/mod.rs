//! Transaction session manager
//!
//! Holds everything presentation code renders (account, form, history,
//! in-flight flag, cached count, last error) and the operations that drive
//! it. Operations never return errors: failures land in `state.error` and the
//! session stays usable.
//!
//! State cycle: `Disconnected -> Connecting -> Connected -> Submitting -> Connected`.
//! An error is an overlay on whichever of those the session is in.

mod history;
mod state;

pub use history::decode_history;
pub use state::{
    ConnectionState, SessionError, SessionState, TransactionRecord, TransferField,
    TransferRequest,
};

use crate::gateway::{Gateway, TransferReceipt};
use crate::storage::{LocalStorage, TRANSACTION_COUNT_KEY};
use crate::units;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use std::str::FromStr;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

pub struct TransactionSession {
    gateway: Gateway,
    storage: LocalStorage,
    state: SessionState,
    accounts_rx: Option<broadcast::Receiver<Vec<String>>>,
}

impl TransactionSession {
    /// Create a session, seeding the transaction count from local storage
    pub fn new(gateway: Gateway, storage: LocalStorage) -> Self {
        let transaction_count = storage
            .get(TRANSACTION_COUNT_KEY)
            .and_then(|s| U256::from_str_radix(s, 10).ok())
            .unwrap_or(U256::ZERO);

        Self {
            gateway,
            storage,
            state: SessionState {
                transaction_count,
                ..SessionState::default()
            },
            accounts_rx: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut LocalStorage {
        &mut self.storage
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    fn record_error(&mut self, err: Error) {
        warn!(kind = ?err.kind(), error = %err, "Session error");
        self.state.error = Some(SessionError::from(&err));
    }

    fn set_account(&mut self, account: String) {
        info!(account = %account, "Wallet connected");
        self.state.account = account;
        self.state.connection = ConnectionState::Connected;
    }

    /// Session start: look for an already-authorized account without prompting
    ///
    /// When one is found the cached count and the history are refreshed.
    pub async fn initialize(&mut self) -> bool {
        info!("Initializing session");
        self.subscribe_account_changes();

        match self.gateway.list_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => self.set_account(account),
                None => {
                    self.record_error(Error::NoAuthorizedAccounts);
                    return false;
                }
            },
            Err(err) => {
                self.record_error(err);
                return false;
            }
        }

        self.refresh_count().await;
        self.refresh_history().await;
        true
    }

    /// Ask the wallet for access
    pub async fn connect(&mut self) -> bool {
        let previous = self.state.connection;
        self.state.connection = ConnectionState::Connecting;

        let outcome = self.gateway.request_account_access().await.and_then(|accounts| {
            accounts
                .into_iter()
                .next()
                .ok_or(Error::NoAuthorizedAccounts)
        });

        match outcome {
            Ok(account) => {
                self.set_account(account);
                self.clear_error();
                self.subscribe_account_changes();
                self.refresh_history().await;
                true
            }
            Err(err) => {
                self.state.connection = previous;
                self.record_error(err);
                false
            }
        }
    }

    pub fn set_field(&mut self, field: TransferField, value: impl Into<String>) {
        self.state.request.set(field, value.into());
    }

    /// Update a form field by name; unknown names are reported, not raised
    pub fn update_field(&mut self, name: &str, value: &str) -> bool {
        match name.parse::<TransferField>() {
            Ok(field) => {
                self.set_field(field, value);
                true
            }
            Err(err) => {
                self.record_error(err);
                false
            }
        }
    }

    pub fn set_request(&mut self, request: TransferRequest) {
        self.state.request = request;
    }

    fn validated_request(&self) -> Result<(Address, U256)> {
        let request = &self.state.request;
        if request.recipient.trim().is_empty() || request.amount.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Please provide recipient address and amount".to_string(),
            ));
        }

        let recipient = Address::from_str(request.recipient.trim()).map_err(|e| {
            Error::InvalidInput(format!(
                "Invalid recipient address '{}': {}",
                request.recipient, e
            ))
        })?;
        let amount = units::parse_ether(&request.amount)?;

        if !self.state.is_connected() {
            return Err(Error::NoAuthorizedAccounts);
        }

        Ok((recipient, amount))
    }

    /// Send the transfer in the form and record it on the contract
    ///
    /// Validation failures never reach the wallet. The form is cleared only
    /// on success; the in-flight flag is cleared on every path.
    pub async fn submit(&mut self) -> bool {
        let (recipient, amount) = match self.validated_request() {
            Ok(parsed) => parsed,
            Err(err) => {
                self.record_error(err);
                return false;
            }
        };

        let previous = self.state.connection;
        self.state.in_flight = true;
        self.state.connection = ConnectionState::Submitting;

        let outcome = self.execute_transfer(recipient, amount).await;

        self.state.in_flight = false;
        self.state.connection = previous;

        match outcome {
            Ok(receipt) => {
                info!(
                    hash = %receipt.hash,
                    block = ?receipt.block_number,
                    "Transfer confirmed"
                );
                self.state.request = TransferRequest::default();
                true
            }
            Err(err) => {
                self.record_error(err);
                false
            }
        }
    }

    async fn execute_transfer(&mut self, recipient: Address, amount: U256) -> Result<TransferReceipt> {
        let from = self.state.account.clone();
        let request = self.state.request.clone();

        let pending = self
            .gateway
            .submit_transfer(&from, recipient, amount, &request.message, &request.keyword)
            .await?;
        info!(hash = %pending.hash(), "Transfer submitted, waiting for confirmation");

        let receipt = pending.confirm().await?;
        self.clear_error();

        // The transfer is on-chain now; a failed re-read must not look like a failed send
        self.refresh_count().await;
        self.refresh_history().await;

        Ok(receipt)
    }

    /// Re-read the transaction count and write it through to local storage
    pub async fn refresh_count(&mut self) -> bool {
        match self.gateway.read_transaction_count().await {
            Ok(count) => {
                self.store_count(count).await;
                true
            }
            Err(err) => {
                self.record_error(Error::CountUnavailable(err.to_string()));
                false
            }
        }
    }

    async fn store_count(&mut self, count: U256) {
        debug!(count = %count, "Transaction count updated");
        self.state.transaction_count = count;
        if let Err(e) = self.storage.set(TRANSACTION_COUNT_KEY, count.to_string()).await {
            warn!(error = %e, "Failed to persist transaction count");
        }
    }

    /// Replace the history with a fresh read of the contract
    ///
    /// Undecodable records are dropped; a failed read leaves the old history
    /// in place and records an error.
    pub async fn refresh_history(&mut self) -> bool {
        match self.gateway.read_all_transactions().await {
            Ok(raw) => {
                let total = raw.len();
                self.state.history = decode_history(raw);
                debug!(total, decoded = self.state.history.len(), "Transaction history refreshed");
                self.clear_error();
                true
            }
            Err(err @ (Error::NoWalletInstalled | Error::ContractInit(_))) => {
                self.record_error(err);
                false
            }
            Err(err) => {
                self.record_error(Error::HistoryUnavailable(err.to_string()));
                false
            }
        }
    }

    /// Start listening for `accountsChanged`; a no-op when already listening
    pub fn subscribe_account_changes(&mut self) -> bool {
        if self.accounts_rx.is_some() {
            return true;
        }
        match self.gateway.resolve_provider() {
            Ok(provider) => {
                self.accounts_rx = Some(provider.subscribe_accounts());
                debug!("Account change listener registered");
                true
            }
            Err(_) => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.accounts_rx.is_some()
    }

    /// Wait for the next account notification
    ///
    /// Returns `None` when not subscribed or the wallet went away.
    pub async fn next_account_change(&mut self) -> Option<Vec<String>> {
        loop {
            let rx = self.accounts_rx.as_mut()?;
            match rx.recv().await {
                Ok(accounts) => return Some(accounts),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed account notifications");
                }
                Err(RecvError::Closed) => {
                    self.accounts_rx = None;
                    return None;
                }
            }
        }
    }

    /// Wait for and apply the next account notification
    pub async fn process_account_change(&mut self) -> bool {
        match self.next_account_change().await {
            Some(accounts) => {
                self.apply_account_change(accounts).await;
                true
            }
            None => false,
        }
    }

    pub async fn apply_account_change(&mut self, accounts: Vec<String>) {
        debug!(?accounts, "Accounts changed");
        match accounts.into_iter().next() {
            Some(account) => {
                self.set_account(account);
                self.refresh_history().await;
            }
            None => {
                info!("Wallet disconnected");
                self.state.account.clear();
                self.state.history.clear();
                self.state.connection = ConnectionState::Disconnected;
            }
        }
    }

    /// Drop the account listener
    pub fn teardown(&mut self) {
        if self.accounts_rx.take().is_some() {
            debug!("Account change listener removed");
        }
    }
}
