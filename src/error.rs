//! Error types for the transfer dapp

use crate::provider::ProviderRpcError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which wallet prompt the user turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Connection,
    Transaction,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Connection => write!(
                f,
                "Connection request was denied. Please approve the connection request in your wallet."
            ),
            Rejection::Transaction => write!(f, "Transaction was rejected by user."),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("No wallet provider detected. Install a wallet to use this application.")]
    NoWalletInstalled,

    #[error("Failed to initialize contract connection: {0}")]
    ContractInit(String),

    #[error("{0}")]
    UserDenied(Rejection),

    #[error("No authorized accounts found. Please connect your wallet.")]
    NoAuthorizedAccounts,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Transaction failed: {0}")]
    TransferFailed(String),

    #[error("Failed to decode transaction record: {0}")]
    Decode(String),

    #[error("Failed to fetch transactions: {0}")]
    HistoryUnavailable(String),

    #[error("Failed to verify transaction history: {0}")]
    CountUnavailable(String),

    #[error("Failed to update form field: {0}")]
    FieldUpdate(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Wallet request failed: {0}")]
    Provider(#[from] ProviderRpcError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], kept alongside the message in session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoWalletInstalled,
    ContractInit,
    UserDenied,
    NoAuthorizedAccounts,
    InvalidInput,
    TransferFailed,
    Decode,
    HistoryUnavailable,
    CountUnavailable,
    FieldUpdate,
    Wallet,
    Contract,
    Config,
    Storage,
    /// Malformed JSON from the wallet or a config file
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoWalletInstalled => ErrorKind::NoWalletInstalled,
            Error::ContractInit(_) => ErrorKind::ContractInit,
            Error::UserDenied(_) => ErrorKind::UserDenied,
            Error::NoAuthorizedAccounts => ErrorKind::NoAuthorizedAccounts,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::TransferFailed(_) => ErrorKind::TransferFailed,
            Error::Decode(_) => ErrorKind::Decode,
            Error::HistoryUnavailable(_) => ErrorKind::HistoryUnavailable,
            Error::CountUnavailable(_) => ErrorKind::CountUnavailable,
            Error::FieldUpdate(_) => ErrorKind::FieldUpdate,
            Error::Wallet(_) | Error::Provider(_) => ErrorKind::Wallet,
            Error::Contract(_) => ErrorKind::Contract,
            Error::Config(_) => ErrorKind::Config,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Json(_) => ErrorKind::Internal,
        }
    }
}
