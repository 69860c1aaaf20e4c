//! Transfer dapp
//!
//! Client for a deployed `Transactions` contract that records ether
//! transfers. A wallet is connected through an EIP-1193 style provider,
//! a native transfer is sent to the recipient and then recorded on the
//! contract, and the recorded history is read back for display.
//!
//! # Layers
//!
//! - [`gateway`]: the wallet provider plus the contract, one call per operation
//! - [`session`]: state presentation code renders, driven by user actions
//! - [`storage`]: small durable key/value store (cached transaction count)
//!
//! Private keys never leave the [`wallet`] module.

pub mod config;
pub mod gateway;
pub mod provider;
pub mod session;
pub mod storage;
pub mod units;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, Network, RpcConfig};
pub use error::{Error, ErrorKind, Rejection, Result};
pub use gateway::Gateway;
pub use session::{SessionState, TransactionSession};
pub use storage::LocalStorage;
