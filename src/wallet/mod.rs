//! Local signing key management
//!
//! The private key lives only inside `SecureWallet`; providers built on top
//! of it see the address and an alloy `EthereumWallet`, never the raw key.

mod signer;

pub use signer::SecureWallet;
