//! Configuration for the transfer dapp

pub mod rpc;

use crate::provider::Approval;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Environment variable overriding the contract address
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";

/// Environment variable holding the signing key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// First contract deployed by the default Hardhat account on a fresh local node
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Gas for a plain value transfer (0x5208)
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Local Hardhat node
    #[default]
    Localhost,
    Sepolia,
    /// Polygon zkEVM Cardona testnet
    Cardona,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Localhost => rpc::chains::LOCALHOST,
            Network::Sepolia => rpc::chains::SEPOLIA,
            Network::Cardona => rpc::chains::CARDONA,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Localhost => "localhost",
            Network::Sepolia => "sepolia",
            Network::Cardona => "cardona",
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "localhost" | "hardhat" => Ok(Network::Localhost),
            "sepolia" => Ok(Network::Sepolia),
            "cardona" | "polygon-zkevm-cardona" => Ok(Network::Cardona),
            other => Err(Error::Config(format!("Unknown network: {}", other))),
        }
    }
}

/// Where the Transactions contract lives and how transfers are sent to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractSettings {
    /// Deployment address of the Transactions contract
    pub address: String,
    /// Gas limit attached to the native value transfer
    pub transfer_gas_limit: u64,
    /// Delay between receipt polls while waiting for confirmation (milliseconds)
    pub receipt_poll_interval_ms: u64,
}

impl ContractSettings {
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            transfer_gas_limit: NATIVE_TRANSFER_GAS,
            receipt_poll_interval_ms: 1_000,
        }
    }
}

/// Local wallet settings for the CLI shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// How wallet prompts are answered
    pub approval: Approval,
    /// Environment variable holding the hex private key
    pub private_key_env: String,
    /// How often `watch` re-reads the stored authorization (milliseconds)
    pub watch_poll_interval_ms: u64,
}

impl WalletSettings {
    pub fn watch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch_poll_interval_ms)
    }
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            approval: Approval::Prompt,
            private_key_env: PRIVATE_KEY_ENV.to_string(),
            watch_poll_interval_ms: 1_000,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network the contract is deployed on
    pub network: Network,
    /// Explicit RPC URL (otherwise resolved from the environment)
    pub rpc_url: Option<String>,
    /// Contract settings
    pub contract: ContractSettings,
    /// Wallet settings
    pub wallet: WalletSettings,
    /// Path of the local storage file
    pub storage_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: None,
            contract: ContractSettings::default(),
            wallet: WalletSettings::default(),
            storage_path: Some(".txdapp/storage.json".to_string()),
        }
    }
}

impl Config {
    /// Load from a JSON file, or use defaults, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::Config(e.to_string()))?;
                serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
            }
            None => Config::default(),
        };
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(address) = std::env::var(CONTRACT_ADDRESS_ENV) {
            tracing::debug!("Using CONTRACT_ADDRESS for the Transactions contract");
            self.contract.address = address;
        }
        self
    }

    /// RPC URL for the configured network
    pub fn resolve_rpc_url(&self) -> Result<String> {
        if let Some(ref url) = self.rpc_url {
            return Ok(url.clone());
        }
        RpcConfig::from_env()
            .get(self.network.chain_id())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Config(format!("No RPC URL configured for {}", self.network.name()))
            })
    }
}
