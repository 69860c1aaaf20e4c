//! RPC endpoint configuration
//!
//! Supports the usual Ethereum ecosystem conventions:
//! 1. Per-network env vars (CARDONA_RPC_URL, SEPOLIA_RPC_URL, ...) - highest priority
//! 2. ALCHEMY_API_KEY - builds URLs for the hosted networks
//! 3. Public RPC fallbacks - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Per-network URL
//! export CARDONA_RPC_URL="https://polygonzkevm-cardona.g.alchemy.com/v2/YOUR_KEY"
//!
//! # Option 2: Single provider API key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//!
//! # Option 3: No env vars - local node plus public RPCs (rate limited)
//! ```

use std::collections::HashMap;

/// RPC configuration for multiple chains
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

/// Chain ID constants
pub mod chains {
    pub const LOCALHOST: u64 = 31337;
    pub const SEPOLIA: u64 = 11155111;
    pub const CARDONA: u64 = 2442;
}

/// Environment variable names
mod env_vars {
    pub const LOCALHOST_RPC_URL: &str = "LOCALHOST_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";
    pub const CARDONA_RPC_URL: &str = "CARDONA_RPC_URL";

    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const LOCALHOST: &str = "http://127.0.0.1:8545";
    pub const SEPOLIA: &str = "https://rpc.sepolia.org";
    pub const CARDONA: &str = "https://rpc.cardona.zkevm-rpc.com";
}

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        for (chain, var) in [
            (chains::LOCALHOST, env_vars::LOCALHOST_RPC_URL),
            (chains::SEPOLIA, env_vars::SEPOLIA_RPC_URL),
            (chains::CARDONA, env_vars::CARDONA_RPC_URL),
        ] {
            if let Ok(url) = std::env::var(var) {
                tracing::debug!(chain_id = chain, "Using {}", var);
                urls.insert(chain, url);
            }
        }

        if let Ok(key) = std::env::var(env_vars::ALCHEMY_API_KEY) {
            tracing::info!("Building RPC URLs from ALCHEMY_API_KEY");
            urls.entry(chains::SEPOLIA)
                .or_insert_with(|| format!("https://eth-sepolia.g.alchemy.com/v2/{}", key));
            urls.entry(chains::CARDONA).or_insert_with(|| {
                format!("https://polygonzkevm-cardona.g.alchemy.com/v2/{}", key)
            });
        }

        if !urls.contains_key(&chains::CARDONA) {
            tracing::debug!("No RPC configured for Cardona, using public RPC (rate limited)");
        }
        urls.entry(chains::LOCALHOST)
            .or_insert_with(|| public_rpcs::LOCALHOST.to_string());
        urls.entry(chains::SEPOLIA)
            .or_insert_with(|| public_rpcs::SEPOLIA.to_string());
        urls.entry(chains::CARDONA)
            .or_insert_with(|| public_rpcs::CARDONA.to_string());

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    /// Check if a chain is configured
    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_all_chains() {
        let config = RpcConfig::from_env();

        assert!(config.has_chain(chains::LOCALHOST));
        assert!(config.has_chain(chains::SEPOLIA));
        assert!(config.has_chain(chains::CARDONA));
    }

    #[test]
    fn test_get_returns_url() {
        let mut urls = HashMap::new();
        urls.insert(chains::CARDONA, "https://custom.rpc".to_string());
        let config = RpcConfig::with_urls(urls);

        assert_eq!(config.get(chains::CARDONA), Some("https://custom.rpc"));
        assert_eq!(config.get(999), None);
    }
}
