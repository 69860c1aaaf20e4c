//! Transactions contract binding
//!
//! Calls are ABI-encoded with alloy's `sol!` bindings and routed through the
//! wallet provider (`eth_call` for views, `eth_sendTransaction` for writes),
//! so every contract interaction goes through the same injected wallet.

use crate::provider::{methods, ProviderRpcError, WalletProvider};
use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde_json::json;
use std::sync::Arc;

sol! {
    /// A transfer as stored by the contract
    #[derive(Debug, PartialEq, Eq)]
    struct TransferStruct {
        address sender;
        address receiver;
        uint256 amount;
        string message;
        uint256 timestamp;
        string keyword;
    }

    interface Transactions {
        function addToBlockchain(address receiver, uint256 amount, string memory message, string memory keyword) external;
        function getAllTransactions() external view returns (TransferStruct[] memory);
        function getTransactionCount() external view returns (uint256);
    }
}

/// Handle to the deployed Transactions contract, bound to the wallet provider
#[derive(Clone)]
pub struct TransactionsContract {
    address: Address,
    provider: Arc<dyn WalletProvider>,
}

impl TransactionsContract {
    pub(crate) fn new(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Run a view function through `eth_call` and decode its return value
    pub async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let params = json!([
            { "to": self.address, "data": hex::encode_prefixed(call.abi_encode()) },
            "latest"
        ]);
        let raw = self.provider.request(methods::ETH_CALL, params).await?;
        let data: Bytes = serde_json::from_value(raw)?;

        C::abi_decode_returns(&data)
            .map_err(|e| Error::Contract(format!("{}: {}", C::SIGNATURE, e)))
    }

    /// Send a state-changing call from `from`, returning the transaction hash
    pub async fn send<C: SolCall>(
        &self,
        from: &str,
        call: C,
    ) -> std::result::Result<B256, ProviderRpcError> {
        let params = json!([{
            "from": from,
            "to": self.address,
            "data": hex::encode_prefixed(call.abi_encode()),
        }]);
        let raw = self
            .provider
            .request(methods::ETH_SEND_TRANSACTION, params)
            .await?;

        serde_json::from_value(raw)
            .map_err(|e| ProviderRpcError::internal(format!("Invalid transaction hash: {}", e)))
    }

    pub async fn get_all_transactions(&self) -> Result<Vec<TransferStruct>> {
        self.call(Transactions::getAllTransactionsCall {}).await
    }

    pub async fn get_transaction_count(&self) -> Result<U256> {
        self.call(Transactions::getTransactionCountCall {}).await
    }

    pub async fn add_to_blockchain(
        &self,
        from: &str,
        receiver: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> std::result::Result<B256, ProviderRpcError> {
        self.send(
            from,
            Transactions::addToBlockchainCall {
                receiver,
                amount,
                message: message.to_string(),
                keyword: keyword.to_string(),
            },
        )
        .await
    }
}

impl std::fmt::Debug for TransactionsContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsContract")
            .field("address", &self.address)
            .finish()
    }
}
