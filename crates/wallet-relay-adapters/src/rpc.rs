//! Blocking JSON-RPC implementation of the chain boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{hex, keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use wallet_relay_core::contracts::{Erc20, WalletContract};
use wallet_relay_core::domain::{TransactionOutcome, TransactionRequest};
use wallet_relay_core::ports::BlockchainPort;
use wallet_relay_core::RelayError;

/// Transport failures and node-reported errors are distinct: the executor
/// treats the former as retryable infrastructure trouble and the latter as
/// a terminal rejection of the submitted transaction.
enum RpcError {
    Transport(String),
    Node(String),
}

impl RpcError {
    fn into_chain(self) -> RelayError {
        match self {
            RpcError::Transport(e) => RelayError::Chain(format!("transport: {e}")),
            RpcError::Node(e) => RelayError::Chain(format!("node: {e}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBlockchain {
    url: String,
    client: reqwest::blocking::Client,
    ids: Arc<AtomicU64>,
    receipt_poll_interval: Duration,
    receipt_poll_attempts: u32,
}

impl HttpBlockchain {
    pub fn new(url: impl Into<String>) -> Result<Self, RelayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RelayError::Chain(format!("failed to build http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            ids: Arc::new(AtomicU64::new(1)),
            receipt_poll_interval: Duration::from_secs(1),
            receipt_poll_attempts: 120,
        })
    }

    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_poll_attempts = attempts;
        self
    }

    fn execute<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, RpcError> {
        let id = self.ids.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response: Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .json()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if let Some(error) = response.get("error") {
            return Err(RpcError::Node(error.to_string()));
        }
        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Transport("response carries no result".to_owned()))?;
        serde_json::from_value(result).map_err(|e| RpcError::Transport(e.to_string()))
    }

    fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let raw: String = self.execute(
            "eth_call",
            json!([{"to": to, "data": format!("0x{}", hex::encode(data))}, "latest"]),
        )?;
        hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| RpcError::Transport(format!("undecodable eth_call result: {e}")))
    }
}

impl BlockchainPort for HttpBlockchain {
    fn code_hash(&self, address: Address) -> Result<B256, RelayError> {
        let code: String = self
            .execute("eth_getCode", json!([address, "latest"]))
            .map_err(RpcError::into_chain)?;
        let bytes = hex::decode(code.trim_start_matches("0x"))
            .map_err(|e| RelayError::Chain(format!("undecodable bytecode: {e}")))?;
        Ok(keccak256(bytes))
    }

    fn balance(&self, address: Address) -> Result<U256, RelayError> {
        self.execute("eth_getBalance", json!([address, "latest"]))
            .map_err(RpcError::into_chain)
    }

    fn token_balance(&self, token: Address, holder: Address) -> Result<U256, RelayError> {
        let data = Erc20::balanceOfCall { owner: holder }.abi_encode();
        let returned = self.eth_call(token, data).map_err(RpcError::into_chain)?;
        let decoded = Erc20::balanceOfCall::abi_decode_returns(&returned, true)
            .map_err(|e| RelayError::Chain(format!("undecodable balanceOf return: {e}")))?;
        Ok(decoded._0)
    }

    fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, RelayError> {
        self.execute(
            "eth_estimateGas",
            json!([{
                "to": request.to,
                "value": format!("{:#x}", request.value),
                "data": format!("{}", request.data),
                "gasPrice": format!("{:#x}", request.gas_price),
            }]),
        )
        .map_err(RpcError::into_chain)
    }

    fn required_signatures(&self, wallet: Address) -> Result<u32, RelayError> {
        let data = WalletContract::requiredSignaturesCall {}.abi_encode();
        let returned = self.eth_call(wallet, data).map_err(RpcError::into_chain)?;
        let decoded = WalletContract::requiredSignaturesCall::abi_decode_returns(&returned, true)
            .map_err(|e| RelayError::Chain(format!("undecodable requiredSignatures: {e}")))?;
        decoded
            ._0
            .try_into()
            .map_err(|_| RelayError::Chain("requiredSignatures out of range".to_owned()))
    }

    fn key_exist(&self, wallet: Address, key: Address) -> Result<bool, RelayError> {
        let data = WalletContract::keyExistCall { key }.abi_encode();
        let returned = self.eth_call(wallet, data).map_err(RpcError::into_chain)?;
        let decoded = WalletContract::keyExistCall::abi_decode_returns(&returned, true)
            .map_err(|e| RelayError::Chain(format!("undecodable keyExist return: {e}")))?;
        Ok(decoded._0)
    }

    fn transaction_count(&self, address: Address) -> Result<u64, RelayError> {
        let count: U256 = self
            .execute("eth_getTransactionCount", json!([address, "latest"]))
            .map_err(RpcError::into_chain)?;
        count
            .try_into()
            .map_err(|_| RelayError::Chain("transaction count out of range".to_owned()))
    }

    fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RelayError> {
        match self.execute("eth_sendRawTransaction", json!([format!("{raw}")])) {
            Ok(hash) => Ok(hash),
            // The node accepted the request but refused the transaction.
            Err(RpcError::Node(reason)) => Err(RelayError::ExecutionFailure(reason)),
            Err(transport) => Err(transport.into_chain()),
        }
    }

    fn wait_for_receipt(&self, transaction_hash: B256) -> Result<TransactionOutcome, RelayError> {
        for _ in 0..self.receipt_poll_attempts {
            let receipt: Value = self
                .execute("eth_getTransactionReceipt", json!([transaction_hash]))
                .map_err(RpcError::into_chain)?;
            if receipt.is_null() {
                std::thread::sleep(self.receipt_poll_interval);
                continue;
            }
            let success = receipt
                .get("status")
                .and_then(|s| s.as_str())
                .map(|s| s == "0x1")
                .unwrap_or(false);
            return Ok(TransactionOutcome {
                transaction_hash,
                success,
            });
        }
        Err(RelayError::Chain(format!(
            "transaction {transaction_hash} not mined within the polling window"
        )))
    }

    fn is_valid_signature(
        &self,
        wallet: Address,
        digest: B256,
        signature: &Bytes,
    ) -> Result<bool, RelayError> {
        let data = WalletContract::isValidSignatureCall {
            hash: digest,
            signature: signature.clone(),
        }
        .abi_encode();
        match self.eth_call(wallet, data) {
            Ok(returned) => WalletContract::isValidSignatureCall::abi_decode_returns(&returned, true)
                .map(|decoded| decoded._0)
                .map_err(|e| RelayError::Chain(format!("undecodable isValidSignature: {e}"))),
            // A wallet that reverts the check is rejecting the signature.
            Err(RpcError::Node(_)) => Ok(false),
            Err(transport) => Err(transport.into_chain()),
        }
    }
}
