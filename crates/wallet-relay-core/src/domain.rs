use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Sentinel `gasToken` value meaning the wallet reimburses relay gas in the
/// native chain currency rather than an ERC20.
pub const ETHER_TOKEN: Address = Address::ZERO;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// An intended wallet-contract call, before any signature is attached.
///
/// `from` is the wallet contract itself; `nonce` is the wallet's own
/// replay-protection counter, unrelated to the relay account's chain nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedMessage {
    pub gas_token: Address,
    pub operation_type: u8,
    pub to: Address,
    pub from: Address,
    pub nonce: u64,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub data: Bytes,
    pub value: U256,
}

/// One signer's submission: the unsigned message plus a 65-byte r||s||v
/// ECDSA signature over the message digest. Once the threshold is met the
/// queued copy carries every collected signature concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    #[serde(flatten)]
    pub message: UnsignedMessage,
    pub signature: Bytes,
}

/// Aggregation record for one message hash in the pending-signatures store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureTally {
    pub collected_signatures: Vec<Bytes>,
    pub required: u32,
}

impl SignatureTally {
    pub fn total_collected(&self) -> u32 {
        self.collected_signatures.len() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.total_collected() >= self.required
    }

    pub fn contains(&self, signature: &Bytes) -> bool {
        self.collected_signatures.iter().any(|s| s == signature)
    }
}

/// Client-facing view of a message's lifecycle, joined from the pending
/// tally and the queue entry. Field names follow the relay's JSON contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatus {
    pub message_hash: Option<B256>,
    pub error: Option<String>,
    pub collected_signatures: Vec<Bytes>,
    pub total_collected: u32,
    pub required: u32,
    pub transaction_hash: Option<B256>,
}

/// Execution status of a queued message. Terminal states are written once
/// and never flipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum QueueState {
    Pending,
    Succeeded { transaction_hash: B256 },
    Failed { reason: String },
}

impl QueueState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueueState::Pending)
    }
}

/// A message admitted for on-chain execution. Created and mutated only by
/// the queue store; insertion order is the execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    pub message_hash: B256,
    pub message: SignedMessage,
    pub enqueued_at: TimestampMs,
    pub state: QueueState,
}

/// A device's pending request to join a wallet's signer set. Keyed by
/// `(walletContractAddress, key)`; removed only by a verified cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAuthorisation {
    pub wallet_contract_address: Address,
    pub key: Address,
    pub device_info: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAuthorisationRequest {
    pub wallet_contract_address: Address,
    pub key: Address,
}

/// Canonical cancellation payload. The signature over its digest is carried
/// separately and is never part of the digested bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAuthorisationRequest {
    pub wallet_contract_address: Address,
    pub key: Address,
}

/// The chain transaction a queued message resolves to: an `executeSigned`
/// call against the wallet contract, paid for by the relay account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_price: U256,
    pub gas_limit: U256,
}

/// Confirmation result for a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction_hash: B256,
    pub success: bool,
}
