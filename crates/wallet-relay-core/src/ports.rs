use alloy::primitives::{Address, Bytes, B256, U256};

use crate::domain::{
    PendingAuthorisation, QueuedMessage, SignatureTally, SignedMessage, TransactionOutcome,
    TransactionRequest,
};
use crate::error::RelayError;

/// Per-message-hash aggregation of collected signatures.
///
/// `add_signature` must be atomic per hash: two signatures for the same
/// message arriving concurrently are both kept. A duplicate signature is a
/// no-op returning the unchanged tally; a distinct signature past an
/// already-met threshold fails with `TooManySignatures`.
pub trait PendingSignatureStore {
    fn add_signature(
        &self,
        message_hash: B256,
        signature: &Bytes,
        required: u32,
    ) -> Result<SignatureTally, RelayError>;

    fn get(&self, message_hash: B256) -> Result<Option<SignatureTally>, RelayError>;
}

/// Durable, hash-keyed, insertion-ordered backlog of messages ready for
/// execution. `get_next` is a peek, not a pop: an entry only leaves the
/// backlog through one of the terminal marks.
pub trait MessageQueueStore {
    /// Idempotent insert keyed by the message hash; re-adding an existing
    /// hash returns it unchanged.
    fn add(&self, message: &SignedMessage) -> Result<B256, RelayError>;

    fn get(&self, message_hash: B256) -> Result<Option<QueuedMessage>, RelayError>;

    /// Oldest entry that is neither succeeded nor failed; `None` when the
    /// backlog is empty.
    fn get_next(&self) -> Result<Option<QueuedMessage>, RelayError>;

    /// One-shot terminal write; never overwrites an existing terminal state.
    fn mark_as_success(&self, message_hash: B256, transaction_hash: B256)
        -> Result<(), RelayError>;

    /// One-shot terminal write; never overwrites an existing terminal state.
    fn mark_as_error(&self, message_hash: B256, reason: &str) -> Result<(), RelayError>;
}

/// Pending device-authorisation requests, keyed by `(wallet, key)`.
pub trait AuthorisationStore {
    /// Upsert: a device may legitimately re-request over a stale entry.
    /// Returns the record's identifier, stable across upserts of the same
    /// `(wallet, key)` pair.
    fn add_request(&self, request: &PendingAuthorisation) -> Result<u64, RelayError>;

    /// All pending requests for the wallet, in insertion order.
    fn get_pending_authorisations(
        &self,
        wallet: Address,
    ) -> Result<Vec<PendingAuthorisation>, RelayError>;

    /// Removing an absent record is a no-op, not an error.
    fn remove_request(&self, wallet: Address, key: Address) -> Result<(), RelayError>;
}

/// The opaque network collaborator behind every on-chain question the relay
/// asks. Transport failures surface as `RelayError::Chain`; a node that
/// accepts the request but rejects the transaction itself surfaces as
/// `RelayError::ExecutionFailure`.
pub trait BlockchainPort {
    /// keccak256 of the bytecode deployed at `address`.
    fn code_hash(&self, address: Address) -> Result<B256, RelayError>;

    fn balance(&self, address: Address) -> Result<U256, RelayError>;

    fn token_balance(&self, token: Address, holder: Address) -> Result<U256, RelayError>;

    fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, RelayError>;

    /// The wallet contract's signature threshold.
    fn required_signatures(&self, wallet: Address) -> Result<u32, RelayError>;

    /// Whether `key` is in the wallet's authorised signer set.
    fn key_exist(&self, wallet: Address, key: Address) -> Result<bool, RelayError>;

    /// The relay account's next chain nonce at startup.
    fn transaction_count(&self, address: Address) -> Result<u64, RelayError>;

    fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RelayError>;

    /// Blocks until the transaction is mined and reports whether it
    /// succeeded or reverted.
    fn wait_for_receipt(&self, transaction_hash: B256) -> Result<TransactionOutcome, RelayError>;

    /// The wallet contract's own `isValidSignature` check, used as a second
    /// verification source for cancellation requests.
    fn is_valid_signature(
        &self,
        wallet: Address,
        digest: B256,
        signature: &Bytes,
    ) -> Result<bool, RelayError>;
}
