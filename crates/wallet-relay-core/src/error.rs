use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

/// Relay-wide error type.
///
/// Admission variants (`InvalidProxy` through `InvalidAddress`) are
/// recoverable by the caller and carry enough context to correct and
/// resubmit. `ExecutionFailure` is terminal for the affected message hash.
/// `Storage` and `Chain` are infrastructure failures and propagate as-is;
/// they are never folded into an admission error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid proxy at address '{address}'. Deployed contract bytecode hash: '{actual}'. Supported bytecode hashes: {expected:?}")]
    InvalidProxy {
        address: Address,
        actual: B256,
        expected: Vec<B256>,
    },

    #[error("not enough gas: execution requires {estimated}, message declares gas limit {declared}")]
    NotEnoughGas { estimated: U256, declared: U256 },

    #[error("not enough tokens: wallet {wallet} holds {actual} of gas token {token}, cost is {required}")]
    NotEnoughTokens {
        wallet: Address,
        token: Address,
        required: U256,
        actual: U256,
    },

    #[error("too many signatures for message {message_hash}: threshold of {required} already met")]
    TooManySignatures { message_hash: B256, required: u32 },

    #[error("invalid signature over digest {digest} for signer {signer}")]
    InvalidSignature { digest: B256, signer: Address },

    #[error("signature over digest {digest} does not recover any signer")]
    MalformedSignature { digest: B256 },

    #[error("wallet {wallet} rejected the signature claimed by {claimed}")]
    InvalidAddress { wallet: Address, claimed: Address },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction execution failed: {0}")]
    ExecutionFailure(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
