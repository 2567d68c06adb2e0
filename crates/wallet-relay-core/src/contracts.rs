//! ABI surface of the contracts the relay talks to, and the mapping from a
//! fully-signed message to the transaction that carries it.

use alloy::primitives::U256;
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::domain::{SignedMessage, TransactionRequest};

sol! {
    /// ERC-1077 style wallet contract surface.
    interface WalletContract {
        function executeSigned(
            address to,
            uint256 value,
            bytes data,
            uint256 nonce,
            uint256 gasPrice,
            address gasToken,
            uint256 gasLimit,
            uint8 operationType,
            bytes signatures
        ) returns (bytes32);

        function requiredSignatures() view returns (uint256);
        function keyExist(address key) view returns (bool);
        function isValidSignature(bytes32 hash, bytes signature) view returns (bool);
    }

    interface Erc20 {
        function balanceOf(address owner) view returns (uint256);
    }
}

/// Encodes a threshold-complete message as the `executeSigned` call the
/// relay account sends to the wallet contract. The wallet reimburses gas
/// out of `gasToken`, so the outer transaction itself carries no value.
pub fn message_to_transaction(message: &SignedMessage) -> TransactionRequest {
    let call = WalletContract::executeSignedCall {
        to: message.message.to,
        value: message.message.value,
        data: message.message.data.clone(),
        nonce: U256::from(message.message.nonce),
        gasPrice: message.message.gas_price,
        gasToken: message.message.gas_token,
        gasLimit: message.message.gas_limit,
        operationType: message.message.operation_type,
        signatures: message.signature.clone(),
    };
    TransactionRequest {
        to: message.message.from,
        value: U256::ZERO,
        data: call.abi_encode().into(),
        gas_price: message.message.gas_price,
        gas_limit: message.message.gas_limit,
    }
}
