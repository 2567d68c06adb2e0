use alloy::primitives::B256;

use crate::domain::{SignedMessage, TransactionRequest, ETHER_TOKEN};
use crate::error::RelayError;
use crate::ports::BlockchainPort;

/// Approved bytecode hashes for wallet logic ("master") contracts and the
/// proxies that delegate to them. Only proxy membership admits a message;
/// the master set is consulted by deployment tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractWhiteList {
    pub master: Vec<B256>,
    pub proxy: Vec<B256>,
}

impl ContractWhiteList {
    pub fn is_proxy(&self, code_hash: &B256) -> bool {
        self.proxy.contains(code_hash)
    }

    pub fn is_master(&self, code_hash: &B256) -> bool {
        self.master.contains(code_hash)
    }
}

/// Pre-execution admission check for threshold-complete messages.
///
/// Stateless: every check runs against live chain state at admission time.
/// The proxy check runs first since an unrecognised contract cannot be
/// trusted for the balance queries that follow.
#[derive(Debug, Clone)]
pub struct MessageValidator {
    whitelist: ContractWhiteList,
}

impl MessageValidator {
    pub fn new(whitelist: ContractWhiteList) -> Self {
        Self { whitelist }
    }

    pub fn validate<C: BlockchainPort>(
        &self,
        message: &SignedMessage,
        transaction: &TransactionRequest,
        chain: &C,
    ) -> Result<(), RelayError> {
        let wallet = message.message.from;

        let actual = chain.code_hash(wallet)?;
        if !self.whitelist.is_proxy(&actual) {
            return Err(RelayError::InvalidProxy {
                address: wallet,
                actual,
                expected: self.whitelist.proxy.clone(),
            });
        }

        let estimated = chain.estimate_gas(transaction)?;
        if estimated > message.message.gas_limit {
            return Err(RelayError::NotEnoughGas {
                estimated,
                declared: message.message.gas_limit,
            });
        }

        let gas_token = message.message.gas_token;
        let mut required = message
            .message
            .gas_limit
            .saturating_mul(message.message.gas_price);
        let actual_balance = if gas_token == ETHER_TOKEN {
            required = required.saturating_add(message.message.value);
            chain.balance(wallet)?
        } else {
            chain.token_balance(gas_token, wallet)?
        };
        if actual_balance < required {
            return Err(RelayError::NotEnoughTokens {
                wallet,
                token: gas_token,
                required,
                actual: actual_balance,
            });
        }

        Ok(())
    }
}
