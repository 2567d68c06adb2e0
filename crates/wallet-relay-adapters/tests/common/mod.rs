#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::signers::local::PrivateKeySigner;

use wallet_relay_adapters::{InMemoryPendingStore, InMemoryQueueStore};
use wallet_relay_core::digest;
use wallet_relay_core::domain::{
    SignedMessage, TransactionOutcome, TransactionRequest, UnsignedMessage, ETHER_TOKEN,
};
use wallet_relay_core::ports::BlockchainPort;
use wallet_relay_core::{ContractWhiteList, MessageHandler, MessageValidator, RelayError};

#[derive(Debug)]
struct ChainState {
    code_hashes: HashMap<Address, B256>,
    balances: HashMap<Address, U256>,
    token_balances: HashMap<(Address, Address), U256>,
    required_signatures: HashMap<Address, u32>,
    wallet_keys: HashMap<Address, Vec<Address>>,
    transaction_count: u64,
    estimate: U256,
    accept_onchain_signatures: bool,
    reject_next_send: Option<String>,
    fail_next_receipt: Option<String>,
    revert_all: bool,
    sent: Vec<Bytes>,
    calls: Vec<&'static str>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            code_hashes: HashMap::new(),
            balances: HashMap::new(),
            token_balances: HashMap::new(),
            required_signatures: HashMap::new(),
            wallet_keys: HashMap::new(),
            transaction_count: 0,
            estimate: U256::from(50_000u64),
            accept_onchain_signatures: true,
            reject_next_send: None,
            fail_next_receipt: None,
            revert_all: false,
            sent: Vec::new(),
            calls: Vec::new(),
        }
    }
}

/// Scripted chain collaborator; records which questions were asked.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        let mut state = self.state.lock().expect("mock chain lock");
        f(&mut state)
    }

    pub fn set_code_hash(&self, address: Address, hash: B256) {
        self.with_state(|s| {
            s.code_hashes.insert(address, hash);
        });
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.with_state(|s| {
            s.balances.insert(address, balance);
        });
    }

    pub fn set_token_balance(&self, token: Address, holder: Address, balance: U256) {
        self.with_state(|s| {
            s.token_balances.insert((token, holder), balance);
        });
    }

    pub fn set_required_signatures(&self, wallet: Address, required: u32) {
        self.with_state(|s| {
            s.required_signatures.insert(wallet, required);
        });
    }

    pub fn add_wallet_key(&self, wallet: Address, key: Address) {
        self.with_state(|s| {
            s.wallet_keys.entry(wallet).or_default().push(key);
        });
    }

    pub fn set_estimate(&self, estimate: U256) {
        self.with_state(|s| s.estimate = estimate);
    }

    pub fn set_transaction_count(&self, count: u64) {
        self.with_state(|s| s.transaction_count = count);
    }

    pub fn reject_next_send(&self, reason: &str) {
        let reason = reason.to_owned();
        self.with_state(|s| s.reject_next_send = Some(reason));
    }

    pub fn fail_next_receipt(&self, reason: &str) {
        let reason = reason.to_owned();
        self.with_state(|s| s.fail_next_receipt = Some(reason));
    }

    pub fn revert_all_transactions(&self) {
        self.with_state(|s| s.revert_all = true);
    }

    pub fn refuse_onchain_signatures(&self) {
        self.with_state(|s| s.accept_onchain_signatures = false);
    }

    pub fn sent_count(&self) -> usize {
        self.with_state(|s| s.sent.len())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.with_state(|s| s.calls.clone())
    }
}

impl BlockchainPort for MockChain {
    fn code_hash(&self, address: Address) -> Result<B256, RelayError> {
        Ok(self.with_state(|s| {
            s.calls.push("code_hash");
            s.code_hashes.get(&address).copied().unwrap_or(B256::ZERO)
        }))
    }

    fn balance(&self, address: Address) -> Result<U256, RelayError> {
        Ok(self.with_state(|s| {
            s.calls.push("balance");
            s.balances.get(&address).copied().unwrap_or(U256::ZERO)
        }))
    }

    fn token_balance(&self, token: Address, holder: Address) -> Result<U256, RelayError> {
        Ok(self.with_state(|s| {
            s.calls.push("token_balance");
            s.token_balances
                .get(&(token, holder))
                .copied()
                .unwrap_or(U256::ZERO)
        }))
    }

    fn estimate_gas(&self, _request: &TransactionRequest) -> Result<U256, RelayError> {
        Ok(self.with_state(|s| {
            s.calls.push("estimate_gas");
            s.estimate
        }))
    }

    fn required_signatures(&self, wallet: Address) -> Result<u32, RelayError> {
        Ok(self.with_state(|s| s.required_signatures.get(&wallet).copied().unwrap_or(1)))
    }

    fn key_exist(&self, wallet: Address, key: Address) -> Result<bool, RelayError> {
        Ok(self.with_state(|s| {
            s.wallet_keys
                .get(&wallet)
                .map(|keys| keys.contains(&key))
                .unwrap_or(false)
        }))
    }

    fn transaction_count(&self, _address: Address) -> Result<u64, RelayError> {
        Ok(self.with_state(|s| s.transaction_count))
    }

    fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RelayError> {
        self.with_state(|s| {
            if let Some(reason) = s.reject_next_send.take() {
                return Err(RelayError::ExecutionFailure(reason));
            }
            s.sent.push(raw.clone());
            Ok(keccak256(raw))
        })
    }

    fn wait_for_receipt(&self, transaction_hash: B256) -> Result<TransactionOutcome, RelayError> {
        self.with_state(|s| {
            if let Some(reason) = s.fail_next_receipt.take() {
                return Err(RelayError::Chain(reason));
            }
            Ok(TransactionOutcome {
                transaction_hash,
                success: !s.revert_all,
            })
        })
    }

    fn is_valid_signature(
        &self,
        _wallet: Address,
        _digest: B256,
        _signature: &Bytes,
    ) -> Result<bool, RelayError> {
        Ok(self.with_state(|s| s.accept_onchain_signatures))
    }
}

pub fn wallet_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid wallet address")
}

pub fn recipient() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid recipient address")
}

pub fn proxy_code_hash() -> B256 {
    B256::repeat_byte(0xAA)
}

pub fn whitelist() -> ContractWhiteList {
    ContractWhiteList {
        master: vec![B256::repeat_byte(0xBB)],
        proxy: vec![proxy_code_hash()],
    }
}

pub fn unsigned_message(wallet: Address) -> UnsignedMessage {
    UnsignedMessage {
        gas_token: ETHER_TOKEN,
        operation_type: 0,
        to: recipient(),
        from: wallet,
        nonce: 0,
        gas_limit: U256::from(1_000_000u64),
        gas_price: U256::from(1_000_000_000u64),
        data: Bytes::new(),
        value: U256::from(2u64),
    }
}

pub fn sign_message(message: &UnsignedMessage, signer: &PrivateKeySigner) -> SignedMessage {
    let hash = digest::message_hash(message).expect("message digest");
    let parts = digest::sign_digest(hash, signer).expect("sign message");
    SignedMessage {
        message: message.clone(),
        signature: parts.to_bytes(),
    }
}

/// A chain where `wallet` is a whitelisted, well-funded proxy whose signer
/// set is `keys` with the given threshold.
pub fn funded_chain(wallet: Address, required: u32, keys: &[Address]) -> MockChain {
    let chain = MockChain::new();
    chain.set_code_hash(wallet, proxy_code_hash());
    chain.set_balance(wallet, U256::from(2_000_000_000_000_000u64));
    chain.set_required_signatures(wallet, required);
    for key in keys {
        chain.add_wallet_key(wallet, *key);
    }
    chain
}

pub type TestHandler = MessageHandler<InMemoryPendingStore, InMemoryQueueStore, MockChain>;

pub fn handler_with_stores(chain: MockChain) -> (TestHandler, InMemoryPendingStore, InMemoryQueueStore) {
    let pending = InMemoryPendingStore::new();
    let queue = InMemoryQueueStore::new();
    let handler = MessageHandler::new(
        pending.clone(),
        queue.clone(),
        chain,
        MessageValidator::new(whitelist()),
    );
    (handler, pending, queue)
}
