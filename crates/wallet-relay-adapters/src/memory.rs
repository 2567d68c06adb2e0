//! In-memory store backends. Interchangeable with the sled-backed stores;
//! used by tests and ephemeral deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Bytes, B256};

use wallet_relay_core::digest;
use wallet_relay_core::domain::{
    PendingAuthorisation, QueueState, QueuedMessage, SignatureTally, SignedMessage,
};
use wallet_relay_core::ports::{AuthorisationStore, MessageQueueStore, PendingSignatureStore};
use wallet_relay_core::RelayError;

use crate::now_ms;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, RelayError> {
    mutex
        .lock()
        .map_err(|_| RelayError::Storage(format!("{what} lock poisoned")))
}

/// Per-hash signature aggregation behind one mutex; the lock makes each
/// read-modify-write atomic under concurrent submissions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPendingStore {
    state: Arc<Mutex<HashMap<B256, SignatureTally>>>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PendingSignatureStore for InMemoryPendingStore {
    fn add_signature(
        &self,
        message_hash: B256,
        signature: &Bytes,
        required: u32,
    ) -> Result<SignatureTally, RelayError> {
        let mut state = lock(&self.state, "pending store")?;
        let tally = state.entry(message_hash).or_insert_with(|| SignatureTally {
            collected_signatures: Vec::new(),
            required,
        });
        if tally.contains(signature) {
            return Ok(tally.clone());
        }
        if tally.is_complete() {
            return Err(RelayError::TooManySignatures {
                message_hash,
                required: tally.required,
            });
        }
        tally.collected_signatures.push(signature.clone());
        Ok(tally.clone())
    }

    fn get(&self, message_hash: B256) -> Result<Option<SignatureTally>, RelayError> {
        Ok(lock(&self.state, "pending store")?.get(&message_hash).cloned())
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    order: Vec<B256>,
    entries: HashMap<B256, QueuedMessage>,
}

/// Hash-keyed backlog preserving first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueueStore {
    state: Arc<Mutex<QueueInner>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageQueueStore for InMemoryQueueStore {
    fn add(&self, message: &SignedMessage) -> Result<B256, RelayError> {
        let message_hash = digest::message_hash(&message.message)?;
        let mut state = lock(&self.state, "queue store")?;
        if !state.entries.contains_key(&message_hash) {
            state.order.push(message_hash);
            state.entries.insert(
                message_hash,
                QueuedMessage {
                    message_hash,
                    message: message.clone(),
                    enqueued_at: now_ms(),
                    state: QueueState::Pending,
                },
            );
        }
        Ok(message_hash)
    }

    fn get(&self, message_hash: B256) -> Result<Option<QueuedMessage>, RelayError> {
        Ok(lock(&self.state, "queue store")?
            .entries
            .get(&message_hash)
            .cloned())
    }

    fn get_next(&self) -> Result<Option<QueuedMessage>, RelayError> {
        let state = lock(&self.state, "queue store")?;
        for hash in &state.order {
            if let Some(entry) = state.entries.get(hash) {
                if !entry.state.is_terminal() {
                    return Ok(Some(entry.clone()));
                }
            }
        }
        Ok(None)
    }

    fn mark_as_success(
        &self,
        message_hash: B256,
        transaction_hash: B256,
    ) -> Result<(), RelayError> {
        let mut state = lock(&self.state, "queue store")?;
        if let Some(entry) = state.entries.get_mut(&message_hash) {
            if !entry.state.is_terminal() {
                entry.state = QueueState::Succeeded { transaction_hash };
            }
        }
        Ok(())
    }

    fn mark_as_error(&self, message_hash: B256, reason: &str) -> Result<(), RelayError> {
        let mut state = lock(&self.state, "queue store")?;
        if let Some(entry) = state.entries.get_mut(&message_hash) {
            if !entry.state.is_terminal() {
                entry.state = QueueState::Failed {
                    reason: reason.to_owned(),
                };
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AuthInner {
    next_id: u64,
    records: Vec<(u64, PendingAuthorisation)>,
}

/// Pending authorisation records in insertion order; upsert keeps the
/// original position and id, so a re-requesting device does not jump the
/// list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthorisationStore {
    state: Arc<Mutex<AuthInner>>,
}

impl InMemoryAuthorisationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthorisationStore for InMemoryAuthorisationStore {
    fn add_request(&self, request: &PendingAuthorisation) -> Result<u64, RelayError> {
        let mut state = lock(&self.state, "authorisation store")?;
        if let Some((id, existing)) = state.records.iter_mut().find(|(_, r)| {
            r.wallet_contract_address == request.wallet_contract_address && r.key == request.key
        }) {
            *existing = request.clone();
            return Ok(*id);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.records.push((id, request.clone()));
        Ok(id)
    }

    fn get_pending_authorisations(
        &self,
        wallet: Address,
    ) -> Result<Vec<PendingAuthorisation>, RelayError> {
        Ok(lock(&self.state, "authorisation store")?
            .records
            .iter()
            .filter(|(_, r)| r.wallet_contract_address == wallet)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn remove_request(&self, wallet: Address, key: Address) -> Result<(), RelayError> {
        lock(&self.state, "authorisation store")?
            .records
            .retain(|(_, r)| !(r.wallet_contract_address == wallet && r.key == key));
        Ok(())
    }
}
