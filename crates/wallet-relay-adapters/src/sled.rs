//! Durable store backend on a [Sled](https://sled.rs) database.
//!
//! One database holds every relay store: pending signature tallies, the
//! execution queue (entries plus a monotonic order tree whose big-endian
//! sequence keys give iteration order; terminal entries drop out of it on
//! the next peek), and authorisation records. A store-level write lock
//! makes each read-modify-write atomic; readers go straight to the trees.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use wallet_relay_core::digest;
use wallet_relay_core::domain::{
    PendingAuthorisation, QueueState, QueuedMessage, SignatureTally, SignedMessage,
};
use wallet_relay_core::ports::{AuthorisationStore, MessageQueueStore, PendingSignatureStore};
use wallet_relay_core::RelayError;

use crate::now_ms;

const PENDING_TREE: &str = "pending_signatures";
const QUEUE_TREE: &str = "queue_entries";
const ORDER_TREE: &str = "queue_order";
const AUTH_TREE: &str = "authorisations";

#[derive(Clone)]
pub struct SledRelayStore {
    db: sled::Db,
    write_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for SledRelayStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SledRelayStore").finish()
    }
}

/// Authorisation record with its first-seen sequence number, so upserts
/// keep their original position in the pending list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAuthorisation {
    seq: u64,
    record: PendingAuthorisation,
}

fn storage_err(e: impl fmt::Display) -> RelayError {
    RelayError::Storage(e.to_string())
}

impl SledRelayStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let db = sled::Config::new()
            .path(path)
            .mode(sled::Mode::HighThroughput)
            .open()
            .map_err(storage_err)?;
        Ok(Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree, RelayError> {
        self.db.open_tree(name).map_err(storage_err)
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, RelayError> {
        self.write_lock
            .lock()
            .map_err(|_| RelayError::Storage("sled write lock poisoned".to_owned()))
    }

    fn load_entry(
        &self,
        tree: &sled::Tree,
        message_hash: B256,
    ) -> Result<Option<QueuedMessage>, RelayError> {
        match tree.get(message_hash.as_slice()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn store_entry(&self, tree: &sled::Tree, entry: &QueuedMessage) -> Result<(), RelayError> {
        tree.insert(entry.message_hash.as_slice(), serde_json::to_vec(entry)?)
            .map_err(storage_err)?;
        Ok(())
    }

    fn mark(&self, message_hash: B256, state: QueueState) -> Result<(), RelayError> {
        let _guard = self.write_guard()?;
        let tree = self.tree(QUEUE_TREE)?;
        if let Some(mut entry) = self.load_entry(&tree, message_hash)? {
            if !entry.state.is_terminal() {
                entry.state = state;
                self.store_entry(&tree, &entry)?;
            }
        }
        Ok(())
    }

    fn auth_key(wallet: Address, key: Address) -> [u8; 40] {
        let mut out = [0u8; 40];
        out[..20].copy_from_slice(wallet.as_slice());
        out[20..].copy_from_slice(key.as_slice());
        out
    }
}

impl PendingSignatureStore for SledRelayStore {
    fn add_signature(
        &self,
        message_hash: B256,
        signature: &Bytes,
        required: u32,
    ) -> Result<SignatureTally, RelayError> {
        let _guard = self.write_guard()?;
        let tree = self.tree(PENDING_TREE)?;

        let mut tally = match tree.get(message_hash.as_slice()).map_err(storage_err)? {
            Some(bytes) => serde_json::from_slice::<SignatureTally>(&bytes)?,
            None => SignatureTally {
                collected_signatures: Vec::new(),
                required,
            },
        };
        if tally.contains(signature) {
            return Ok(tally);
        }
        if tally.is_complete() {
            return Err(RelayError::TooManySignatures {
                message_hash,
                required: tally.required,
            });
        }
        tally.collected_signatures.push(signature.clone());
        tree.insert(message_hash.as_slice(), serde_json::to_vec(&tally)?)
            .map_err(storage_err)?;
        Ok(tally)
    }

    fn get(&self, message_hash: B256) -> Result<Option<SignatureTally>, RelayError> {
        let tree = self.tree(PENDING_TREE)?;
        match tree.get(message_hash.as_slice()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl MessageQueueStore for SledRelayStore {
    fn add(&self, message: &SignedMessage) -> Result<B256, RelayError> {
        let message_hash = digest::message_hash(&message.message)?;
        let _guard = self.write_guard()?;
        let tree = self.tree(QUEUE_TREE)?;
        if self.load_entry(&tree, message_hash)?.is_none() {
            let seq = self.db.generate_id().map_err(storage_err)?;
            self.tree(ORDER_TREE)?
                .insert(seq.to_be_bytes(), message_hash.as_slice())
                .map_err(storage_err)?;
            self.store_entry(
                &tree,
                &QueuedMessage {
                    message_hash,
                    message: message.clone(),
                    enqueued_at: now_ms(),
                    state: QueueState::Pending,
                },
            )?;
        }
        Ok(message_hash)
    }

    fn get(&self, message_hash: B256) -> Result<Option<QueuedMessage>, RelayError> {
        let tree = self.tree(QUEUE_TREE)?;
        self.load_entry(&tree, message_hash)
    }

    fn get_next(&self) -> Result<Option<QueuedMessage>, RelayError> {
        let entries = self.tree(QUEUE_TREE)?;
        let order = self.tree(ORDER_TREE)?;
        for item in order.iter() {
            let (seq_key, hash_bytes) = item.map_err(storage_err)?;
            let message_hash = B256::from_slice(&hash_bytes);
            match self.load_entry(&entries, message_hash)? {
                Some(entry) if !entry.state.is_terminal() => return Ok(Some(entry)),
                // Resolved entries keep their record but leave the order
                // index, so the scan stays proportional to the backlog.
                _ => {
                    order.remove(seq_key).map_err(storage_err)?;
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
        self.mark(message_hash, QueueState::Succeeded { transaction_hash })
    }

    fn mark_as_error(&self, message_hash: B256, reason: &str) -> Result<(), RelayError> {
        self.mark(
            message_hash,
            QueueState::Failed {
                reason: reason.to_owned(),
            },
        )
    }
}

impl AuthorisationStore for SledRelayStore {
    fn add_request(&self, request: &PendingAuthorisation) -> Result<u64, RelayError> {
        let _guard = self.write_guard()?;
        let tree = self.tree(AUTH_TREE)?;
        let key = Self::auth_key(request.wallet_contract_address, request.key);
        let seq = match tree.get(key).map_err(storage_err)? {
            Some(bytes) => serde_json::from_slice::<StoredAuthorisation>(&bytes)?.seq,
            None => self.db.generate_id().map_err(storage_err)?,
        };
        let stored = StoredAuthorisation {
            seq,
            record: request.clone(),
        };
        tree.insert(key, serde_json::to_vec(&stored)?)
            .map_err(storage_err)?;
        Ok(seq)
    }

    fn get_pending_authorisations(
        &self,
        wallet: Address,
    ) -> Result<Vec<PendingAuthorisation>, RelayError> {
        let tree = self.tree(AUTH_TREE)?;
        let mut stored = Vec::new();
        for item in tree.scan_prefix(wallet.as_slice()) {
            let (_, bytes) = item.map_err(storage_err)?;
            stored.push(serde_json::from_slice::<StoredAuthorisation>(&bytes)?);
        }
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.record).collect())
    }

    fn remove_request(&self, wallet: Address, key: Address) -> Result<(), RelayError> {
        let _guard = self.write_guard()?;
        self.tree(AUTH_TREE)?
            .remove(Self::auth_key(wallet, key))
            .map_err(storage_err)?;
        Ok(())
    }
}
