use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, TxKind, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use tracing::{info, warn};

use crate::contracts::message_to_transaction;
use crate::domain::QueuedMessage;
use crate::error::RelayError;
use crate::ports::{BlockchainPort, MessageQueueStore};

/// Result of processing one queue entry, returned to the caller instead of
/// being delivered through a completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub message_hash: B256,
    pub result: ExecutionResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Succeeded { transaction_hash: B256 },
    Failed { reason: String },
}

/// A broadcast whose receipt has not been observed yet. Remembered across
/// passes so an interrupted wait resumes on the same transaction instead
/// of re-signing and re-sending the message.
struct InFlight {
    message_hash: B256,
    transaction_hash: B256,
}

/// The queue's single consumer and the sole writer from the relay account.
///
/// Owns the relay signer and the account's next chain nonce: fetched once
/// at construction, advanced only after a broadcast is accepted, so a
/// rejected submission releases the nonce it would have used. Exactly-once
/// submission per message follows from this sequencing, the in-flight
/// record, and the one-shot terminal marks in the queue store.
pub struct MessageExecutor<Q, C>
where
    Q: MessageQueueStore,
    C: BlockchainPort,
{
    queue: Q,
    chain: C,
    signer: PrivateKeySigner,
    chain_id: u64,
    next_nonce: u64,
    in_flight: Option<InFlight>,
}

impl<Q, C> MessageExecutor<Q, C>
where
    Q: MessageQueueStore,
    C: BlockchainPort,
{
    pub fn new(queue: Q, chain: C, signer: PrivateKeySigner, chain_id: u64) -> Result<Self, RelayError> {
        let next_nonce = chain.transaction_count(signer.address())?;
        Ok(Self {
            queue,
            chain,
            signer,
            chain_id,
            next_nonce,
            in_flight: None,
        })
    }

    pub fn relay_address(&self) -> Address {
        self.signer.address()
    }

    /// The chain nonce the next broadcast will carry.
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Executes the oldest outstanding queue entry, if any, and resolves it
    /// to exactly one terminal state. Infrastructure errors propagate and
    /// leave the entry outstanding; a pass interrupted after its broadcast
    /// resumes by waiting on the recorded transaction, never by sending a
    /// second one.
    pub fn process_next(&mut self) -> Result<Option<ExecutionOutcome>, RelayError> {
        let Some(entry) = self.queue.get_next()? else {
            return Ok(None);
        };

        let result = match self.execute(&entry) {
            Ok(transaction_hash) => {
                self.queue.mark_as_success(entry.message_hash, transaction_hash)?;
                info!(
                    message_hash = %entry.message_hash,
                    transaction_hash = %transaction_hash,
                    "message executed"
                );
                ExecutionResult::Succeeded { transaction_hash }
            }
            Err(RelayError::ExecutionFailure(reason)) => {
                // Terminal: retrying would reuse the wallet's replay nonce.
                self.queue.mark_as_error(entry.message_hash, &reason)?;
                warn!(message_hash = %entry.message_hash, %reason, "message execution failed");
                ExecutionResult::Failed { reason }
            }
            Err(other) => return Err(other),
        };

        Ok(Some(ExecutionOutcome {
            message_hash: entry.message_hash,
            result,
        }))
    }

    /// Suspend-on-empty consumer loop. Broadcasts stay strictly sequential
    /// because each submission runs to a terminal mark before the next peek.
    pub fn run(&mut self, stop: &AtomicBool, idle: Duration) -> Result<(), RelayError> {
        while !stop.load(Ordering::Relaxed) {
            if self.process_next()?.is_none() {
                std::thread::sleep(idle);
            }
        }
        Ok(())
    }

    fn execute(&mut self, entry: &QueuedMessage) -> Result<B256, RelayError> {
        let transaction_hash = match &self.in_flight {
            Some(pending) if pending.message_hash == entry.message_hash => {
                pending.transaction_hash
            }
            _ => {
                let transaction_hash = self.broadcast(entry)?;
                // Broadcast accepted: the nonce is consumed even if the
                // call reverts.
                self.next_nonce += 1;
                self.in_flight = Some(InFlight {
                    message_hash: entry.message_hash,
                    transaction_hash,
                });
                transaction_hash
            }
        };

        let outcome = self.chain.wait_for_receipt(transaction_hash)?;
        self.in_flight = None;
        if outcome.success {
            Ok(outcome.transaction_hash)
        } else {
            Err(RelayError::ExecutionFailure(format!(
                "transaction {transaction_hash} reverted on chain"
            )))
        }
    }

    fn broadcast(&self, entry: &QueuedMessage) -> Result<B256, RelayError> {
        let request = message_to_transaction(&entry.message);

        let transaction = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.next_nonce,
            gas_price: request.gas_price.try_into().unwrap_or(u128::MAX),
            gas_limit: request.gas_limit.try_into().unwrap_or(u64::MAX),
            to: TxKind::Call(request.to),
            value: request.value,
            input: request.data,
        };
        let signature = self
            .signer
            .sign_hash_sync(&transaction.signature_hash())
            .map_err(|e| RelayError::Signing(e.to_string()))?;
        let raw = TxEnvelope::Legacy(transaction.into_signed(signature)).encoded_2718();

        self.chain.send_raw_transaction(&raw.into())
    }
}
