use alloy::primitives::{Bytes, B256};
use tracing::info;

use crate::contracts::message_to_transaction;
use crate::digest;
use crate::domain::{MessageStatus, QueueState, SignatureTally, SignedMessage};
use crate::error::RelayError;
use crate::ports::{BlockchainPort, MessageQueueStore, PendingSignatureStore};
use crate::validator::MessageValidator;

/// Per-submission orchestration: signer authorisation, signature
/// aggregation, and the single hand-off path into the execution queue.
///
/// Validation runs exactly once, on the submission that completes the
/// threshold; partial submissions are admitted cheaply.
pub struct MessageHandler<P, Q, C>
where
    P: PendingSignatureStore,
    Q: MessageQueueStore,
    C: BlockchainPort,
{
    pending: P,
    queue: Q,
    chain: C,
    validator: MessageValidator,
}

impl<P, Q, C> MessageHandler<P, Q, C>
where
    P: PendingSignatureStore,
    Q: MessageQueueStore,
    C: BlockchainPort,
{
    pub fn new(pending: P, queue: Q, chain: C, validator: MessageValidator) -> Self {
        Self {
            pending,
            queue,
            chain,
            validator,
        }
    }

    pub fn handle(&self, signed: &SignedMessage) -> Result<MessageStatus, RelayError> {
        let message_hash = digest::message_hash(&signed.message)?;
        let wallet = signed.message.from;

        let signer = digest::recover_signer(message_hash, &signed.signature).ok_or(
            RelayError::MalformedSignature {
                digest: message_hash,
            },
        )?;
        if !self.chain.key_exist(wallet, signer)? {
            return Err(RelayError::InvalidSignature {
                digest: message_hash,
                signer,
            });
        }

        let required = self.chain.required_signatures(wallet)?;
        let tally = self
            .pending
            .add_signature(message_hash, &signed.signature, required)?;

        if !tally.is_complete() {
            info!(
                message_hash = %message_hash,
                collected = tally.total_collected(),
                required,
                "collecting signatures"
            );
            return Ok(status_from_tally(message_hash, &tally, None, None));
        }

        let assembled = SignedMessage {
            message: signed.message.clone(),
            signature: concatenate_signatures(&tally),
        };
        let transaction = message_to_transaction(&assembled);
        self.validator.validate(&assembled, &transaction, &self.chain)?;
        self.queue.add(&assembled)?;
        info!(message_hash = %message_hash, "message queued for execution");

        Ok(status_from_tally(message_hash, &tally, None, None))
    }

    pub fn get_status(&self, message_hash: B256) -> Result<MessageStatus, RelayError> {
        let tally = self
            .pending
            .get(message_hash)?
            .ok_or_else(|| RelayError::NotFound(format!("message {message_hash}")))?;

        let (transaction_hash, error) = match self.queue.get(message_hash)?.map(|e| e.state) {
            Some(QueueState::Succeeded { transaction_hash }) => (Some(transaction_hash), None),
            Some(QueueState::Failed { reason }) => (None, Some(reason)),
            Some(QueueState::Pending) | None => (None, None),
        };

        Ok(status_from_tally(
            message_hash,
            &tally,
            transaction_hash,
            error,
        ))
    }
}

fn status_from_tally(
    message_hash: B256,
    tally: &SignatureTally,
    transaction_hash: Option<B256>,
    error: Option<String>,
) -> MessageStatus {
    MessageStatus {
        message_hash: Some(message_hash),
        error,
        collected_signatures: tally.collected_signatures.clone(),
        total_collected: tally.total_collected(),
        required: tally.required,
        transaction_hash,
    }
}

/// Collected signatures in collection order, concatenated for
/// `executeSigned`.
fn concatenate_signatures(tally: &SignatureTally) -> Bytes {
    let mut out = Vec::with_capacity(tally.collected_signatures.len() * 65);
    for signature in &tally.collected_signatures {
        out.extend_from_slice(signature);
    }
    Bytes::from(out)
}
