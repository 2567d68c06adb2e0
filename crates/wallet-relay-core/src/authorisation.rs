use alloy::primitives::{Address, Bytes};
use tracing::info;

use crate::digest;
use crate::domain::{CancelAuthorisationRequest, PendingAuthorisation};
use crate::error::RelayError;
use crate::ports::{AuthorisationStore, BlockchainPort};

/// Pending device-authorisation workflow: a device files a request
/// unsigned; only the wallet side can revoke it, by counter-signing the
/// cancellation payload with the key being cancelled.
pub struct AuthorisationService<A, C>
where
    A: AuthorisationStore,
    C: BlockchainPort,
{
    store: A,
    chain: C,
    onchain_check: bool,
}

impl<A, C> AuthorisationService<A, C>
where
    A: AuthorisationStore,
    C: BlockchainPort,
{
    pub fn new(store: A, chain: C) -> Self {
        Self {
            store,
            chain,
            onchain_check: true,
        }
    }

    /// Disables the wallet-contract `isValidSignature` corroboration; used
    /// where the target wallet does not expose the check.
    pub fn without_onchain_check(mut self) -> Self {
        self.onchain_check = false;
        self
    }

    /// Records the request and returns its store identifier.
    pub fn add_request(&self, request: &PendingAuthorisation) -> Result<u64, RelayError> {
        let request_id = self.store.add_request(request)?;
        info!(
            wallet = %request.wallet_contract_address,
            key = %request.key,
            request_id,
            "authorisation request recorded"
        );
        Ok(request_id)
    }

    pub fn get_pending_authorisations(
        &self,
        wallet: Address,
    ) -> Result<Vec<PendingAuthorisation>, RelayError> {
        self.store.get_pending_authorisations(wallet)
    }

    /// Removes `(wallet, key)` after verifying the cancellation signature.
    /// The digested payload is the cancellation request alone; the
    /// signature is never part of the digested bytes.
    pub fn remove_request(
        &self,
        cancel: &CancelAuthorisationRequest,
        signature: &Bytes,
    ) -> Result<(), RelayError> {
        let payload_digest = digest::payload_digest(cancel)?;
        if !digest::verify_digest(payload_digest, signature, cancel.key) {
            return Err(RelayError::InvalidSignature {
                digest: payload_digest,
                signer: cancel.key,
            });
        }

        if self.onchain_check
            && !self.chain.is_valid_signature(
                cancel.wallet_contract_address,
                payload_digest,
                signature,
            )?
        {
            return Err(RelayError::InvalidAddress {
                wallet: cancel.wallet_contract_address,
                claimed: cancel.key,
            });
        }

        self.store
            .remove_request(cancel.wallet_contract_address, cancel.key)?;
        info!(
            wallet = %cancel.wallet_contract_address,
            key = %cancel.key,
            "authorisation request cancelled"
        );
        Ok(())
    }
}
