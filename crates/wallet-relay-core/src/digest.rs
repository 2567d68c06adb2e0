//! Canonical hashing and recoverable ECDSA over arbitrary request payloads.
//!
//! Every payload shape the relay signs or verifies (messages, authorisation
//! requests, cancellations) goes through the same path: serialise to JSON,
//! sort object keys recursively, keccak256 the bytes. Two semantically equal
//! payloads therefore always share a digest regardless of field order.

use alloy::primitives::{keccak256, Address, Bytes, PrimitiveSignature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::Serialize;

use crate::domain::UnsignedMessage;
use crate::error::RelayError;

/// Recoverable ECDSA signature split into its components. `recovery_param`
/// is the raw y-parity bit; `v` is the same bit in its 27/28 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    pub r: U256,
    pub s: U256,
    pub recovery_param: u8,
    pub v: u8,
}

impl SignatureParts {
    /// The 65-byte r||s||v wire form carried in `SignedMessage.signature`.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&self.r.to_be_bytes::<32>());
        out.extend_from_slice(&self.s.to_be_bytes::<32>());
        out.push(self.v);
        Bytes::from(out)
    }
}

impl From<PrimitiveSignature> for SignatureParts {
    fn from(signature: PrimitiveSignature) -> Self {
        let recovery_param = signature.v() as u8;
        Self {
            r: signature.r(),
            s: signature.s(),
            recovery_param,
            v: recovery_param + 27,
        }
    }
}

/// Deterministic digest of any serialisable payload.
pub fn payload_digest<T: Serialize>(payload: &T) -> Result<B256, RelayError> {
    let value = serde_json::to_value(payload)?;
    let bytes = canonical_json_bytes(&value)?;
    Ok(keccak256(bytes))
}

/// The aggregation and dedup key: digest of the unsigned fields only.
pub fn message_hash(message: &UnsignedMessage) -> Result<B256, RelayError> {
    payload_digest(message)
}

pub fn sign_digest(
    digest: B256,
    signer: &PrivateKeySigner,
) -> Result<SignatureParts, RelayError> {
    let signature = signer
        .sign_hash_sync(&digest)
        .map_err(|e| RelayError::Signing(e.to_string()))?;
    Ok(SignatureParts::from(signature))
}

/// Recovers the signer of `signature` over `digest`; `None` when the bytes
/// do not parse as a recoverable signature.
pub fn recover_signer(digest: B256, signature: &[u8]) -> Option<Address> {
    let signature = PrimitiveSignature::try_from(signature).ok()?;
    signature.recover_address_from_prehash(&digest).ok()
}

/// Address comparison on `Address` is byte-wise, so mixed-case hex inputs
/// compare canonically once parsed. Malformed signatures verify as false.
pub fn verify_digest(digest: B256, signature: &[u8], claimed: Address) -> bool {
    recover_signer(digest, signature) == Some(claimed)
}

pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, RelayError> {
    let normalized = normalize_json(value);
    Ok(serde_json::to_vec(&normalized)?)
}

fn normalize_json(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::{Map, Value};
    match value {
        Value::Object(map) => {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort_unstable();
            let mut out = Map::with_capacity(keys.len());
            for key in keys {
                if let Some(v) = map.get(&key) {
                    out.insert(key, normalize_json(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        _ => value.clone(),
    }
}
