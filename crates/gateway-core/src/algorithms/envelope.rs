//! # Payload Envelope
//!
//! Wire format of what adapters carry between networks:
//!
//! ```text
//! +------+--------------+----------------------------------+
//! | tag  | pool id (BE) | body                             |
//! | 1 B  | 8 B          | batch bytes  |  32-byte hash     |
//! +------+--------------+----------------------------------+
//! ```
//!
//! The pool id travels with the payload so the receiving gateway can
//! resolve the adapter set before trusting anything else in it.

use super::batch_codec::content_hash;
use crate::domain::{GatewayError, Hash, PayloadKind, PoolId};

/// Tag of a full batch.
pub const BATCH_TAG: u8 = 0x01;

/// Tag of a hash-only proof.
pub const PROOF_TAG: u8 = 0x02;

/// Tag plus pool id.
pub const ENVELOPE_HEADER_LEN: usize = 1 + 8;

/// Envelope body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeBody {
    /// Serialized batch.
    Batch(Vec<u8>),
    /// Content hash of a batch.
    Proof(Hash),
}

/// Decoded inbound/outbound payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Pool the batch belongs to.
    pub pool: PoolId,
    /// Batch or proof.
    pub body: EnvelopeBody,
}

impl Envelope {
    /// Envelope carrying the full batch.
    pub fn batch(pool: PoolId, bytes: Vec<u8>) -> Self {
        Self {
            pool,
            body: EnvelopeBody::Batch(bytes),
        }
    }

    /// Envelope carrying only the content hash.
    pub fn proof(pool: PoolId, hash: Hash) -> Self {
        Self {
            pool,
            body: EnvelopeBody::Proof(hash),
        }
    }

    /// Payload shape.
    pub fn kind(&self) -> PayloadKind {
        match self.body {
            EnvelopeBody::Batch(_) => PayloadKind::Batch,
            EnvelopeBody::Proof(_) => PayloadKind::Proof,
        }
    }

    /// Content hash the envelope votes for.
    pub fn content_hash(&self) -> Hash {
        match &self.body {
            EnvelopeBody::Batch(bytes) => content_hash(bytes),
            EnvelopeBody::Proof(hash) => *hash,
        }
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let (tag, body): (u8, &[u8]) = match &self.body {
            EnvelopeBody::Batch(bytes) => (BATCH_TAG, bytes.as_slice()),
            EnvelopeBody::Proof(hash) => (PROOF_TAG, &hash[..]),
        };
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + body.len());
        out.push(tag);
        out.extend_from_slice(&self.pool.to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    /// Parse wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, GatewayError> {
        if bytes.len() < ENVELOPE_HEADER_LEN {
            return Err(GatewayError::MalformedPayload(format!(
                "{} bytes shorter than header",
                bytes.len()
            )));
        }
        let mut pool = [0u8; 8];
        pool.copy_from_slice(&bytes[1..ENVELOPE_HEADER_LEN]);
        let pool = PoolId::from_be_bytes(pool);
        let body = &bytes[ENVELOPE_HEADER_LEN..];

        match bytes[0] {
            BATCH_TAG => {
                if body.is_empty() {
                    return Err(GatewayError::MalformedPayload("empty batch body".to_string()));
                }
                Ok(Self::batch(pool, body.to_vec()))
            }
            PROOF_TAG => {
                let hash: Hash = body.try_into().map_err(|_| {
                    GatewayError::MalformedPayload(format!(
                        "proof body of {} bytes, expected 32",
                        body.len()
                    ))
                })?;
                Ok(Self::proof(pool, hash))
            }
            tag => Err(GatewayError::MalformedPayload(format!(
                "unknown tag 0x{:02x}",
                tag
            ))),
        }
    }
}
