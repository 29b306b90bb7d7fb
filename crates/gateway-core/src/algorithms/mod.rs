//! # Algorithms Module
//!
//! Batch framing, payload envelopes and fee allocation.

pub mod batch_codec;
pub mod envelope;
pub mod funding;

pub use batch_codec::{content_hash, decode_batch, encode_batch};
pub use envelope::{Envelope, EnvelopeBody, BATCH_TAG, ENVELOPE_HEADER_LEN, PROOF_TAG};
pub use funding::{allocate_funding, FundingSplit};
