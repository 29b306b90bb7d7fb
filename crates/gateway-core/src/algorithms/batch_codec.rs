//! # Batch Framing
//!
//! A batch is the concatenation of its messages, each prefixed with its
//! length as a big-endian `u16`. The content hash is Keccak-256 over exactly
//! those bytes, so the primary (which ships the bytes) and every secondary
//! (which ships only the hash) vote for the same key.

use crate::domain::{GatewayError, Hash, FRAME_PREFIX_LEN, MAX_MESSAGE_LEN};
use sha3::{Digest, Keccak256};

/// Keccak-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Serialize messages in order.
pub fn encode_batch<M: AsRef<[u8]>>(messages: &[M]) -> Result<Vec<u8>, GatewayError> {
    let total = messages
        .iter()
        .map(|m| m.as_ref().len() + FRAME_PREFIX_LEN)
        .sum();
    let mut out = Vec::with_capacity(total);
    for message in messages {
        let message = message.as_ref();
        if message.is_empty() {
            return Err(GatewayError::EmptyMessage);
        }
        if message.len() > MAX_MESSAGE_LEN {
            return Err(GatewayError::MessageTooLarge {
                size: message.len(),
                max: MAX_MESSAGE_LEN,
            });
        }
        out.extend_from_slice(&(message.len() as u16).to_be_bytes());
        out.extend_from_slice(message);
    }
    Ok(out)
}

/// Split batch bytes back into messages.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Vec<u8>>, GatewayError> {
    if bytes.is_empty() {
        return Err(GatewayError::MalformedBatch("empty batch".to_string()));
    }

    let mut messages = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        if bytes.len() - offset < FRAME_PREFIX_LEN {
            return Err(GatewayError::MalformedBatch(format!(
                "truncated length prefix at offset {}",
                offset
            )));
        }
        let len = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]) as usize;
        offset += FRAME_PREFIX_LEN;

        if len == 0 {
            return Err(GatewayError::MalformedBatch(format!(
                "zero-length frame at offset {}",
                offset - FRAME_PREFIX_LEN
            )));
        }
        if bytes.len() - offset < len {
            return Err(GatewayError::MalformedBatch(format!(
                "frame of {} bytes overruns batch at offset {}",
                len, offset
            )));
        }
        messages.push(bytes[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(messages)
}
