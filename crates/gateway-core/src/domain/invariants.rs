//! # Domain Invariants
//!
//! Business rules for adapter configuration, payload routing and fees.

use super::errors::{short_hex, AdapterId, AdapterSlot, Amount, GatewayError};
use super::value_objects::{PayloadKind, MAX_ADAPTER_COUNT};
use std::collections::HashSet;

/// Invariant: at most `MAX_ADAPTER_COUNT` adapters per set.
pub fn invariant_adapter_count(count: usize) -> Result<(), GatewayError> {
    if count > MAX_ADAPTER_COUNT {
        return Err(GatewayError::TooManyAdapters {
            count,
            max: MAX_ADAPTER_COUNT,
        });
    }
    Ok(())
}

/// Invariant: 1 <= quorum <= adapter count.
pub fn invariant_quorum(quorum: u8, count: usize) -> Result<(), GatewayError> {
    if quorum == 0 || quorum as usize > count {
        return Err(GatewayError::InvalidQuorum { quorum, count });
    }
    Ok(())
}

/// Invariant: an adapter occupies at most one slot.
pub fn invariant_unique_adapters(adapters: &[AdapterId]) -> Result<(), GatewayError> {
    let mut seen = HashSet::with_capacity(adapters.len());
    for adapter in adapters {
        if !seen.insert(adapter) {
            return Err(GatewayError::DuplicateAdapter(short_hex(adapter)));
        }
    }
    Ok(())
}

/// Invariant: full batches only through the primary, proofs only through the rest.
pub fn invariant_payload_shape(kind: PayloadKind, slot: AdapterSlot) -> Result<(), GatewayError> {
    if !kind.accepted_from(slot) {
        return Err(GatewayError::InvalidPayload(format!(
            "{:?} not accepted from slot {}",
            kind, slot
        )));
    }
    Ok(())
}

/// Invariant: fee conservation for a single dispatch.
///
/// Attached value and subsidy together pay exactly the charged cost, and
/// no more attached value is consumed than was supplied.
pub fn invariant_fee_conservation(
    attached_consumed: Amount,
    subsidy_consumed: Amount,
    charged: Amount,
    attached: Amount,
) -> bool {
    attached_consumed.checked_add(subsidy_consumed) == Some(charged) && attached_consumed <= attached
}
