//! Recording Processor
//!
//! Implements the `MessageProcessor` port by capturing every delivered
//! message. Failures can be scripted per message body.

use crate::domain::NetworkId;
use crate::ports::outbound::{MessageProcessor, ProcessorError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Message accepted by the processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedMessage {
    /// Origin network.
    pub origin: NetworkId,
    /// Message body.
    pub message: Vec<u8>,
}

/// In-memory processor.
#[derive(Default)]
pub struct RecordingProcessor {
    processed: RwLock<Vec<ProcessedMessage>>,
    reject: RwLock<HashSet<Vec<u8>>>,
    rejections: RwLock<usize>,
}

impl RecordingProcessor {
    /// Create an empty processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `message` until `accept` is called for it.
    pub fn fail_on(&self, message: &[u8]) {
        self.reject.write().insert(message.to_vec());
    }

    /// Stop rejecting `message`.
    pub fn accept(&self, message: &[u8]) {
        self.reject.write().remove(message);
    }

    /// Accepted messages in delivery order.
    pub fn processed(&self) -> Vec<ProcessedMessage> {
        self.processed.read().clone()
    }

    /// Accepted message bodies in delivery order.
    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.processed
            .read()
            .iter()
            .map(|p| p.message.clone())
            .collect()
    }

    /// Number of rejected deliveries.
    pub fn rejections(&self) -> usize {
        *self.rejections.read()
    }
}

#[async_trait]
impl MessageProcessor for RecordingProcessor {
    async fn handle(&self, origin: NetworkId, message: &[u8]) -> Result<(), ProcessorError> {
        if self.reject.read().contains(message) {
            *self.rejections.write() += 1;
            return Err(ProcessorError(format!(
                "scripted rejection of {} bytes",
                message.len()
            )));
        }
        self.processed.write().push(ProcessedMessage {
            origin,
            message: message.to_vec(),
        });
        Ok(())
    }
}
