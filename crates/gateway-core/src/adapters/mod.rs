//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by tests and local
//! multi-gateway simulations.

mod loopback;
mod recording_processor;
mod time_source;

pub use loopback::{LoopbackAdapter, SentPayload};
pub use recording_processor::{ProcessedMessage, RecordingProcessor};
pub use time_source::{ManualTimeSource, SystemTimeSource};
