//! # Application Layer
//!
//! `GatewayService` orchestrates the domain behind one lock:
//! - `outbound`: buffering, dispatch, fees
//! - `inbound`: votes, quorum, execution, retries
//! - `recovery`: disputable vote overrides

mod inbound;
mod outbound;
mod recovery;
pub mod service;
mod state;

#[cfg(test)]
mod fixtures;

pub use service::GatewayService;
