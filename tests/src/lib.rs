//! # Quorum-Gateway Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (codec, hashing, round trip)
//! └── src/
//!     ├── harness.rs    # Two gateways wired through loopback adapters
//!     └── integration/  # Cross-network choreography
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p gateway-tests
//!
//! # By category
//! cargo test -p gateway-tests integration::flows::
//! cargo test -p gateway-tests integration::recovery_flows::
//!
//! # Benchmarks
//! cargo bench -p gateway-tests
//! ```

#![allow(dead_code)]

pub mod harness;
