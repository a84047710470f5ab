//! Signal channel between the harness and the simulated device.
//!
//! This module organizes everything that crosses the host/device boundary, including the
//! engine contract the harness consumes, the adapter every harness operation goes through,
//! and the token digests used to detect corrupted or reordered traffic.

/// Thin façade over the engine used by all harness operations.
pub mod adapter;

/// Contract implemented by simulation engines.
pub mod engine;

/// Token digests and integrity verification.
pub mod tokens;

pub use adapter::SignalChannel;
pub use engine::SimulationEngine;
pub use tokens::{DigestVerifier, Token, TokenDigest, TokenVerifier};
