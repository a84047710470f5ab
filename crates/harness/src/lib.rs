//! Hardware-in-the-loop test harness library.
//!
//! This crate drives a single functional test against a cycle-accurate simulated design with the following:
//! 1. **Channel:** Named, width-typed signal reads and writes through a `SimulationEngine`, with token integrity checks.
//! 2. **Stepping:** Blocking and non-blocking clock advancement with an exact-after-sync cycle counter.
//! 3. **Verdicts:** Non-fatal assertions that record the first failing cycle and every divergence.
//! 4. **Bridges:** Pluggable I/O widgets (serial, block storage) initialized before and finalized after the test.
//! 5. **Simulation:** An in-process reference engine and built-in designs for exercising the harness end-to-end.

/// Bridge widgets, their lifecycle registry, and registry construction from config.
pub mod bridges;
/// Signal channel adapter, engine contract, and token integrity verification.
pub mod channel;
/// Shared types (errors, wide values, deterministic RNG).
pub mod common;
/// Harness configuration (defaults, JSON loading, plusarg overrides).
pub mod config;
/// Test harness orchestrator, stepping controller, and verdict tracker.
pub mod harness;
/// In-process reference simulation engine and built-in designs.
pub mod sim;
/// Per-test operation statistics.
pub mod stats;

/// Root configuration type; use `HarnessConfig::default()` or load from JSON.
pub use crate::config::HarnessConfig;
/// Error type returned by every fatal harness operation.
pub use crate::common::HarnessError;
/// Arbitrary-precision signal value.
pub use crate::common::WideValue;
/// The orchestrator a concrete test drives.
pub use crate::harness::{TestBody, TestHarness, TestOutcome, run_simulation};
/// Engine contract the harness consumes.
pub use crate::channel::SimulationEngine;
/// Owner of all bridge widgets for one test.
pub use crate::bridges::BridgeRegistry;
