//! In-process simulation.
//!
//! This module provides a `SimulationEngine` that runs on the host, for exercising the harness
//! without hardware. It includes:
//! 1. **Design model:** Port declarations, the signal file, and the `Design` trait.
//! 2. **Built-in designs:** Register stage, wide adder, counter, and serial loopback.
//! 3. **Reference engine:** Queued, poll-driven execution that mimics a remote device.

/// Design trait and signal storage.
pub mod design;

/// Built-in designs.
pub mod designs;

/// Reference engine.
pub mod engine;

pub use design::{Design, Direction, PortSpec, SignalFile};
pub use designs::{Counter, DESIGN_NAMES, RegisterStage, SerialEcho, WideAdder, design_by_name};
pub use engine::ReferenceEngine;
