//! Bridge widgets.
//!
//! This module organizes the pluggable I/O peripherals a test can talk to alongside the signal
//! channel, including the `Bridge` trait, the registry that owns bridges and drives their
//! lifecycle, concrete serial and block-device bridges, and registry construction from config.

/// Block-device bridge (sector image with optional backing file).
pub mod block_device;

/// Registry construction from configuration.
pub mod builder;

/// Bridge registry, lifecycle, and typed lookup.
pub mod registry;

/// Serial bridge (transcript capture and output checks).
pub mod serial;

/// Bridge trait definitions.
pub mod traits;

pub use block_device::BlockDeviceBridge;
pub use registry::{BridgeRegistry, BridgeReport};
pub use serial::SerialBridge;
pub use traits::{Bridge, BridgeKind, BridgeResult};
