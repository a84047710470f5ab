//! Common types used throughout the harness.
//!
//! This module provides the building blocks shared by every layer. It includes:
//! 1. **Error Handling:** Channel, bridge, and harness error taxonomies.
//! 2. **Wide Values:** Arbitrary-precision unsigned values for signals wider than a machine word.
//! 3. **Randomness:** A seeded, reproducible generator for test stimulus.

/// Error types for the channel, bridges, and harness.
pub mod error;

/// Deterministic random number generator for stimulus.
pub mod rng;

/// Arbitrary-precision signal values.
pub mod wide;

pub use error::{BridgeError, ChannelError, FatalChannelError, HarnessError};
pub use rng::TestRng;
pub use wide::WideValue;
