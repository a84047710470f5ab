//! Error taxonomy for the harness.
//!
//! This module defines every failure the harness can surface. It provides:
//! 1. **Channel Errors:** Reported by a `SimulationEngine` for a single read, write, or step request.
//! 2. **Fatal Channel Errors:** Token integrity violations and device desynchronization.
//! 3. **Bridge Errors:** Raised by a bridge while it is being brought up.
//! 4. **Harness Errors:** The fatal categories that unwind out of a test body.
//!
//! Assertion failures and bridge finalization failures are deliberately absent: they are
//! recorded by the verdict tracker and never unwind.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by a simulation engine for one channel operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The signal name does not resolve to any register or wire of the design.
    #[error("unknown signal `{0}`")]
    UnknownSignal(String),

    /// The signal exists but is an output of the design and cannot be written.
    #[error("signal `{0}` is not writable")]
    ReadOnly(String),

    /// A written value needs more bits than the signal holds.
    #[error("signal `{id}` is {width} bits wide but the value needs {bits} bits")]
    WidthMismatch {
        /// Signal name.
        id: String,
        /// Declared width of the signal.
        width: u32,
        /// Significant bits of the rejected value.
        bits: u64,
    },

    /// A 32-bit read was requested from a signal that may hold wider values.
    #[error("signal `{id}` is {width} bits wide and cannot be read as a 32-bit value")]
    NarrowRead {
        /// Signal name.
        id: String,
        /// Width of the signal (or of the value, if the engine does not track widths).
        width: u64,
    },

    /// The transport to the device failed; nothing read or written afterwards can be trusted.
    #[error("device link failure: {0}")]
    Link(String),
}

/// Violations after which the harness cannot safely talk to the device again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalChannelError {
    /// The device's digest of received tokens diverged from the host's digest of sent tokens.
    #[error("token digest mismatch after {tokens} tokens: host {host:#018x}, device {device:#018x}")]
    TokenMismatch {
        /// Number of tokens the host has issued since attaching.
        tokens: u64,
        /// Host-side digest.
        host: u64,
        /// Device-side digest.
        device: u64,
    },

    /// The device's cycle disagrees with the harness's cycle counter at a synchronization point.
    #[error("device reached cycle {device} but the harness expected {expected}")]
    Desynchronized {
        /// Cycle the harness believes the design has reached.
        expected: u64,
        /// Cycle reported by the device.
        device: u64,
    },

    /// The engine reported a transport failure.
    #[error("device link failure: {0}")]
    Link(String),
}

/// Failure raised by a bridge during initialization.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A backing file could not be read or written.
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        /// File the bridge was accessing.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The bridge was configured with parameters it cannot honor.
    #[error("invalid bridge configuration: {0}")]
    Invalid(String),
}

/// Fatal harness error; unwinds out of a test body via `?`.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A signal name or width could not be resolved by the channel.
    #[error("cannot resolve signal `{id}`: {source}")]
    Resolution {
        /// Signal the operation targeted.
        id: String,
        /// Engine-side cause.
        #[source]
        source: ChannelError,
    },

    /// Bridge lookup was missing or ambiguous, or harness arguments were malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The channel to the device can no longer be trusted.
    #[error("fatal channel error: {0}")]
    FatalChannel(#[from] FatalChannelError),

    /// A bridge failed to come up before the test body ran.
    #[error("bridge `{bridge}` failed to initialize: {source}")]
    BridgeInit {
        /// Name of the failing bridge.
        bridge: String,
        /// Bridge-side cause.
        #[source]
        source: BridgeError,
    },
}

impl HarnessError {
    /// Classifies an engine error raised while accessing signal `id`.
    ///
    /// Link failures are fatal channel errors; everything else is a resolution failure.
    pub fn from_channel(id: &str, err: ChannelError) -> Self {
        match err {
            ChannelError::Link(reason) => Self::FatalChannel(FatalChannelError::Link(reason)),
            other => Self::Resolution {
                id: id.to_owned(),
                source: other,
            },
        }
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
