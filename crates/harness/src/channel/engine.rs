//! Simulation engine contract.
//!
//! This module defines the `SimulationEngine` trait implemented by whatever actually advances
//! the design. It provides:
//! 1. **Signal access:** Narrow (32-bit) and wide reads and writes by signal name.
//! 2. **Stepping:** Deferred step requests, an idle query, and a drain that waits for the device.
//! 3. **Integrity:** An optional digest of every token the device has consumed.
//!
//! Engines must apply writes and step requests in the order they are issued. A write issued
//! while steps are outstanding takes effect after those steps, never before.

use crate::channel::tokens::TokenDigest;
use crate::common::{ChannelError, WideValue};

/// Engine that advances a simulated design and exposes its signals by name.
pub trait SimulationEngine {
    /// Returns the name of the simulated target design.
    fn target_name(&self) -> &str;

    /// Issues a write of `value` to the named signal.
    ///
    /// Name and width are checked immediately; the write itself may be queued behind
    /// outstanding step requests.
    fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), ChannelError>;

    /// Returns the value of the named signal as currently visible to the host.
    ///
    /// Does not wait for outstanding step requests.
    fn read_wide(&mut self, id: &str) -> Result<WideValue, ChannelError>;

    /// Issues a request to advance the design by `cycles` clock edges and returns without
    /// waiting for the device.
    fn request_step(&mut self, cycles: u32) -> Result<(), ChannelError>;

    /// Returns `true` if the device has consumed every issued request.
    fn is_idle(&mut self) -> bool;

    /// Waits until the device has consumed every issued request.
    ///
    /// # Returns
    ///
    /// The cycle the device has reached.
    fn drain(&mut self) -> Result<u64, ChannelError>;

    /// Issues a write of a 32-bit value.
    fn write(&mut self, id: &str, value: u32) -> Result<(), ChannelError> {
        self.write_wide(id, &WideValue::from(value))
    }

    /// Reads a signal as a 32-bit value.
    ///
    /// The default implementation reads the wide value and refuses values that do not fit.
    fn read(&mut self, id: &str) -> Result<u32, ChannelError> {
        let value = self.read_wide(id)?;
        value.to_u32().ok_or_else(|| ChannelError::NarrowRead {
            id: id.to_owned(),
            width: value.bits(),
        })
    }

    /// Digest of every token the device has consumed, if the engine keeps one.
    fn token_digest(&self) -> Option<TokenDigest> {
        None
    }
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for Box<E> {
    fn target_name(&self) -> &str {
        (**self).target_name()
    }

    fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), ChannelError> {
        (**self).write_wide(id, value)
    }

    fn read_wide(&mut self, id: &str) -> Result<WideValue, ChannelError> {
        (**self).read_wide(id)
    }

    fn request_step(&mut self, cycles: u32) -> Result<(), ChannelError> {
        (**self).request_step(cycles)
    }

    fn is_idle(&mut self) -> bool {
        (**self).is_idle()
    }

    fn drain(&mut self) -> Result<u64, ChannelError> {
        (**self).drain()
    }

    fn write(&mut self, id: &str, value: u32) -> Result<(), ChannelError> {
        (**self).write(id, value)
    }

    fn read(&mut self, id: &str) -> Result<u32, ChannelError> {
        (**self).read(id)
    }

    fn token_digest(&self) -> Option<TokenDigest> {
        (**self).token_digest()
    }
}
