//! Stepping controller.
//!
//! Owns the harness cycle counter `t`. Every step adds its cycle count to `t` as soon as it is
//! issued, so `t` is an upper bound on the cycle the design has reached; it becomes exact at
//! each synchronization point, where the controller drains the channel and checks the device's
//! cycle against `t`.

use crate::channel::{SignalChannel, SimulationEngine};
use crate::common::{FatalChannelError, HarnessError};

/// Cycle counter and outstanding-step bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepController {
    /// Cycles issued since the channel attached.
    t: u64,
    /// Cycles issued since the last synchronization point.
    pending: u64,
}

impl StepController {
    /// Creates a controller at cycle 0 with nothing outstanding.
    pub const fn new() -> Self {
        Self { t: 0, pending: 0 }
    }

    /// Upper bound on the cycle the design has reached; exact after a synchronization point.
    pub const fn cycles(&self) -> u64 {
        self.t
    }

    /// Cycles issued but not yet confirmed by the device.
    pub const fn pending(&self) -> u64 {
        self.pending
    }

    /// Returns `true` if no step has been issued since the last synchronization point.
    pub const fn is_synchronized(&self) -> bool {
        self.pending == 0
    }

    /// Advances the design by `cycles` clock edges.
    ///
    /// A zero-cycle step issues nothing; in blocking mode it still synchronizes.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to the device.
    /// * `cycles` - Clock edges to advance.
    /// * `blocking` - Wait for the device to reach the new cycle before returning.
    pub fn step<E: SimulationEngine + ?Sized>(
        &mut self,
        channel: &mut SignalChannel<'_, E>,
        cycles: u32,
        blocking: bool,
    ) -> Result<(), HarnessError> {
        if cycles > 0 {
            channel.request_step(cycles)?;
            self.t += u64::from(cycles);
            self.pending += u64::from(cycles);
        }
        if blocking {
            self.synchronize(channel)?;
        }
        Ok(())
    }

    /// Waits for the device to consume every outstanding request, then checks that its cycle
    /// matches `t`.
    ///
    /// # Returns
    ///
    /// `FatalChannelError::Desynchronized` if the device reached a different cycle, or any
    /// error raised while draining.
    pub fn synchronize<E: SimulationEngine + ?Sized>(
        &mut self,
        channel: &mut SignalChannel<'_, E>,
    ) -> Result<(), HarnessError> {
        let device = channel.drain()?;
        let reached = device.checked_sub(channel.base_cycle());
        if reached != Some(self.t) {
            return Err(FatalChannelError::Desynchronized {
                expected: self.t,
                device: reached.unwrap_or(0),
            }
            .into());
        }
        self.pending = 0;
        Ok(())
    }
}
