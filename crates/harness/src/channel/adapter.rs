//! Signal channel adapter.
//!
//! Every harness operation reaches the engine through [`SignalChannel`]. It performs:
//! 1. **Resolution:** Forwards signal names to the engine and classifies its errors.
//! 2. **Token recording:** Feeds every accepted write and step request to the token verifier.
//! 3. **Synchronization:** Drains the engine and checks token integrity at the same time.

use std::fmt;

use crate::channel::engine::SimulationEngine;
use crate::channel::tokens::{DigestVerifier, Token, TokenVerifier};
use crate::common::{ChannelError, FatalChannelError, HarnessError, WideValue};

/// Façade over a borrowed simulation engine.
pub struct SignalChannel<'a, E: SimulationEngine + ?Sized> {
    /// Engine driving the design; outlives the harness.
    engine: &'a mut E,
    /// Integrity checker, or `None` when verification is disabled.
    verifier: Option<Box<dyn TokenVerifier>>,
    /// Device cycle at attach time; harness cycles count from here.
    base_cycle: u64,
}

impl<'a, E: SimulationEngine + ?Sized> SignalChannel<'a, E> {
    /// Attaches to an engine, draining any traffic issued before the harness existed.
    ///
    /// The default [`DigestVerifier`] is installed, resumed from the engine's current digest.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine to borrow for the lifetime of the channel.
    ///
    /// # Returns
    ///
    /// The channel, or a fatal channel error if the engine cannot be drained.
    pub fn attach(engine: &'a mut E) -> Result<Self, HarnessError> {
        let base_cycle = engine.drain().map_err(link_failure)?;
        let verifier = DigestVerifier::resume(engine.token_digest());
        Ok(Self {
            engine,
            verifier: Some(Box::new(verifier)),
            base_cycle,
        })
    }

    /// Replaces the token verifier; `None` disables verification.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Option<Box<dyn TokenVerifier>>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Name of the simulated target design.
    pub fn target_name(&self) -> &str {
        self.engine.target_name()
    }

    /// Device cycle when the channel attached.
    pub const fn base_cycle(&self) -> u64 {
        self.base_cycle
    }

    /// Returns `true` if token verification is active.
    pub const fn verifies_tokens(&self) -> bool {
        self.verifier.is_some()
    }

    /// Commits a 32-bit value to a signal.
    pub fn write(&mut self, id: &str, value: u32) -> Result<(), HarnessError> {
        self.engine
            .write(id, value)
            .map_err(|err| HarnessError::from_channel(id, err))?;
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.record(Token::Write {
                id,
                value: &WideValue::from(value),
            });
        }
        Ok(())
    }

    /// Commits a wide value to a signal.
    pub fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), HarnessError> {
        self.engine
            .write_wide(id, value)
            .map_err(|err| HarnessError::from_channel(id, err))?;
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.record(Token::Write { id, value });
        }
        Ok(())
    }

    /// Reads a signal as a 32-bit value, without synchronizing.
    pub fn read(&mut self, id: &str) -> Result<u32, HarnessError> {
        self.engine
            .read(id)
            .map_err(|err| HarnessError::from_channel(id, err))
    }

    /// Reads a signal as a wide value, without synchronizing.
    pub fn read_wide(&mut self, id: &str) -> Result<WideValue, HarnessError> {
        self.engine
            .read_wide(id)
            .map_err(|err| HarnessError::from_channel(id, err))
    }

    /// Issues a step request without waiting for it.
    pub fn request_step(&mut self, cycles: u32) -> Result<(), HarnessError> {
        self.engine.request_step(cycles).map_err(link_failure)?;
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.record(Token::Step { cycles });
        }
        Ok(())
    }

    /// Returns `true` if the device has consumed every issued request.
    pub fn is_idle(&mut self) -> bool {
        self.engine.is_idle()
    }

    /// Waits for the device to consume every issued request, then checks token integrity.
    ///
    /// # Returns
    ///
    /// The device cycle reached, relative to the engine's own origin.
    pub fn drain(&mut self) -> Result<u64, HarnessError> {
        let cycle = self.engine.drain().map_err(link_failure)?;
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.verify(self.engine.token_digest())?;
        }
        Ok(cycle)
    }
}

impl<E: SimulationEngine + ?Sized> fmt::Debug for SignalChannel<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalChannel")
            .field("target", &self.engine.target_name())
            .field("verifier", &self.verifier)
            .field("base_cycle", &self.base_cycle)
            .finish()
    }
}

/// Maps an error from a request that names no signal onto the fatal channel category.
fn link_failure(err: ChannelError) -> HarnessError {
    let reason = match err {
        ChannelError::Link(reason) => reason,
        other => other.to_string(),
    };
    HarnessError::FatalChannel(FatalChannelError::Link(reason))
}
