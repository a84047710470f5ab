//! In-process reference engine.
//!
//! Simulates a [`Design`] on the host while behaving like a remote device: step requests and
//! writes are queued and consumed in issue order, and the device only makes progress when the
//! host polls (`is_idle`) or drains. With a small `cycles_per_poll` a non-blocking step leaves
//! the design visibly behind the harness until the next synchronization point.

use std::collections::VecDeque;

use tracing::trace;

use super::design::{Design, Direction, SignalFile};
use crate::channel::{SimulationEngine, Token, TokenDigest};
use crate::common::{ChannelError, WideValue};

/// Device-side progress per poll when not configured otherwise.
const DEFAULT_CYCLES_PER_POLL: u32 = 1;

/// Request waiting to be consumed by the device.
#[derive(Debug, Clone)]
enum Command {
    /// Commit a value to an input signal.
    Write {
        /// Signal name.
        id: String,
        /// Value, already validated against the signal's width.
        value: WideValue,
    },
    /// Advance the clock.
    Step {
        /// Edges requested by the host.
        requested: u32,
        /// Edges still to go.
        remaining: u32,
    },
}

/// Reference simulation engine.
pub struct ReferenceEngine {
    /// Simulated design.
    design: Box<dyn Design>,
    /// Current signal values.
    signals: SignalFile,
    /// Requests not yet consumed, in issue order.
    queue: VecDeque<Command>,
    /// Clock edges completed.
    cycle: u64,
    /// Digest of every consumed token.
    digest: TokenDigest,
    /// Clock edges consumed per `is_idle` poll.
    cycles_per_poll: u32,
}

impl ReferenceEngine {
    /// Creates an engine for `design` with every signal at zero.
    pub fn new(design: Box<dyn Design>) -> Self {
        let signals = SignalFile::from_ports(&design.ports());
        Self {
            design,
            signals,
            queue: VecDeque::new(),
            cycle: 0,
            digest: TokenDigest::new(),
            cycles_per_poll: DEFAULT_CYCLES_PER_POLL,
        }
    }

    /// Sets how many clock edges the device consumes per `is_idle` poll (at least one).
    #[must_use]
    pub fn with_cycles_per_poll(mut self, cycles: u32) -> Self {
        self.cycles_per_poll = cycles.max(1);
        self
    }

    /// Clock edges the device has completed.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Clock edges requested but not yet completed.
    pub fn outstanding_cycles(&self) -> u64 {
        self.queue
            .iter()
            .map(|cmd| match cmd {
                Command::Step { remaining, .. } => u64::from(*remaining),
                Command::Write { .. } => 0,
            })
            .sum()
    }

    /// Signal values as currently visible.
    pub const fn signals(&self) -> &SignalFile {
        &self.signals
    }

    /// Consumes queued requests until `budget` clock edges have elapsed or the queue is empty.
    fn advance(&mut self, mut budget: u64) {
        while let Some(front) = self.queue.front_mut() {
            match front {
                Command::Write { .. } => {
                    if let Some(Command::Write { id, value }) = self.queue.pop_front() {
                        self.apply_write(&id, &value);
                    }
                }
                Command::Step {
                    requested,
                    remaining,
                } => {
                    if budget == 0 {
                        return;
                    }
                    let edges = u64::from(*remaining).min(budget);
                    for _ in 0..edges {
                        self.design.clock_edge(&mut self.signals);
                    }
                    self.cycle += edges;
                    budget -= edges;
                    *remaining -= edges as u32;
                    if *remaining == 0 {
                        let cycles = *requested;
                        let _ = self.queue.pop_front();
                        self.digest.absorb(Token::Step { cycles });
                    }
                }
            }
        }
    }

    /// Commits a validated write and folds it into the digest.
    fn apply_write(&mut self, id: &str, value: &WideValue) {
        trace!(signal = id, value = %value, cycle = self.cycle, "applying write");
        self.signals.set(id, value);
        self.digest.absorb(Token::Write { id, value });
    }

    /// Checks that `id` names a writable port wide enough for `value`.
    fn check_writable(&self, id: &str, value: &WideValue) -> Result<(), ChannelError> {
        let spec = self
            .signals
            .spec(id)
            .ok_or_else(|| ChannelError::UnknownSignal(id.to_owned()))?;
        if spec.direction == Direction::Output {
            return Err(ChannelError::ReadOnly(id.to_owned()));
        }
        if !value.fits_width(spec.width) {
            return Err(ChannelError::WidthMismatch {
                id: id.to_owned(),
                width: spec.width,
                bits: value.bits(),
            });
        }
        Ok(())
    }
}

impl SimulationEngine for ReferenceEngine {
    fn target_name(&self) -> &str {
        self.design.name()
    }

    fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), ChannelError> {
        self.check_writable(id, value)?;
        if self.queue.is_empty() {
            self.apply_write(id, value);
        } else {
            self.queue.push_back(Command::Write {
                id: id.to_owned(),
                value: value.clone(),
            });
        }
        Ok(())
    }

    fn read_wide(&mut self, id: &str) -> Result<WideValue, ChannelError> {
        if self.signals.spec(id).is_none() {
            return Err(ChannelError::UnknownSignal(id.to_owned()));
        }
        Ok(self.signals.get(id).clone())
    }

    fn read(&mut self, id: &str) -> Result<u32, ChannelError> {
        let spec = self
            .signals
            .spec(id)
            .ok_or_else(|| ChannelError::UnknownSignal(id.to_owned()))?;
        if spec.width > 32 {
            return Err(ChannelError::NarrowRead {
                id: id.to_owned(),
                width: u64::from(spec.width),
            });
        }
        Ok(self.signals.get(id).to_u32().unwrap_or(0))
    }

    fn request_step(&mut self, cycles: u32) -> Result<(), ChannelError> {
        if cycles > 0 {
            self.queue.push_back(Command::Step {
                requested: cycles,
                remaining: cycles,
            });
        }
        Ok(())
    }

    fn is_idle(&mut self) -> bool {
        self.advance(u64::from(self.cycles_per_poll));
        self.queue.is_empty()
    }

    fn drain(&mut self) -> Result<u64, ChannelError> {
        self.advance(u64::MAX);
        Ok(self.cycle)
    }

    fn token_digest(&self) -> Option<TokenDigest> {
        Some(self.digest)
    }
}

impl std::fmt::Debug for ReferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceEngine")
            .field("design", &self.design.name())
            .field("cycle", &self.cycle)
            .field("queued", &self.queue.len())
            .field("cycles_per_poll", &self.cycles_per_poll)
            .finish_non_exhaustive()
    }
}
