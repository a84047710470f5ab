//! Token digests and integrity verification.
//!
//! Every write and step request the harness issues is a token. Both sides of the channel fold
//! the tokens they see into an order-sensitive digest; at each synchronization point the device
//! has consumed everything the host issued, so the two digests must agree. A difference means a
//! token was corrupted, dropped, duplicated, or reordered in transit.

use std::fmt;
use std::hash::Hasher;

use fxhash::FxHasher64;

use crate::common::{FatalChannelError, WideValue};

/// Discriminant folded in ahead of a write token.
const TAG_WRITE: u8 = 0x57;
/// Discriminant folded in ahead of a step token.
const TAG_STEP: u8 = 0x53;
/// Separator between a signal name and its value.
const NAME_TERMINATOR: u8 = 0xff;

/// One unit of host-to-device traffic.
#[derive(Debug, Clone, Copy)]
pub enum Token<'a> {
    /// A value committed to a named signal.
    Write {
        /// Signal name.
        id: &'a str,
        /// Value written.
        value: &'a WideValue,
    },
    /// A request to advance the clock.
    Step {
        /// Requested clock edges.
        cycles: u32,
    },
}

/// Running, order-sensitive digest of a token stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TokenDigest {
    /// Tokens folded in so far.
    count: u64,
    /// Chained hash of those tokens.
    hash: u64,
}

impl TokenDigest {
    /// Digest of the empty stream.
    pub const fn new() -> Self {
        Self { count: 0, hash: 0 }
    }

    /// Folds one token into the digest.
    pub fn absorb(&mut self, token: Token<'_>) {
        let mut hasher = FxHasher64::default();
        hasher.write_u64(self.hash);
        match token {
            Token::Write { id, value } => {
                hasher.write_u8(TAG_WRITE);
                hasher.write(id.as_bytes());
                hasher.write_u8(NAME_TERMINATOR);
                let words = value.to_words();
                hasher.write_u64(words.len() as u64);
                for word in words {
                    hasher.write_u32(word);
                }
            }
            Token::Step { cycles } => {
                hasher.write_u8(TAG_STEP);
                hasher.write_u32(cycles);
            }
        }
        self.hash = hasher.finish();
        self.count += 1;
    }

    /// Number of tokens folded in.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Current chained hash.
    pub const fn hash(&self) -> u64 {
        self.hash
    }
}

/// Checks host and device token streams against each other.
pub trait TokenVerifier: fmt::Debug {
    /// Records a token the host has just issued.
    fn record(&mut self, token: Token<'_>);

    /// Compares the host's record with the device's digest at a synchronization point.
    ///
    /// `device` is `None` when the engine keeps no digest; verification is then skipped.
    fn verify(&mut self, device: Option<TokenDigest>) -> Result<(), FatalChannelError>;
}

/// Default verifier: mirrors the device's digest on the host side.
#[derive(Debug, Clone, Default)]
pub struct DigestVerifier {
    /// Digest of everything the host has issued, continued from the attach-time baseline.
    host: TokenDigest,
    /// Device token count when the verifier attached.
    baseline: u64,
    /// Successful comparisons so far.
    checks: u64,
}

impl DigestVerifier {
    /// Continues from the device's digest at attach time, so traffic from before the harness
    /// existed does not count against it.
    pub fn resume(device: Option<TokenDigest>) -> Self {
        let host = device.unwrap_or_default();
        Self {
            host,
            baseline: host.count(),
            checks: 0,
        }
    }

    /// Number of successful comparisons.
    pub const fn checks(&self) -> u64 {
        self.checks
    }
}

impl TokenVerifier for DigestVerifier {
    fn record(&mut self, token: Token<'_>) {
        self.host.absorb(token);
    }

    fn verify(&mut self, device: Option<TokenDigest>) -> Result<(), FatalChannelError> {
        let Some(device) = device else {
            return Ok(());
        };
        if device != self.host {
            return Err(FatalChannelError::TokenMismatch {
                tokens: self.host.count() - self.baseline,
                host: self.host.hash(),
                device: device.hash(),
            });
        }
        self.checks += 1;
        Ok(())
    }
}
