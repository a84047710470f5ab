//! Deterministic random number generator for test stimulus.
//!
//! Every harness owns one [`TestRng`], seeded from configuration (default `0`) or from the
//! `+seed=` plusarg. The sequence depends only on the seed and the order of calls, never on
//! wall-clock time or process state, so a failing run can be replayed exactly.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use super::wide::WideValue;

/// Seeded pseudo-random source.
///
/// Implements [`RngCore`], so the `rand::Rng` extension methods (`gen_range`, `gen_bool`, ...)
/// are available on it.
#[derive(Clone, Debug)]
pub struct TestRng {
    /// Seed the current sequence started from.
    seed: u64,
    /// Generator state.
    inner: Xoshiro256StarStar,
}

impl TestRng {
    /// Seed used when neither configuration nor arguments provide one.
    pub const DEFAULT_SEED: u64 = 0;

    /// Creates a generator at the start of the sequence for `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    /// Returns the seed of the current sequence.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Draws a uniformly distributed value of at most `bits` bits.
    ///
    /// # Arguments
    ///
    /// * `bits` - Width of the signal the value is destined for.
    ///
    /// # Returns
    ///
    /// A value with `fits_width(bits)` true; zero when `bits` is zero.
    pub fn wide(&mut self, bits: u32) -> WideValue {
        let mut words: Vec<u32> = (0..bits.div_ceil(32))
            .map(|_| self.inner.next_u32())
            .collect();
        let spare = bits % 32;
        if spare != 0 {
            if let Some(top) = words.last_mut() {
                *top &= (1u32 << spare) - 1;
            }
        }
        WideValue::from_words(&words)
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
