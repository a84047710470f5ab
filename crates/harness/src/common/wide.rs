//! Arbitrary-precision signal values.
//!
//! Signals wider than a machine word are read and written as [`WideValue`]s. Width is a
//! property of the signal, not of the type, so values never carry a width of their own and
//! conversions to native integers fail instead of truncating.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Unsigned value of any width.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WideValue(BigUint);

impl WideValue {
    /// Returns the value zero.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Builds a value from little-endian 32-bit words.
    ///
    /// # Arguments
    ///
    /// * `words` - Least-significant word first.
    pub fn from_words(words: &[u32]) -> Self {
        Self(BigUint::from_slice(words))
    }

    /// Parses a hexadecimal literal, with or without a `0x` prefix; `_` separators are ignored.
    ///
    /// # Returns
    ///
    /// `None` if the text is empty or contains non-hex digits.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits: String = text
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X")
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if digits.is_empty() {
            return None;
        }
        BigUint::parse_bytes(digits.as_bytes(), 16).map(Self)
    }

    /// Returns the all-ones value of the given width.
    pub fn mask(width: u32) -> Self {
        Self((BigUint::from(1u32) << width) - 1u32)
    }

    /// Overwrites `self` with `other`, reusing the existing allocation where possible.
    pub fn assign(&mut self, other: &Self) {
        self.0.clone_from(&other.0);
    }

    /// Number of significant bits (zero for the value zero).
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    /// Returns `true` if the value is representable in `width` bits.
    pub fn fits_width(&self, width: u32) -> bool {
        self.bits() <= u64::from(width)
    }

    /// Returns the value reduced modulo `2^width`.
    ///
    /// Only designs use this; the harness itself never narrows a value.
    pub fn truncated(&self, width: u32) -> Self {
        if self.fits_width(width) {
            return self.clone();
        }
        Self(&self.0 & &Self::mask(width).0)
    }

    /// Returns `true` for the value zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lossless conversion to `u32`.
    pub fn to_u32(&self) -> Option<u32> {
        self.0.to_u32()
    }

    /// Lossless conversion to `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    /// Little-endian 32-bit words (empty for zero).
    pub fn to_words(&self) -> Vec<u32> {
        self.0.to_u32_digits()
    }

    /// Borrows the underlying big integer.
    pub const fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u32> for WideValue {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u64> for WideValue {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for WideValue {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for WideValue {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl PartialEq<u32> for WideValue {
    fn eq(&self, other: &u32) -> bool {
        self.to_u32() == Some(*other)
    }
}

impl PartialEq<u64> for WideValue {
    fn eq(&self, other: &u64) -> bool {
        self.to_u64() == Some(*other)
    }
}

impl PartialEq<WideValue> for u32 {
    fn eq(&self, other: &WideValue) -> bool {
        other == self
    }
}

impl fmt::LowerHex for WideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for WideValue {
    /// Formats as `0x`-prefixed hexadecimal, the notation used in harness logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
