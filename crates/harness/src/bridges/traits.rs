//! Bridge trait for pluggable I/O widgets.
//!
//! This module defines the `Bridge` trait implemented by every widget a registry can hold. It
//! provides:
//! 1. **Identification:** `name` and `kind` for logs and capability lookup.
//! 2. **Lifecycle:** `init` before the test body runs and `finalize` after it returns.
//! 3. **Downcasting:** `as_any` / `as_any_mut` so the registry can hand out concrete types.
//!
//! All implementors must be `Send` so a registry can be built on one thread and driven on another.

use std::any::Any;
use std::fmt;

use crate::common::BridgeError;

/// Capability category of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeKind {
    /// Byte-stream peripheral (UART and similar).
    Serial,
    /// Sector-addressed storage.
    BlockDevice,
    /// Any other peripheral, identified by a static label.
    Custom(&'static str),
}

impl fmt::Display for BridgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::BlockDevice => write!(f, "block-device"),
            Self::Custom(label) => write!(f, "{label}"),
        }
    }
}

/// A bridge's own verdict, reported at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeResult {
    /// The bridge saw nothing wrong.
    Passed,
    /// The bridge detected a failure; the reason is reported at teardown.
    Failed(String),
}

impl BridgeResult {
    /// Returns `true` for [`BridgeResult::Passed`].
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Pluggable widget modeling one I/O peripheral of the design.
pub trait Bridge: Any + Send {
    /// Returns a short name for this bridge (e.g., `"uart0"`, `"disk"`).
    fn name(&self) -> &str;

    /// Returns the capability category of this bridge.
    fn kind(&self) -> BridgeKind;

    /// Brings the bridge up; called once, in registry order, before the test body runs.
    fn init(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Releases the bridge's resources and reports its verdict; called once after the test.
    ///
    /// Finalization runs regardless of the harness's own verdict and must not panic.
    fn finalize(&mut self) -> BridgeResult {
        BridgeResult::Passed
    }

    /// Returns `self` as `Any` for typed lookup.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as mutable `Any` for typed lookup.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
