//! Design model for the reference engine.
//!
//! A design declares its ports and updates a [`SignalFile`] on every clock edge. Inputs are
//! written by the harness through the engine; outputs are written only by the design.

use fxhash::FxHashMap;

use crate::common::WideValue;

/// Direction of a port, seen from the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Driven by the harness.
    Input,
    /// Driven by the design; read-only to the harness.
    Output,
}

/// Declaration of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Signal name.
    pub name: &'static str,
    /// Width in bits.
    pub width: u32,
    /// Who drives it.
    pub direction: Direction,
}

impl PortSpec {
    /// Declares an input port.
    pub const fn input(name: &'static str, width: u32) -> Self {
        Self {
            name,
            width,
            direction: Direction::Input,
        }
    }

    /// Declares an output port.
    pub const fn output(name: &'static str, width: u32) -> Self {
        Self {
            name,
            width,
            direction: Direction::Output,
        }
    }
}

/// Current value and declaration of one signal.
#[derive(Debug, Clone)]
struct Signal {
    spec: PortSpec,
    value: WideValue,
}

/// Named signals of one design instance.
#[derive(Debug, Clone, Default)]
pub struct SignalFile {
    signals: FxHashMap<&'static str, Signal>,
    /// Returned for names the design never declared.
    zero: WideValue,
}

impl SignalFile {
    /// Creates a signal file holding every port of `ports`, all at zero.
    pub fn from_ports(ports: &[PortSpec]) -> Self {
        let signals = ports
            .iter()
            .map(|&spec| {
                (
                    spec.name,
                    Signal {
                        spec,
                        value: WideValue::zero(),
                    },
                )
            })
            .collect();
        Self {
            signals,
            zero: WideValue::zero(),
        }
    }

    /// Declaration of the named signal.
    pub fn spec(&self, name: &str) -> Option<PortSpec> {
        self.signals.get(name).map(|signal| signal.spec)
    }

    /// Current value of the named signal (zero if undeclared).
    pub fn get(&self, name: &str) -> &WideValue {
        self.signals.get(name).map_or(&self.zero, |signal| &signal.value)
    }

    /// Returns `true` if the named 1-bit signal is high.
    pub fn is_high(&self, name: &str) -> bool {
        !self.get(name).is_zero()
    }

    /// Drives the named signal, truncating to its width. Undeclared names are ignored.
    pub fn set(&mut self, name: &str, value: &WideValue) {
        if let Some(signal) = self.signals.get_mut(name) {
            signal.value = value.truncated(signal.spec.width);
        }
    }

    /// Number of declared signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` if no signals are declared.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Synchronous design simulated by the reference engine.
pub trait Design: Send {
    /// Design name, reported as the engine's target name.
    fn name(&self) -> &'static str;

    /// Every port of the design.
    fn ports(&self) -> Vec<PortSpec>;

    /// Advances the design by one rising clock edge.
    fn clock_edge(&mut self, signals: &mut SignalFile);
}
