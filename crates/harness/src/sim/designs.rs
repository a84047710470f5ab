//! Built-in designs.
//!
//! Small synchronous circuits for exercising the harness end to end. Every design has a
//! synchronous active-high `reset` input.

use super::design::{Design, PortSpec, SignalFile};
use crate::common::WideValue;

/// Names accepted by [`design_by_name`].
pub const DESIGN_NAMES: &[&str] = &["register", "adder", "counter", "serial-echo"];

/// Instantiates a built-in design by name.
pub fn design_by_name(name: &str) -> Option<Box<dyn Design>> {
    match name {
        "register" => Some(Box::new(RegisterStage)),
        "adder" => Some(Box::new(WideAdder)),
        "counter" => Some(Box::new(Counter)),
        "serial-echo" => Some(Box::new(SerialEcho)),
        _ => None,
    }
}

/// 32-bit pipeline register: `out` takes `in` on every edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterStage;

impl Design for RegisterStage {
    fn name(&self) -> &'static str {
        "RegisterStage"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("reset", 1),
            PortSpec::input("in", 32),
            PortSpec::output("out", 32),
        ]
    }

    fn clock_edge(&mut self, signals: &mut SignalFile) {
        let next = if signals.is_high("reset") {
            WideValue::zero()
        } else {
            signals.get("in").clone()
        };
        signals.set("out", &next);
    }
}

/// Registered 128-bit adder with a 129-bit sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct WideAdder;

impl WideAdder {
    /// Operand width in bits.
    pub const WIDTH: u32 = 128;
}

impl Design for WideAdder {
    fn name(&self) -> &'static str {
        "WideAdder"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("reset", 1),
            PortSpec::input("a", Self::WIDTH),
            PortSpec::input("b", Self::WIDTH),
            PortSpec::output("sum", Self::WIDTH + 1),
        ]
    }

    fn clock_edge(&mut self, signals: &mut SignalFile) {
        let next = if signals.is_high("reset") {
            WideValue::zero()
        } else {
            WideValue::from(signals.get("a").as_biguint() + signals.get("b").as_biguint())
        };
        signals.set("sum", &next);
    }
}

/// 32-bit counter that increments while `enable` is high and wraps around.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

impl Design for Counter {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("reset", 1),
            PortSpec::input("enable", 1),
            PortSpec::output("count", 32),
        ]
    }

    fn clock_edge(&mut self, signals: &mut SignalFile) {
        if signals.is_high("reset") {
            signals.set("count", &WideValue::zero());
        } else if signals.is_high("enable") {
            let count = signals.get("count").to_u32().unwrap_or(0);
            signals.set("count", &WideValue::from(count.wrapping_add(1)));
        }
    }
}

/// Byte-wide loopback: whatever is presented on `rx_*` appears on `tx_*` one edge later.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialEcho;

impl Design for SerialEcho {
    fn name(&self) -> &'static str {
        "SerialEcho"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("reset", 1),
            PortSpec::input("rx_valid", 1),
            PortSpec::input("rx_data", 8),
            PortSpec::output("tx_valid", 1),
            PortSpec::output("tx_data", 8),
        ]
    }

    fn clock_edge(&mut self, signals: &mut SignalFile) {
        if signals.is_high("reset") {
            signals.set("tx_valid", &WideValue::zero());
            signals.set("tx_data", &WideValue::zero());
        } else {
            let valid = signals.get("rx_valid").clone();
            let data = signals.get("rx_data").clone();
            signals.set("tx_valid", &valid);
            signals.set("tx_data", &data);
        }
    }
}
