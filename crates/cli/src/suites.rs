//! Built-in test suites, one per built-in design.
//!
//! Suites read their own options from the test arguments (`+iterations=N`); the harness
//! ignores anything it does not recognize.

use hwloop_core::bridges::SerialBridge;
use hwloop_core::common::WideValue;
use hwloop_core::harness::{TestBody, TestHarness};
use hwloop_core::sim::{ReferenceEngine, WideAdder};
use hwloop_core::{HarnessError, SimulationEngine};
use rand::Rng;

/// Iterations when `+iterations=` is absent.
const DEFAULT_ITERATIONS: u32 = 64;

/// Looks up the suite for a built-in design.
pub fn suite_for(design: &str) -> Option<Box<dyn TestBody<ReferenceEngine>>> {
    match design {
        "register" => Some(Box::new(RegisterSuite)),
        "adder" => Some(Box::new(AdderSuite)),
        "counter" => Some(Box::new(CounterSuite)),
        "serial-echo" => Some(Box::new(SerialEchoSuite)),
        _ => None,
    }
}

/// Reads `+iterations=N` from the test arguments.
fn iterations<E: SimulationEngine + ?Sized>(
    harness: &TestHarness<'_, E>,
) -> Result<u32, HarnessError> {
    harness
        .args()
        .iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("+iterations="))
        .map_or(Ok(DEFAULT_ITERATIONS), |value| {
            value
                .parse()
                .map_err(|_| HarnessError::Configuration(format!("invalid +iterations={value}")))
        })
}

/// Random values through the register stage, one cycle each.
struct RegisterSuite;

impl<E: SimulationEngine + ?Sized> TestBody<E> for RegisterSuite {
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError> {
        harness.reset()?;
        for _ in 0..iterations(harness)? {
            let value: u32 = harness.random().r#gen();
            harness.poke("in", value)?;
            harness.step(1)?;
            let _ = harness.expect("out", value)?;
        }
        Ok(())
    }
}

/// Random 128-bit operand pairs through the registered adder.
struct AdderSuite;

impl<E: SimulationEngine + ?Sized> TestBody<E> for AdderSuite {
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError> {
        harness.reset()?;
        for _ in 0..iterations(harness)? {
            let a = harness.random().wide(WideAdder::WIDTH);
            let b = harness.random().wide(WideAdder::WIDTH);
            let sum = WideValue::from(a.as_biguint() + b.as_biguint());
            harness.poke_wide("a", &a)?;
            harness.poke_wide("b", &b)?;
            harness.step(1)?;
            let _ = harness.expect_wide("sum", &sum)?;
        }
        Ok(())
    }
}

/// Runs of non-blocking steps with the counter enabled, checked at each synchronization point.
struct CounterSuite;

impl<E: SimulationEngine + ?Sized> TestBody<E> for CounterSuite {
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError> {
        harness.reset()?;
        harness.poke("enable", 1)?;
        let start = harness.cycles();
        for _ in 0..iterations(harness)? {
            let burst = harness.random().gen_range(1..=4);
            for _ in 0..burst {
                let cycles = harness.random().gen_range(1..=16);
                harness.step_nonblocking(cycles)?;
            }
            let expected = (harness.cycles() - start) as u32;
            let _ = harness.expect("count", expected)?;
        }
        Ok(())
    }
}

/// Feeds the serial bridge's input through the loopback design and captures the echo.
struct SerialEchoSuite;

impl<E: SimulationEngine + ?Sized> TestBody<E> for SerialEchoSuite {
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError> {
        harness.reset()?;
        loop {
            let next = harness.get_bridge::<SerialBridge>()?.pop_input();
            match next {
                Some(byte) => {
                    harness.poke_nonblocking("rx_valid", 1)?;
                    harness.poke_nonblocking("rx_data", u32::from(byte))?;
                }
                None => harness.poke_nonblocking("rx_valid", 0)?,
            }
            harness.step(1)?;
            if harness.peek("tx_valid")? == 0 {
                break;
            }
            let data = harness.peek("tx_data")?;
            harness.get_bridge::<SerialBridge>()?.receive(data as u8);
        }
        Ok(())
    }
}
