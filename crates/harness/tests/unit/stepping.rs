//! # Stepping Tests
//!
//! Verifies that the cycle counter is exact after blocking steps, an upper bound under
//! non-blocking steps, and exact again after any synchronization point; and that a device
//! reporting a different cycle is a fatal desynchronization.

use hwloop_core::bridges::BridgeRegistry;
use hwloop_core::common::{FatalChannelError, HarnessError, WideValue};
use hwloop_core::harness::TestHarness;
use hwloop_core::sim::ReferenceEngine;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::context::{engine, quiet_config};
use crate::common::mocks::engine::MockedEngine;

/// Counter design with `enable` held high, so `count` equals the device cycle.
fn counting_engine(cycles_per_poll: u32) -> ReferenceEngine {
    engine("counter").with_cycles_per_poll(cycles_per_poll)
}

#[test]
fn blocking_steps_are_exact() {
    let mut engine = counting_engine(1);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config())
            .unwrap();

    harness.poke("enable", 1).unwrap();
    harness.step(3).unwrap();
    harness.step(4).unwrap();
    assert_eq!(harness.cycles(), 7);
    assert_eq!(harness.pending_cycles(), 0);
    assert_eq!(harness.peek("count").unwrap(), 7);
    assert!(harness.teardown().passed);
}

#[test]
fn nonblocking_steps_advance_counter_optimistically() {
    let mut engine = counting_engine(1);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config())
            .unwrap();

    harness.poke("enable", 1).unwrap();
    harness.step_nonblocking(10).unwrap();
    assert_eq!(harness.cycles(), 10);
    assert_eq!(harness.pending_cycles(), 10);

    let stale = harness.sample_value("count").unwrap();
    assert!(stale < WideValue::from(10u32));

    // A blocking peek drains the outstanding steps first.
    assert_eq!(harness.peek("count").unwrap(), 10);
    assert_eq!(harness.pending_cycles(), 0);
}

#[test]
fn nonblocking_peeks_observe_the_device_behind_the_counter() {
    let mut engine = counting_engine(1);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config())
            .unwrap();

    harness.poke("enable", 1).unwrap();
    harness.step_nonblocking(10).unwrap();

    let narrow = harness.peek_nonblocking("count").unwrap();
    let wide = harness.peek_wide_nonblocking("count").unwrap();
    assert!(narrow < 10);
    assert!(wide < WideValue::from(10u32));
    // Neither read confirms the outstanding cycles.
    assert_eq!(harness.pending_cycles(), 10);
    assert_eq!(harness.cycles(), 10);

    assert_eq!(harness.peek("count").unwrap(), 10);
    assert_eq!(harness.pending_cycles(), 0);
}

#[test]
fn zero_cycle_step_is_a_no_op() {
    let mut engine = counting_engine(1);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config())
            .unwrap();
    harness.step(0).unwrap();
    harness.step_nonblocking(0).unwrap();
    assert_eq!(harness.cycles(), 0);
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(12)]
fn target_reset_holds_reset_for_pulse_length(#[case] pulse: u32) {
    let mut engine = counting_engine(4);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config())
            .unwrap();

    harness.poke("enable", 1).unwrap();
    harness.step(3).unwrap();
    harness.target_reset(pulse).unwrap();
    assert_eq!(harness.cycles(), 3 + u64::from(pulse));
    assert_eq!(harness.peek("count").unwrap(), 0);
    assert_eq!(harness.peek("reset").unwrap(), 0);

    harness.step(2).unwrap();
    assert_eq!(harness.peek("count").unwrap(), 2);
}

#[test]
fn reset_uses_configured_pulse_length() {
    let mut engine = counting_engine(1);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::new(&mut engine, &mut registry, &["+reset-pulse=8", "+nolog"], "Counter").unwrap();
    harness.reset().unwrap();
    assert_eq!(harness.cycles(), 8);
}

#[test]
fn device_cycle_mismatch_is_fatal() {
    // The device reports a cycle that never moves, whatever the harness asks for.
    let mut engine = MockedEngine::permissive("dut", 100);
    let mut registry = BridgeRegistry::new();
    let mut harness =
        TestHarness::with_config(&mut engine, &mut registry, &[] as &[&str], "dut", quiet_config())
            .unwrap();

    let err = harness.step(2).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::FatalChannel(FatalChannelError::Desynchronized {
            expected: 2,
            device: 0
        })
    ));
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Step(u32),
    StepNonblocking(u32),
    Peek,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..20).prop_map(Op::Step),
        (0u32..20).prop_map(Op::StepNonblocking),
        Just(Op::Peek),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn blocking_steps_sum_exactly(steps in prop::collection::vec(0u32..50, 0..20)) {
        let mut engine = counting_engine(3);
        let mut registry = BridgeRegistry::new();
        let mut harness = TestHarness::with_config(
            &mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config(),
        ).unwrap();
        for &n in &steps {
            harness.step(n).unwrap();
        }
        let total: u64 = steps.iter().map(|&n| u64::from(n)).sum();
        prop_assert_eq!(harness.cycles(), total);
    }

    #[test]
    fn counter_agrees_with_device_after_every_blocking_op(
        ops in prop::collection::vec(op(), 1..30),
        cycles_per_poll in 1u32..8,
    ) {
        let mut engine = counting_engine(cycles_per_poll);
        let mut registry = BridgeRegistry::new();
        let mut harness = TestHarness::with_config(
            &mut engine, &mut registry, &[] as &[&str], "Counter", quiet_config(),
        ).unwrap();
        harness.poke("enable", 1).unwrap();

        let mut issued = 0u64;
        for op in ops {
            match op {
                Op::Step(n) => {
                    harness.step(n).unwrap();
                    issued += u64::from(n);
                    prop_assert_eq!(harness.pending_cycles(), 0);
                }
                Op::StepNonblocking(n) => {
                    harness.step_nonblocking(n).unwrap();
                    issued += u64::from(n);
                }
                Op::Peek => {
                    let count = harness.peek("count").unwrap();
                    prop_assert_eq!(u64::from(count), harness.cycles());
                }
            }
            prop_assert_eq!(harness.cycles(), issued);
        }

        harness.synchronize().unwrap();
        let outcome = harness.teardown();
        prop_assert_eq!(outcome.cycles, issued);
        prop_assert_eq!(engine.cycle(), issued);
    }
}
