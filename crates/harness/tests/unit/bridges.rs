//! # Bridge Tests
//!
//! Verifies registry lifecycle ordering and typed lookup, and the built-in serial and
//! block-device bridges, including a full test driving the serial loopback design.

use hwloop_core::bridges::{
    BlockDeviceBridge, Bridge, BridgeKind, BridgeRegistry, BridgeResult, SerialBridge,
};
use hwloop_core::common::{BridgeError, HarnessError};
use hwloop_core::config::{BridgeConfig, HarnessConfig};
use hwloop_core::harness::TestHarness;
use mockall::Sequence;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::context::{args, engine, quiet_config};
use crate::common::mocks::bridge::MockedBridge;

// ══════════════════════════════════════════════════════════
// 1. Registry
// ══════════════════════════════════════════════════════════

#[test]
fn lifecycle_follows_registration_order() {
    let mut seq = Sequence::new();
    let mut first = MockedBridge::new("first", BridgeKind::Custom("mock"));
    let mut second = MockedBridge::new("second", BridgeKind::Custom("mock"));
    first.hooks.expect_init().times(1).in_sequence(&mut seq).returning(|| Ok(()));
    second.hooks.expect_init().times(1).in_sequence(&mut seq).returning(|| Ok(()));
    first
        .hooks
        .expect_finalize()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(BridgeResult::Passed);
    second
        .hooks
        .expect_finalize()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(BridgeResult::Passed);

    let mut registry = BridgeRegistry::new().with_bridge(first).with_bridge(second);
    assert_eq!(registry.names(), vec!["first", "second"]);
    registry.init_all().unwrap();
    assert_eq!(registry.initialized(), 2);

    let reports = registry.finalize_all();
    assert!(reports.iter().all(|r| r.result.is_passed()));
    assert_eq!(registry.initialized(), 0);
    // A second finalize has nothing left to do.
    assert!(registry.finalize_all().is_empty());
}

#[test]
fn failing_finalizer_does_not_stop_the_others() {
    let mut registry = BridgeRegistry::new()
        .with_bridge(MockedBridge::healthy("a", BridgeResult::Failed("x".to_owned())))
        .with_bridge(MockedBridge::healthy("b", BridgeResult::Passed));
    registry.init_all().unwrap();

    let reports = registry.finalize_all();
    assert_eq!(reports.len(), 2);
    assert!(!reports[0].result.is_passed());
    assert!(reports[1].result.is_passed());
}

#[test]
fn get_all_returns_every_match_or_none() {
    let mut registry = BridgeRegistry::new()
        .with_bridge(SerialBridge::new("uart0"))
        .with_bridge(SerialBridge::new("uart1"))
        .with_bridge(BlockDeviceBridge::new("disk", 4, 512));

    let serials: Vec<String> = registry
        .get_all::<SerialBridge>()
        .iter()
        .map(|b| b.name().to_owned())
        .collect();
    assert_eq!(serials, vec!["uart0", "uart1"]);
    assert!(registry.get_all::<MockedBridge>().is_empty());
    assert_eq!(registry.of_kind(BridgeKind::BlockDevice).len(), 1);
    assert!(registry.by_name("uart1").is_some());
    assert!(registry.by_name("uart2").is_none());
}

#[rstest]
#[case::missing(0)]
#[case::ambiguous(2)]
fn get_one_requires_exactly_one_match(#[case] count: usize) {
    let mut registry = BridgeRegistry::new();
    for i in 0..count {
        registry.add_bridge(Box::new(SerialBridge::new(format!("uart{i}"))));
    }
    let err = registry.get_one::<SerialBridge>().unwrap_err();
    assert!(matches!(err, HarnessError::Configuration(_)));
}

#[test]
fn get_one_returns_the_single_match() {
    let mut registry = BridgeRegistry::new()
        .with_bridge(SerialBridge::new("uart0"))
        .with_bridge(BlockDeviceBridge::new("disk", 1, 512));
    let disk = registry.get_one::<BlockDeviceBridge>().unwrap();
    assert_eq!(disk.name(), "disk");
}

#[test]
fn registry_from_config_rejects_duplicate_names() {
    let config = HarnessConfig::from_json(
        r#"{ "bridges": [
            { "type": "serial", "name": "io" },
            { "type": "block_device", "name": "io", "sectors": 1 }
        ] }"#,
    )
    .unwrap();
    let err = BridgeRegistry::from_config(&config.bridges).unwrap_err();
    assert!(matches!(err, HarnessError::Configuration(_)));
}

#[test]
fn registry_from_config_builds_in_order() {
    let config = HarnessConfig::from_json(
        r#"{ "bridges": [
            { "type": "block_device", "name": "disk", "sectors": 2 },
            { "type": "serial", "name": "uart0", "input": "go" }
        ] }"#,
    )
    .unwrap();
    let mut registry = BridgeRegistry::from_config(&config.bridges).unwrap();
    assert_eq!(registry.names(), vec!["disk", "uart0"]);
    assert!(matches!(config.bridges[0], BridgeConfig::BlockDevice(_)));

    registry.init_all().unwrap();
    let serial = registry.get_one::<SerialBridge>().unwrap();
    assert_eq!(serial.pending_input(), 2);
}

// ══════════════════════════════════════════════════════════
// 2. Serial bridge
// ══════════════════════════════════════════════════════════

#[test]
fn serial_captures_transcript_and_checks_expectation() {
    let mut serial = SerialBridge::new("uart0").with_expected_transcript("hello\n");
    serial.init().unwrap();
    serial.receive_all(b"hello\n");
    assert_eq!(serial.transcript_str(), "hello\n");
    assert_eq!(serial.finalize(), BridgeResult::Passed);

    serial.init().unwrap();
    serial.receive_all(b"help\n");
    assert!(!serial.finalize().is_passed());
}

#[test]
fn serial_failure_pattern_is_case_insensitive() {
    let mut serial = SerialBridge::new("uart0").with_fail_pattern("kernel panic");
    serial.init().unwrap();
    serial.receive_all(b"booting...\nKernel Panic - not syncing\n");
    assert!(serial.failure_detected());
    assert!(!serial.finalize().is_passed());
}

#[test]
fn serial_loopback_through_harness() {
    let mut engine = engine("serial-echo");
    let mut registry = BridgeRegistry::new().with_bridge(
        SerialBridge::new("uart0")
            .with_input(b"ping")
            .with_expected_transcript("ping"),
    );

    let outcome = TestHarness::with_config(
        &mut engine,
        &mut registry,
        &args(&[]),
        "SerialEcho",
        quiet_config(),
    )
    .unwrap()
    .simulation_run_with(|h| {
        h.reset()?;
        loop {
            let next = h.get_bridge::<SerialBridge>()?.pop_input();
            match next {
                Some(byte) => {
                    h.poke("rx_valid", 1)?;
                    h.poke("rx_data", u32::from(byte))?;
                }
                None => h.poke("rx_valid", 0)?,
            }
            h.step(1)?;
            if h.peek("tx_valid")? == 0 {
                break;
            }
            let data = h.peek("tx_data")? as u8;
            h.get_bridge::<SerialBridge>()?.receive(data);
        }
        Ok(())
    })
    .unwrap();

    assert!(outcome.passed, "{:?}", outcome.failures);
}

// ══════════════════════════════════════════════════════════
// 3. Block-device bridge
// ══════════════════════════════════════════════════════════

#[test]
fn block_device_pads_image_and_bounds_checks() {
    let mut disk = BlockDeviceBridge::new("disk", 4, 512);
    disk.load(vec![0xAB; 700]);
    disk.init().unwrap();
    assert_eq!(disk.sectors(), 4);

    let sector = disk.read_sector(1).unwrap();
    assert_eq!(&sector[..188], &[0xAB; 188][..]);
    assert_eq!(sector[188], 0);

    assert!(disk.write_sector(3, &[7; 512]));
    assert_eq!(disk.read_sector(3).unwrap(), vec![7; 512]);
    assert_eq!(disk.reads(), 2);
    assert_eq!(disk.writes(), 1);
    assert_eq!(disk.finalize(), BridgeResult::Passed);
}

#[rstest]
#[case::past_end(4, 512)]
#[case::short_write(0, 100)]
fn invalid_requests_fail_the_bridge(#[case] lba: u64, #[case] len: usize) {
    let mut disk = BlockDeviceBridge::new("disk", 4, 512);
    disk.init().unwrap();
    assert!(!disk.write_sector(lba, &vec![1; len]));
    assert_eq!(disk.errors().len(), 1);
    assert!(!disk.finalize().is_passed());
}

#[test]
fn block_device_loads_and_writes_back_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk.img");
    std::fs::write(&path, vec![1u8; 1024]).unwrap();

    let mut disk = BlockDeviceBridge::new("disk", 0, 512)
        .with_image(&path)
        .with_write_back(true);
    disk.init().unwrap();
    assert_eq!(disk.sectors(), 2);
    assert!(disk.write_sector(0, &[9; 512]));
    assert!(disk.finalize().is_passed());

    let image = std::fs::read(&path).unwrap();
    assert_eq!(image[0], 9);
    assert_eq!(image[512], 1);
}

#[test]
fn missing_image_fails_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let mut disk = BlockDeviceBridge::new("disk", 1, 512).with_image(dir.path().join("absent.img"));
    assert!(matches!(disk.init(), Err(BridgeError::Io { .. })));
}

#[test]
fn zero_sector_size_is_invalid() {
    let mut disk = BlockDeviceBridge::new("disk", 1, 0);
    assert!(matches!(disk.init(), Err(BridgeError::Invalid(_))));
}
