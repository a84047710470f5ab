//! # Configuration Tests
//!
//! Verifies defaults, JSON parsing (including bridge descriptions), file loading, and plusarg
//! overrides.

use std::io::Write;
use std::path::PathBuf;

use hwloop_core::HarnessConfig;
use hwloop_core::config::{BlockDeviceConfig, BridgeConfig, ConfigError, SerialConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn defaults_match_documented_values() {
    let config = HarnessConfig::default();
    assert_eq!(config.random_seed, 0);
    assert!(config.log);
    assert_eq!(config.reset_signal, "reset");
    assert_eq!(config.reset_pulse_length, 5);
    assert!(config.verify_tokens);
    assert!(config.bridges.is_empty());
}

#[test]
fn empty_json_object_yields_defaults() {
    assert_eq!(HarnessConfig::from_json("{}").unwrap(), HarnessConfig::default());
}

#[test]
fn json_describes_bridges_in_order() {
    let config = HarnessConfig::from_json(
        r#"{
            "random_seed": 7,
            "bridges": [
                { "type": "serial", "name": "uart0", "fail_pattern": "panic" },
                { "type": "block_device", "name": "disk", "sectors": 8 }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(config.random_seed, 7);
    assert_eq!(
        config.bridges,
        vec![
            BridgeConfig::Serial(SerialConfig {
                name: "uart0".to_owned(),
                echo: false,
                fail_pattern: Some("panic".to_owned()),
                expect: None,
                input: None,
            }),
            BridgeConfig::BlockDevice(BlockDeviceConfig {
                name: "disk".to_owned(),
                image: None,
                sectors: 8,
                sector_size: 512,
                write_back: false,
            }),
        ]
    );
    assert_eq!(config.bridges[1].name(), "disk");
}

#[test]
fn unknown_bridge_type_is_a_parse_error() {
    let err = HarnessConfig::from_json(r#"{ "bridges": [ { "type": "tape", "name": "t" } ] }"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "log": false, "reset_signal": "rst_n" }}"#).unwrap();

    let config = HarnessConfig::load(file.path()).unwrap();
    assert!(!config.log);
    assert_eq!(config.reset_signal, "rst_n");
}

#[test]
fn load_reports_missing_file() {
    let err = HarnessConfig::load(PathBuf::from("/nonexistent/hwloop.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[rstest]
#[case(&["+seed=1234"], 1234, true, 5)]
#[case(&["+nolog"], 0, false, 5)]
#[case(&["+reset-pulse=9", "body-arg"], 0, true, 9)]
#[case(&["+seed=1", "+seed=2"], 2, true, 5)]
#[case(&["seed=3", "-nolog"], 0, true, 5)]
fn plusargs_override_config(
    #[case] args: &[&str],
    #[case] seed: u64,
    #[case] log: bool,
    #[case] pulse: u32,
) {
    let mut config = HarnessConfig::default();
    config.apply_plusargs(args).unwrap();
    assert_eq!(config.random_seed, seed);
    assert_eq!(config.log, log);
    assert_eq!(config.reset_pulse_length, pulse);
}

#[rstest]
#[case("+seed=abc")]
#[case("+seed=-1")]
#[case("+reset-pulse=")]
fn malformed_plusarg_is_rejected(#[case] arg: &str) {
    let mut config = HarnessConfig::default();
    let err = config.apply_plusargs(&[arg]).unwrap_err();
    assert!(matches!(err, ConfigError::Plusarg { .. }));
}
