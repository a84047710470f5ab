use hwloop_core::HarnessConfig;
use hwloop_core::sim::{ReferenceEngine, design_by_name};

/// Installs a test-friendly tracing subscriber once per process.
///
/// Output goes through the test writer, so it only shows for failing tests; `RUST_LOG`
/// controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Builds a reference engine for a built-in design.
pub fn engine(design: &str) -> ReferenceEngine {
    init_tracing();
    match design_by_name(design) {
        Some(design) => ReferenceEngine::new(design),
        None => panic!("unknown built-in design `{design}`"),
    }
}

/// Owned argument list from string literals.
pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Default configuration with per-operation logging at `debug`.
pub fn quiet_config() -> HarnessConfig {
    HarnessConfig {
        log: false,
        ..HarnessConfig::default()
    }
}
