//! Bridge registry construction from configuration.
//!
//! This module builds a `BridgeRegistry` from the `bridges` list of a harness configuration. It
//! performs:
//! 1. **Validation:** Rejects duplicate bridge names before anything is instantiated.
//! 2. **Instantiation:** Creates a serial or block-device bridge per entry, in list order.

use std::collections::HashSet;

use super::block_device::BlockDeviceBridge;
use super::registry::BridgeRegistry;
use super::serial::SerialBridge;
use crate::common::HarnessError;
use crate::config::BridgeConfig;

impl BridgeRegistry {
    /// Builds a registry holding one bridge per configuration entry.
    ///
    /// Bridges are registered (and later initialized) in list order. Nothing is initialized
    /// here; the harness does that at construction.
    ///
    /// # Arguments
    ///
    /// * `configs` - Bridge descriptions, typically `HarnessConfig::bridges`.
    ///
    /// # Returns
    ///
    /// The registry, or `HarnessError::Configuration` if two entries share a name.
    pub fn from_config(configs: &[BridgeConfig]) -> Result<Self, HarnessError> {
        let mut seen = HashSet::new();
        if let Some(dup) = configs.iter().find(|cfg| !seen.insert(cfg.name())) {
            return Err(HarnessError::Configuration(format!(
                "bridge name `{}` is used more than once",
                dup.name()
            )));
        }

        let mut registry = Self::new();
        for config in configs {
            match config {
                BridgeConfig::Serial(cfg) => {
                    registry.add_bridge(Box::new(SerialBridge::from_config(cfg)));
                }
                BridgeConfig::BlockDevice(cfg) => {
                    registry.add_bridge(Box::new(BlockDeviceBridge::from_config(cfg)));
                }
            }
        }
        Ok(registry)
    }
}
