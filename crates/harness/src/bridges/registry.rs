//! Bridge registry and lifecycle management.
//!
//! This module implements the owner of every bridge widget for one test. It provides:
//! 1. **Registration:** Bridges are kept in registration order, which is also init/finalize order.
//! 2. **Lifecycle:** `init_all` stops at the first failure; `finalize_all` visits every bridge that came up.
//! 3. **Lookup:** Typed lookup (all matches, or exactly one) and lookup by capability or name.

use std::any::type_name;

use tracing::{debug, warn};

use super::traits::{Bridge, BridgeKind, BridgeResult};
use crate::common::HarnessError;

/// Finalization outcome of one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReport {
    /// Bridge name.
    pub name: String,
    /// Capability category.
    pub kind: BridgeKind,
    /// The bridge's own verdict.
    pub result: BridgeResult,
}

/// Registry owning the bridge widgets of one test.
///
/// The harness borrows the registry for its whole lifetime; bridges are never destroyed by it.
#[derive(Default)]
pub struct BridgeRegistry {
    /// Registered bridges, in registration order.
    bridges: Vec<Box<dyn Bridge>>,
    /// Number of leading bridges that have been initialized and not yet finalized.
    initialized: usize,
}

impl BridgeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bridge after all previously registered ones.
    ///
    /// # Arguments
    ///
    /// * `bridge` - The bridge to add; it is initialized after every bridge registered before it.
    pub fn add_bridge(&mut self, bridge: Box<dyn Bridge>) {
        debug!(bridge = bridge.name(), kind = %bridge.kind(), "registered bridge");
        self.bridges.push(bridge);
    }

    /// Builder-style [`add_bridge`](Self::add_bridge).
    #[must_use]
    pub fn with_bridge(mut self, bridge: impl Bridge) -> Self {
        self.add_bridge(Box::new(bridge));
        self
    }

    /// Number of registered bridges.
    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    /// Returns `true` if no bridges are registered.
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }

    /// Number of bridges currently initialized.
    pub const fn initialized(&self) -> usize {
        self.initialized
    }

    /// Names of all registered bridges, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.bridges.iter().map(|b| b.name()).collect()
    }

    /// Initializes every bridge not yet initialized, in registration order.
    ///
    /// Stops at the first failure; the bridges before it stay initialized so the caller can
    /// finalize them.
    ///
    /// # Returns
    ///
    /// `HarnessError::BridgeInit` naming the first bridge that failed.
    pub fn init_all(&mut self) -> Result<(), HarnessError> {
        while let Some(bridge) = self.bridges.get_mut(self.initialized) {
            debug!(bridge = bridge.name(), "initializing bridge");
            bridge.init().map_err(|source| HarnessError::BridgeInit {
                bridge: bridge.name().to_owned(),
                source,
            })?;
            self.initialized += 1;
        }
        Ok(())
    }

    /// Finalizes every initialized bridge, in registration order.
    ///
    /// A failing bridge does not stop the others from being finalized.
    ///
    /// # Returns
    ///
    /// One report per finalized bridge.
    pub fn finalize_all(&mut self) -> Vec<BridgeReport> {
        let reports: Vec<BridgeReport> = self.bridges[..self.initialized]
            .iter_mut()
            .map(|bridge| {
                let result = bridge.finalize();
                if let BridgeResult::Failed(reason) = &result {
                    warn!(bridge = bridge.name(), "bridge finalization failed: {reason}");
                }
                BridgeReport {
                    name: bridge.name().to_owned(),
                    kind: bridge.kind(),
                    result,
                }
            })
            .collect();
        self.initialized = 0;
        reports
    }

    /// Returns every bridge of concrete type `T` (possibly none).
    pub fn get_all<T: Bridge>(&mut self) -> Vec<&mut T> {
        self.bridges
            .iter_mut()
            .filter_map(|b| b.as_any_mut().downcast_mut::<T>())
            .collect()
    }

    /// Returns the single bridge of concrete type `T`.
    ///
    /// # Returns
    ///
    /// `HarnessError::Configuration` if no bridge or more than one bridge has type `T`.
    pub fn get_one<T: Bridge>(&mut self) -> Result<&mut T, HarnessError> {
        let matches = self
            .bridges
            .iter()
            .filter(|b| b.as_any().is::<T>())
            .count();
        if matches != 1 {
            return Err(HarnessError::Configuration(format!(
                "expected exactly one `{}` bridge, found {matches}",
                type_name::<T>()
            )));
        }
        self.bridges
            .iter_mut()
            .find_map(|b| b.as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| {
                HarnessError::Configuration(format!("no `{}` bridge registered", type_name::<T>()))
            })
    }

    /// Returns every bridge with the given capability.
    pub fn of_kind(&mut self, kind: BridgeKind) -> Vec<&mut (dyn Bridge + 'static)> {
        self.bridges
            .iter_mut()
            .filter(|b| b.kind() == kind)
            .map(|b| b.as_mut())
            .collect()
    }

    /// Returns the first bridge registered under `name`.
    pub fn by_name(&mut self, name: &str) -> Option<&mut (dyn Bridge + 'static)> {
        self.bridges
            .iter_mut()
            .find(|b| b.name() == name)
            .map(|b| b.as_mut())
    }
}

impl std::fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRegistry")
            .field("bridges", &self.names())
            .field("initialized", &self.initialized)
            .finish()
    }
}
