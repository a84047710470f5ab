use std::any::Any;

use hwloop_core::bridges::{Bridge, BridgeKind, BridgeResult};
use hwloop_core::common::BridgeError;
use mockall::mock;

mock! {
    pub BridgeHooks {
        pub fn init(&mut self) -> Result<(), BridgeError>;
        pub fn finalize(&mut self) -> BridgeResult;
    }
}

/// Bridge whose lifecycle is scripted through `hooks`.
pub struct MockedBridge {
    pub hooks: MockBridgeHooks,
    name: String,
    kind: BridgeKind,
}

impl MockedBridge {
    pub fn new(name: &str, kind: BridgeKind) -> Self {
        Self {
            hooks: MockBridgeHooks::new(),
            name: name.to_owned(),
            kind,
        }
    }

    /// Bridge expected to come up and go down exactly once, reporting `result`.
    pub fn healthy(name: &str, result: BridgeResult) -> Self {
        let mut bridge = Self::new(name, BridgeKind::Custom("mock"));
        bridge.hooks.expect_init().times(1).returning(|| Ok(()));
        bridge.hooks.expect_finalize().times(1).return_const(result);
        bridge
    }
}

impl Bridge for MockedBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BridgeKind {
        self.kind
    }

    fn init(&mut self) -> Result<(), BridgeError> {
        self.hooks.init()
    }

    fn finalize(&mut self) -> BridgeResult {
        self.hooks.finalize()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
