use hwloop_core::SimulationEngine;
use hwloop_core::channel::TokenDigest;
use hwloop_core::common::{ChannelError, WideValue};
use mockall::mock;

mock! {
    pub EngineOps {
        pub fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), ChannelError>;
        pub fn read_wide(&mut self, id: &str) -> Result<WideValue, ChannelError>;
        pub fn request_step(&mut self, cycles: u32) -> Result<(), ChannelError>;
        pub fn is_idle(&mut self) -> bool;
        pub fn drain(&mut self) -> Result<u64, ChannelError>;
        pub fn token_digest(&self) -> Option<TokenDigest>;
    }
}

/// Engine whose behavior is scripted through `ops`.
pub struct MockedEngine {
    pub ops: MockEngineOps,
    name: String,
}

impl MockedEngine {
    pub fn new(name: &str) -> Self {
        Self {
            ops: MockEngineOps::new(),
            name: name.to_owned(),
        }
    }

    /// Engine that accepts everything, keeps no digest, and reports `cycle` on every drain.
    pub fn permissive(name: &str, cycle: u64) -> Self {
        let mut engine = Self::new(name);
        engine.ops.expect_write_wide().returning(|_, _| Ok(()));
        engine.ops.expect_request_step().returning(|_| Ok(()));
        engine.ops.expect_is_idle().return_const(true);
        engine.ops.expect_drain().returning(move || Ok(cycle));
        engine.ops.expect_token_digest().return_const(None::<TokenDigest>);
        engine
    }
}

impl SimulationEngine for MockedEngine {
    fn target_name(&self) -> &str {
        &self.name
    }

    fn write_wide(&mut self, id: &str, value: &WideValue) -> Result<(), ChannelError> {
        self.ops.write_wide(id, value)
    }

    fn read_wide(&mut self, id: &str) -> Result<WideValue, ChannelError> {
        self.ops.read_wide(id)
    }

    fn request_step(&mut self, cycles: u32) -> Result<(), ChannelError> {
        self.ops.request_step(cycles)
    }

    fn is_idle(&mut self) -> bool {
        self.ops.is_idle()
    }

    fn drain(&mut self) -> Result<u64, ChannelError> {
        self.ops.drain()
    }

    fn token_digest(&self) -> Option<TokenDigest> {
        self.ops.token_digest()
    }
}
