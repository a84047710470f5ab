//! Test harness orchestrator.
//!
//! This module composes the channel, stepping controller, verdict tracker, and bridge registry
//! into the object a concrete test drives. It provides:
//! 1. **Lifecycle:** Construction initializes every bridge; `teardown` finalizes them and
//!    combines their results with the harness's own verdict.
//! 2. **Stimulus:** Blocking and non-blocking `step` and `poke`, plus a composite reset.
//! 3. **Observation:** Synchronizing `peek`, stale-tolerant `peek_nonblocking` and `sample_value`.
//! 4. **Assertions:** Non-fatal `expect` variants that record the first failing cycle.
//!
//! A test is a [`TestBody`]; [`run_simulation`] builds a harness for it, runs it once, and
//! tears the harness down.

/// Cycle counter and synchronization.
pub mod stepping;

/// Pass/fail bookkeeping.
pub mod verdict;

use tracing::{error, info, warn};

use crate::bridges::{Bridge, BridgeKind, BridgeRegistry, BridgeReport, BridgeResult};
use crate::channel::{SignalChannel, SimulationEngine};
use crate::common::{HarnessError, TestRng, WideValue};
use crate::config::HarnessConfig;
use crate::stats::HarnessStats;

pub use stepping::StepController;
pub use verdict::{FailureRecord, VerdictTracker};

/// Logs a per-operation line at `info` when logging is on, `debug` otherwise.
macro_rules! oplog {
    ($harness:expr, $($arg:tt)+) => {
        if $harness.config.log {
            ::tracing::info!($($arg)+);
        } else {
            ::tracing::debug!($($arg)+);
        }
    };
}

/// Lifecycle state of a harness instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// Constructed; bridges not yet initialized.
    Constructed,
    /// Every bridge initialized; the test body has not started.
    BridgesInitialized,
    /// The test body is running.
    Running,
    /// Bridges finalized; the harness is spent.
    TornDown,
}

/// A concrete test: the body run once between bridge initialization and teardown.
pub trait TestBody<E: SimulationEngine + ?Sized> {
    /// Drives the design through `harness`.
    ///
    /// Assertion failures are recorded and do not stop the body; returning an error aborts the
    /// test after best-effort bridge finalization.
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError>;
}

/// Any closure over the harness is a test body.
impl<E, F> TestBody<E> for F
where
    E: SimulationEngine + ?Sized,
    F: FnMut(&mut TestHarness<'_, E>) -> Result<(), HarnessError>,
{
    fn run_test(&mut self, harness: &mut TestHarness<'_, E>) -> Result<(), HarnessError> {
        self(harness)
    }
}

/// Final result of a completed test.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Name of the simulated target design.
    pub target: String,
    /// Aggregate verdict: harness assertions AND every bridge's result.
    pub passed: bool,
    /// Cycle of the first failing assertion, if any.
    pub fail_cycle: Option<u64>,
    /// Harness cycle at teardown.
    pub cycles: u64,
    /// Every recorded failure, assertion and bridge alike.
    pub failures: Vec<FailureRecord>,
    /// Per-bridge finalization results.
    pub bridge_reports: Vec<BridgeReport>,
    /// Operation statistics.
    pub stats: HarnessStats,
}

impl TestOutcome {
    /// Process exit status: 0 on success, 1 otherwise.
    pub const fn exit_status(&self) -> i32 {
        if self.passed { 0 } else { 1 }
    }
}

/// Harness driving one test against one target design.
///
/// Borrows the engine and the bridge registry for its whole lifetime. Single-use: `teardown`
/// and `simulation_run` consume it.
pub struct TestHarness<'a, E: SimulationEngine + ?Sized> {
    /// Channel to the device.
    channel: SignalChannel<'a, E>,
    /// Bridges owned by the caller.
    registry: &'a mut BridgeRegistry,
    /// Effective configuration (after plusargs).
    config: HarnessConfig,
    /// Test arguments, opaque to the harness beyond its own plusargs.
    args: Vec<String>,
    /// Target design name, used in logs.
    target_name: String,
    /// Stimulus generator seeded from `config.random_seed`.
    random: TestRng,
    /// Cycle counter.
    stepping: StepController,
    /// Pass/fail state.
    verdict: VerdictTracker,
    /// Operation counters.
    stats: HarnessStats,
    /// Lifecycle state.
    state: HarnessState,
}

impl<'a, E: SimulationEngine + ?Sized> TestHarness<'a, E> {
    /// Creates a harness with the default configuration.
    ///
    /// See [`with_config`](Self::with_config).
    pub fn new<S: AsRef<str>>(
        engine: &'a mut E,
        registry: &'a mut BridgeRegistry,
        args: &[S],
        target_name: &str,
    ) -> Result<Self, HarnessError> {
        Self::with_config(engine, registry, args, target_name, HarnessConfig::default())
    }

    /// Creates a harness, attaches it to the engine, and initializes every bridge.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine driving the target design.
    /// * `registry` - Bridges to initialize now and finalize at teardown.
    /// * `args` - Test arguments; `+seed=`, `+nolog`, and `+reset-pulse=` are applied to `config`.
    /// * `target_name` - Name of the target design, used in logs.
    /// * `config` - Harness configuration.
    ///
    /// # Returns
    ///
    /// The harness in the `BridgesInitialized` state. If a bridge fails to initialize, the
    /// bridges already brought up are finalized and the error is returned.
    pub fn with_config<S: AsRef<str>>(
        engine: &'a mut E,
        registry: &'a mut BridgeRegistry,
        args: &[S],
        target_name: &str,
        mut config: HarnessConfig,
    ) -> Result<Self, HarnessError> {
        config.apply_plusargs(args)?;

        let mut channel = SignalChannel::attach(engine)?;
        if !config.verify_tokens {
            channel = channel.with_verifier(None);
        }

        let mut harness = Self {
            channel,
            registry,
            random: TestRng::new(config.random_seed),
            config,
            args: args.iter().map(|a| a.as_ref().to_owned()).collect(),
            target_name: target_name.to_owned(),
            stepping: StepController::new(),
            verdict: VerdictTracker::new(),
            stats: HarnessStats::default(),
            state: HarnessState::Constructed,
        };

        if let Err(err) = harness.registry.init_all() {
            let _ = harness.registry.finalize_all();
            return Err(err);
        }
        harness.state = HarnessState::BridgesInitialized;
        info!(
            target_design = %harness.target_name,
            bridges = harness.registry.len(),
            seed = harness.config.random_seed,
            "harness ready"
        );
        Ok(harness)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stepping
    // ═══════════════════════════════════════════════════════════════════════

    /// Advances the design by `cycles` and waits until it gets there.
    pub fn step(&mut self, cycles: u32) -> Result<(), HarnessError> {
        self.step_with(cycles, true)
    }

    /// Issues a step of `cycles` without waiting for the device.
    ///
    /// `cycles()` advances immediately and is exact again after the next blocking operation.
    pub fn step_nonblocking(&mut self, cycles: u32) -> Result<(), HarnessError> {
        self.step_with(cycles, false)
    }

    /// Advances the design by `cycles`, optionally waiting for the device.
    pub fn step_with(&mut self, cycles: u32, blocking: bool) -> Result<(), HarnessError> {
        self.stepping.step(&mut self.channel, cycles, blocking)?;
        self.stats.steps += 1;
        self.stats.stepped_cycles += u64::from(cycles);
        if blocking {
            self.stats.sync_points += 1;
        } else {
            self.stats.nonblocking_steps += 1;
        }
        oplog!(self, "* STEP {} -> {} *", cycles, self.stepping.cycles());
        Ok(())
    }

    /// Holds the reset signal asserted for `pulse_length` cycles, then releases it.
    pub fn target_reset(&mut self, pulse_length: u32) -> Result<(), HarnessError> {
        let reset = self.config.reset_signal.clone();
        self.poke(&reset, 1)?;
        self.step(pulse_length)?;
        self.poke(&reset, 0)
    }

    /// [`target_reset`](Self::target_reset) with the configured pulse length (default 5).
    pub fn reset(&mut self) -> Result<(), HarnessError> {
        self.target_reset(self.config.reset_pulse_length)
    }

    /// Waits for every outstanding step and write to reach the device.
    pub fn synchronize(&mut self) -> Result<(), HarnessError> {
        self.stepping.synchronize(&mut self.channel)?;
        self.stats.sync_points += 1;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Poke / Peek
    // ═══════════════════════════════════════════════════════════════════════

    /// Writes a 32-bit value and waits until the design sees it.
    pub fn poke(&mut self, id: &str, value: u32) -> Result<(), HarnessError> {
        self.poke_with(id, &WideValue::from(value), true)
    }

    /// Queues a 32-bit write; it is visible after the next synchronization point.
    pub fn poke_nonblocking(&mut self, id: &str, value: u32) -> Result<(), HarnessError> {
        self.poke_with(id, &WideValue::from(value), false)
    }

    /// Writes a wide value and waits until the design sees it.
    pub fn poke_wide(&mut self, id: &str, value: &WideValue) -> Result<(), HarnessError> {
        self.poke_with(id, value, true)
    }

    /// Writes a value of any width, optionally waiting for the design to see it.
    ///
    /// # Returns
    ///
    /// `HarnessError::Resolution` if the signal is unknown, read-only, or narrower than `value`.
    pub fn poke_with(
        &mut self,
        id: &str,
        value: &WideValue,
        blocking: bool,
    ) -> Result<(), HarnessError> {
        oplog!(self, "* POKE {}.{} <- {:#x} *", self.target_name, id, value);
        match value.to_u32() {
            Some(narrow) => self.channel.write(id, narrow)?,
            None => self.channel.write_wide(id, value)?,
        }
        self.stats.pokes += 1;
        if blocking {
            self.synchronize()?;
        }
        Ok(())
    }

    /// Reads a 32-bit signal after synchronizing.
    pub fn peek(&mut self, id: &str) -> Result<u32, HarnessError> {
        self.synchronize()?;
        let value = self.channel.read(id)?;
        self.stats.peeks += 1;
        oplog!(self, "* PEEK {}.{} -> {:#x} *", self.target_name, id, value);
        Ok(value)
    }

    /// Reads a 32-bit signal without synchronizing.
    ///
    /// The value may be stale if steps or writes are still outstanding; a warning is logged
    /// when that is the case.
    pub fn peek_nonblocking(&mut self, id: &str) -> Result<u32, HarnessError> {
        self.warn_if_stale(id);
        let value = self.channel.read(id)?;
        self.stats.peeks += 1;
        oplog!(self, "* PEEK {}.{} -> {:#x} *", self.target_name, id, value);
        Ok(value)
    }

    /// Reads a signal of any width after synchronizing.
    pub fn peek_wide(&mut self, id: &str) -> Result<WideValue, HarnessError> {
        let value = self.read_synchronized(id)?;
        oplog!(self, "* PEEK {}.{} -> {:#x} *", self.target_name, id, value);
        Ok(value)
    }

    /// Reads a signal of any width without synchronizing; see [`peek_nonblocking`](Self::peek_nonblocking).
    pub fn peek_wide_nonblocking(&mut self, id: &str) -> Result<WideValue, HarnessError> {
        self.warn_if_stale(id);
        let value = self.channel.read_wide(id)?;
        self.stats.peeks += 1;
        oplog!(self, "* PEEK {}.{} -> {:#x} *", self.target_name, id, value);
        Ok(value)
    }

    /// Reads a signal of any width after synchronizing, assigning into `value` in place.
    pub fn peek_wide_into(&mut self, id: &str, value: &mut WideValue) -> Result<(), HarnessError> {
        let read = self.peek_wide(id)?;
        value.assign(&read);
        Ok(())
    }

    /// Lightweight diagnostic read: no synchronization, no staleness warning, no PEEK line.
    ///
    /// Returns whatever the engine currently exposes for `id`, which may lag outstanding
    /// non-blocking steps and writes.
    pub fn sample_value(&mut self, id: &str) -> Result<WideValue, HarnessError> {
        let value = self.channel.read_wide(id)?;
        self.stats.samples += 1;
        Ok(value)
    }

    /// Synchronizes, then reads a signal of any width.
    fn read_synchronized(&mut self, id: &str) -> Result<WideValue, HarnessError> {
        self.synchronize()?;
        let value = self.channel.read_wide(id)?;
        self.stats.peeks += 1;
        Ok(value)
    }

    /// Warns when a non-blocking read may observe a stale value.
    fn warn_if_stale(&mut self, id: &str) {
        if !self.stepping.is_synchronized() || !self.channel.is_idle() {
            warn!(
                "* PEEK {}.{} may be stale: {} cycle(s) not yet confirmed *",
                self.target_name,
                id,
                self.stepping.pending()
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Assertions
    // ═══════════════════════════════════════════════════════════════════════

    /// Peeks `id` and compares it with a 32-bit expected value.
    ///
    /// A mismatch is recorded, not raised: the first one sets the fail cycle to `cycles()`.
    ///
    /// # Returns
    ///
    /// The outcome of this comparison (not the aggregate verdict), or a fatal error if the
    /// signal could not be read.
    pub fn expect(&mut self, id: &str, expected: u32) -> Result<bool, HarnessError> {
        self.expect_wide(id, &WideValue::from(expected))
    }

    /// Peeks `id` and compares it with a wide expected value.
    pub fn expect_wide(&mut self, id: &str, expected: &WideValue) -> Result<bool, HarnessError> {
        let value = self.read_synchronized(id)?;
        let ok = value == *expected;
        oplog!(
            self,
            "* EXPECT {}.{} -> {:#x} ?= {:#x} : {} *",
            self.target_name,
            id,
            value,
            expected,
            verdict_label(ok)
        );
        Ok(self.record(ok, || {
            format!("{id}: read {value:#x}, expected {expected:#x}")
        }))
    }

    /// Records a pre-computed assertion under a diagnostic label.
    ///
    /// # Returns
    ///
    /// `ok`, unchanged.
    pub fn expect_that(&mut self, ok: bool, message: &str) -> bool {
        oplog!(self, "* EXPECT {} : {} *", message, verdict_label(ok));
        self.record(ok, || message.to_owned())
    }

    /// Feeds one assertion outcome to the verdict tracker and the statistics.
    fn record(&mut self, ok: bool, message: impl FnOnce() -> String) -> bool {
        self.stats.record_assertion(ok);
        let cycle = self.stepping.cycles();
        if !ok && self.verdict.passed() {
            warn!("* first failure of {} at cycle {} *", self.target_name, cycle);
        }
        self.verdict.record(ok, cycle, message)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// Upper bound on the cycle reached by the target; exact after a blocking operation.
    pub const fn cycles(&self) -> u64 {
        self.stepping.cycles()
    }

    /// Cycles issued but not yet confirmed by the device.
    pub const fn pending_cycles(&self) -> u64 {
        self.stepping.pending()
    }

    /// Aggregate verdict so far.
    pub const fn pass(&self) -> bool {
        self.verdict.passed()
    }

    /// Cycle of the first failing assertion, if any.
    pub const fn fail_cycle(&self) -> Option<u64> {
        self.verdict.fail_cycle()
    }

    /// Every failure recorded so far.
    pub fn failures(&self) -> &[FailureRecord] {
        self.verdict.failures()
    }

    /// Stimulus generator, seeded from the configuration (`+seed=` overrides).
    pub const fn random(&mut self) -> &mut TestRng {
        &mut self.random
    }

    /// Test arguments as supplied at construction.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Name of the target design.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Effective configuration.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Operation counters.
    pub const fn stats(&self) -> &HarnessStats {
        &self.stats
    }

    /// Lifecycle state.
    pub const fn state(&self) -> HarnessState {
        self.state
    }

    /// Every registered bridge of concrete type `T` (possibly none).
    pub fn get_bridges<T: Bridge>(&mut self) -> Vec<&mut T> {
        self.registry.get_all::<T>()
    }

    /// The single registered bridge of concrete type `T`.
    ///
    /// # Returns
    ///
    /// `HarnessError::Configuration` if there is no such bridge or more than one.
    pub fn get_bridge<T: Bridge>(&mut self) -> Result<&mut T, HarnessError> {
        self.registry.get_one::<T>()
    }

    /// Every registered bridge with the given capability.
    pub fn bridges_of_kind(&mut self, kind: BridgeKind) -> Vec<&mut (dyn Bridge + 'static)> {
        self.registry.of_kind(kind)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Runs `body` once, synchronizes, then tears the harness down.
    ///
    /// # Returns
    ///
    /// The test outcome, or the fatal error that ended the body or the final synchronization.
    /// On error every initialized bridge is still finalized, best-effort.
    pub fn simulation_run<B: TestBody<E> + ?Sized>(
        mut self,
        body: &mut B,
    ) -> Result<TestOutcome, HarnessError> {
        self.state = HarnessState::Running;
        let result = body.run_test(&mut self);
        self.conclude(result)
    }

    /// [`simulation_run`](Self::simulation_run) with a closure as the test body.
    pub fn simulation_run_with<F>(mut self, body: F) -> Result<TestOutcome, HarnessError>
    where
        F: FnOnce(&mut Self) -> Result<(), HarnessError>,
    {
        self.state = HarnessState::Running;
        let result = body(&mut self);
        self.conclude(result)
    }

    /// Drains whatever the body left outstanding, then tears down or aborts.
    fn conclude(mut self, result: Result<(), HarnessError>) -> Result<TestOutcome, HarnessError> {
        match result.and_then(|()| self.synchronize()) {
            Ok(()) => Ok(self.teardown()),
            Err(err) => Err(self.abort(err)),
        }
    }

    /// Finalizes every bridge and computes the aggregate verdict.
    ///
    /// Bridges are finalized whatever the harness verdict is. A failing bridge flips the
    /// verdict but leaves the fail cycle of an earlier assertion untouched.
    ///
    /// Called directly, no final synchronization happens: outstanding non-blocking steps and
    /// writes stay unconfirmed and `TestOutcome::cycles` is only an upper bound. Call
    /// [`synchronize`](Self::synchronize) first to make it exact.
    pub fn teardown(mut self) -> TestOutcome {
        let cycle = self.stepping.cycles();
        let reports = self.registry.finalize_all();
        for report in &reports {
            if let BridgeResult::Failed(reason) = &report.result {
                self.verdict.record_bridge_failure(cycle, &report.name, reason);
            }
        }
        self.state = HarnessState::TornDown;

        let passed = self.verdict.passed();
        let fail_cycle = self.verdict.fail_cycle();
        match (passed, fail_cycle) {
            (true, _) => info!("[PASS] {} Test", self.target_name),
            (false, Some(t)) => info!("[FAIL] {} Test at cycle {}", self.target_name, t),
            (false, None) => info!("[FAIL] {} Test", self.target_name),
        }
        if self.config.log {
            self.stats.print();
        }

        TestOutcome {
            target: self.target_name,
            passed,
            fail_cycle,
            cycles: cycle,
            failures: self.verdict.into_failures(),
            bridge_reports: reports,
            stats: self.stats,
        }
    }

    /// Best-effort cleanup after a fatal error.
    fn abort(mut self, err: HarnessError) -> HarnessError {
        error!(
            "[ERROR] {} Test aborted at cycle {}: {}",
            self.target_name,
            self.stepping.cycles(),
            err
        );
        let _ = self.registry.finalize_all();
        self.state = HarnessState::TornDown;
        err
    }
}

impl<E: SimulationEngine + ?Sized> std::fmt::Debug for TestHarness<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("target_name", &self.target_name)
            .field("state", &self.state)
            .field("stepping", &self.stepping)
            .field("verdict", &self.verdict)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Runs one test end to end: builds the harness, runs `body`, tears down.
///
/// The target name is taken from the engine.
///
/// # Arguments
///
/// * `engine` - Engine driving the target design.
/// * `registry` - Bridges for this test.
/// * `args` - Test arguments (plusargs included).
/// * `config` - Harness configuration.
/// * `body` - The test.
///
/// # Returns
///
/// The outcome, whose `exit_status` is the process exit code; or the fatal error that ended
/// construction or the body.
pub fn run_simulation<E, B, S>(
    engine: &mut E,
    registry: &mut BridgeRegistry,
    args: &[S],
    config: HarnessConfig,
    body: &mut B,
) -> Result<TestOutcome, HarnessError>
where
    E: SimulationEngine + ?Sized,
    B: TestBody<E> + ?Sized,
    S: AsRef<str>,
{
    let target = engine.target_name().to_owned();
    TestHarness::with_config(engine, registry, args, &target, config)?.simulation_run(body)
}

/// Log label of an assertion outcome.
const fn verdict_label(ok: bool) -> &'static str {
    if ok { "PASS" } else { "FAIL" }
}
