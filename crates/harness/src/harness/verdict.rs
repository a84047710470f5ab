//! Assertion and verdict tracking.
//!
//! The verdict starts passing and is monotone: the first failure flips it for good. Only an
//! assertion failure sets the fail cycle, and only the first one does; bridge failures flip the
//! verdict without touching it.

/// One recorded divergence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Harness cycle at which the failure was recorded.
    pub cycle: u64,
    /// Diagnostic text.
    pub message: String,
}

/// Aggregate pass/fail state of one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictTracker {
    pass: bool,
    fail_t: Option<u64>,
    failures: Vec<FailureRecord>,
}

impl Default for VerdictTracker {
    fn default() -> Self {
        Self {
            pass: true,
            fail_t: None,
            failures: Vec::new(),
        }
    }
}

impl VerdictTracker {
    /// Creates a passing tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one assertion.
    ///
    /// # Arguments
    ///
    /// * `ok` - Outcome of this assertion.
    /// * `cycle` - Current harness cycle.
    /// * `message` - Diagnostic text, kept only if the assertion failed.
    ///
    /// # Returns
    ///
    /// `ok`, unchanged.
    pub fn record(&mut self, ok: bool, cycle: u64, message: impl FnOnce() -> String) -> bool {
        if !ok {
            if self.pass {
                self.fail_t = Some(cycle);
            }
            self.pass = false;
            self.failures.push(FailureRecord {
                cycle,
                message: message(),
            });
        }
        ok
    }

    /// Records a failure reported by a bridge at finalization.
    pub fn record_bridge_failure(&mut self, cycle: u64, bridge: &str, reason: &str) {
        self.pass = false;
        self.failures.push(FailureRecord {
            cycle,
            message: format!("bridge `{bridge}`: {reason}"),
        });
    }

    /// Aggregate verdict so far.
    pub const fn passed(&self) -> bool {
        self.pass
    }

    /// Cycle of the first failing assertion, if any.
    pub const fn fail_cycle(&self) -> Option<u64> {
        self.fail_t
    }

    /// Every recorded failure, in order.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Consumes the tracker, returning its failure records.
    pub fn into_failures(self) -> Vec<FailureRecord> {
        self.failures
    }
}
