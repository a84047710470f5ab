//! Harness operation statistics.
//!
//! This module tracks what one test did to the design. It provides:
//! 1. **Traffic:** Steps, stepped cycles, pokes, peeks, and unsynchronized samples.
//! 2. **Synchronization:** Non-blocking steps issued and drains performed.
//! 3. **Assertions:** Passing and failing `expect` calls.
//! 4. **Timing:** Wall-clock duration and the resulting simulated frequency.

use std::fmt::Write as _;
use std::time::Instant;

use tracing::info;

/// Separator line of the statistics report.
const RULE: &str = "----------------------------------------------------------";

/// Operation counters for one harness instance.
#[derive(Debug, Clone)]
pub struct HarnessStats {
    start_time: Instant,
    /// `step` calls, blocking or not.
    pub steps: u64,
    /// Clock edges requested across all steps.
    pub stepped_cycles: u64,
    /// `step` calls issued without waiting for the device.
    pub nonblocking_steps: u64,
    /// Signal writes.
    pub pokes: u64,
    /// Signal reads, including the reads behind `expect`.
    pub peeks: u64,
    /// Reads issued through `sample_value`.
    pub samples: u64,
    /// Drains performed (explicit or forced by a blocking operation).
    pub sync_points: u64,
    /// `expect` calls that held.
    pub assertions_passed: u64,
    /// `expect` calls that failed.
    pub assertions_failed: u64,
}

impl Default for HarnessStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            steps: 0,
            stepped_cycles: 0,
            nonblocking_steps: 0,
            pokes: 0,
            peeks: 0,
            samples: 0,
            sync_points: 0,
            assertions_passed: 0,
            assertions_failed: 0,
        }
    }
}

impl HarnessStats {
    /// Seconds elapsed since the harness was constructed.
    pub fn host_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Records one assertion outcome.
    pub const fn record_assertion(&mut self, ok: bool) {
        if ok {
            self.assertions_passed += 1;
        } else {
            self.assertions_failed += 1;
        }
    }

    /// Renders the statistics report.
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> String {
        let seconds = self.host_seconds();
        let khz = if seconds > 0.0 {
            (self.stepped_cycles as f64 / seconds) / 1000.0
        } else {
            0.0
        };

        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "HARNESS STATISTICS");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "host_seconds             {seconds:.4} s");
        let _ = writeln!(out, "sim_cycles               {}", self.stepped_cycles);
        let _ = writeln!(out, "sim_freq                 {khz:.2} kHz");
        let _ = writeln!(
            out,
            "steps                    {} ({} non-blocking)",
            self.steps, self.nonblocking_steps
        );
        let _ = writeln!(out, "sync_points              {}", self.sync_points);
        let _ = writeln!(out, "pokes                    {}", self.pokes);
        let _ = writeln!(
            out,
            "peeks                    {} (+{} samples)",
            self.peeks, self.samples
        );
        let _ = writeln!(
            out,
            "assertions               {} passed, {} failed",
            self.assertions_passed, self.assertions_failed
        );
        let _ = write!(out, "{RULE}");
        out
    }

    /// Logs the statistics report at `info`, one line per entry.
    pub fn print(&self) {
        for line in self.summary().lines() {
            info!("{line}");
        }
    }
}
