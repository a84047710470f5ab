//! Serial (UART-style) bridge.
//!
//! Host-side model of a byte-stream peripheral. Bytes queued with [`SerialBridge::send`] are
//! handed to the design one at a time; bytes the design emits are fed to
//! [`SerialBridge::receive`], which keeps a full transcript, echoes completed lines through
//! `tracing`, and scans the stream for a failure pattern. At finalization the bridge fails if
//! the pattern was seen or the transcript differs from the expected one.

use std::any::Any;
use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::{info, warn};

use super::traits::{Bridge, BridgeKind, BridgeResult};
use crate::common::BridgeError;
use crate::config::SerialConfig;

/// Threshold for flushing a partial output line to the log (4 KiB).
const LINE_FLUSH_THRESHOLD: usize = 4096;

/// Serial bridge state.
#[derive(Debug, Clone, Default)]
pub struct SerialBridge {
    /// Bridge name.
    name: String,
    /// Bytes queued for the design at initialization.
    initial_input: Vec<u8>,
    /// Bytes waiting to be consumed by the design.
    rx_queue: VecDeque<u8>,
    /// Output bytes since the last completed line.
    line_buffer: Vec<u8>,
    /// Every byte the design has emitted.
    transcript: Vec<u8>,
    /// Echo completed lines at `info`.
    echo: bool,
    /// Lowercased failure pattern.
    fail_pattern: Option<Vec<u8>>,
    /// Last `fail_pattern.len()` output bytes, lowercased.
    window: VecDeque<u8>,
    /// Set once the failure pattern has been seen.
    failure_detected: bool,
    /// Transcript the design must produce for the bridge to pass.
    expected: Option<Vec<u8>>,
}

impl SerialBridge {
    /// Creates a serial bridge with no input, no echo, and no checks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a serial bridge from its configuration entry.
    pub fn from_config(config: &SerialConfig) -> Self {
        let mut bridge = Self::new(config.name.clone()).with_echo(config.echo);
        if let Some(pattern) = &config.fail_pattern {
            bridge = bridge.with_fail_pattern(pattern);
        }
        if let Some(expected) = &config.expect {
            bridge = bridge.with_expected_transcript(expected);
        }
        if let Some(input) = &config.input {
            bridge = bridge.with_input(input.as_bytes());
        }
        bridge
    }

    /// Enables or disables line echo.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Marks the run as failed if `pattern` ever appears in the output (case-insensitive).
    ///
    /// An empty pattern disables matching.
    #[must_use]
    pub fn with_fail_pattern(mut self, pattern: &str) -> Self {
        self.fail_pattern = (!pattern.is_empty()).then(|| pattern.to_ascii_lowercase().into_bytes());
        self
    }

    /// Requires the complete output transcript to equal `expected`.
    #[must_use]
    pub fn with_expected_transcript(mut self, expected: &str) -> Self {
        self.expected = Some(expected.as_bytes().to_vec());
        self
    }

    /// Queues bytes for the design, delivered after initialization.
    #[must_use]
    pub fn with_input(mut self, input: &[u8]) -> Self {
        self.initial_input.extend_from_slice(input);
        self
    }

    /// Queues bytes for the design.
    pub fn send(&mut self, bytes: &[u8]) {
        self.rx_queue.extend(bytes);
    }

    /// Takes the next byte waiting for the design.
    pub fn pop_input(&mut self) -> Option<u8> {
        self.rx_queue.pop_front()
    }

    /// Number of bytes waiting for the design.
    pub fn pending_input(&self) -> usize {
        self.rx_queue.len()
    }

    /// Accepts one byte emitted by the design.
    pub fn receive(&mut self, byte: u8) {
        self.transcript.push(byte);
        self.scan_for_failure(byte);

        if byte == b'\n' {
            self.flush_line();
        } else {
            self.line_buffer.push(byte);
            if self.line_buffer.len() >= LINE_FLUSH_THRESHOLD {
                self.flush_line();
            }
        }
    }

    /// Accepts a run of bytes emitted by the design.
    pub fn receive_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.receive(byte);
        }
    }

    /// Every byte the design has emitted so far.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// The transcript as text, with invalid UTF-8 replaced.
    pub fn transcript_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.transcript)
    }

    /// Returns `true` once the failure pattern has appeared in the output.
    pub const fn failure_detected(&self) -> bool {
        self.failure_detected
    }

    /// Slides the match window forward by one output byte.
    fn scan_for_failure(&mut self, byte: u8) {
        let Some(pattern) = &self.fail_pattern else {
            return;
        };
        if self.window.len() == pattern.len() {
            let _ = self.window.pop_front();
        }
        self.window.push_back(byte.to_ascii_lowercase());
        if self.window.len() == pattern.len() && self.window.iter().eq(pattern.iter()) {
            if !self.failure_detected {
                warn!(bridge = %self.name, "failure pattern detected in serial output");
            }
            self.failure_detected = true;
        }
    }

    /// Emits the buffered partial line, if echo is on.
    fn flush_line(&mut self) {
        if self.echo && !self.line_buffer.is_empty() {
            info!(bridge = %self.name, "{}", String::from_utf8_lossy(&self.line_buffer));
        }
        self.line_buffer.clear();
    }
}

impl Bridge for SerialBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BridgeKind {
        BridgeKind::Serial
    }

    fn init(&mut self) -> Result<(), BridgeError> {
        self.rx_queue.clear();
        self.rx_queue.extend(&self.initial_input);
        self.line_buffer.clear();
        self.transcript.clear();
        self.window.clear();
        self.failure_detected = false;
        Ok(())
    }

    fn finalize(&mut self) -> BridgeResult {
        self.flush_line();
        if self.failure_detected {
            return BridgeResult::Failed("failure pattern seen in serial output".to_owned());
        }
        match &self.expected {
            Some(expected) if *expected != self.transcript => BridgeResult::Failed(format!(
                "serial transcript {:?} does not match expected {:?}",
                self.transcript_str(),
                String::from_utf8_lossy(expected)
            )),
            _ => BridgeResult::Passed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
