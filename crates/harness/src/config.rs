//! Configuration system for the test harness.
//!
//! This module defines the structures used to parameterize a harness run. It provides:
//! 1. **Defaults:** Baseline constants (seed, reset signal, pulse length, logging).
//! 2. **Structures:** The harness settings and the bridge descriptions a registry is built from.
//! 3. **Overrides:** `+name=value` plusargs from the test argument list, applied on top of JSON.
//!
//! Configuration is supplied as JSON (`HarnessConfig::from_json` / `HarnessConfig::load`) or
//! use `HarnessConfig::default()`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Default configuration constants for the harness.
mod defaults {
    /// Seed of the stimulus generator.
    pub const RANDOM_SEED: u64 = 0;

    /// Name of the design's synchronous reset input.
    pub const RESET_SIGNAL: &str = "reset";

    /// Cycles the reset input is held asserted by `target_reset`.
    pub const RESET_PULSE_LENGTH: u32 = 5;

    /// Per-operation logging (STEP/POKE/PEEK/EXPECT lines) at `info` level.
    pub const LOG: bool = true;

    /// Token digests are compared at every synchronization point.
    pub const VERIFY_TOKENS: bool = true;

    /// Sector size of block-device bridges in bytes.
    pub const SECTOR_SIZE: usize = 512;
}

/// Plusarg overriding the stimulus seed.
const PLUSARG_SEED: &str = "+seed=";
/// Plusarg disabling per-operation logging.
const PLUSARG_NOLOG: &str = "+nolog";
/// Plusarg overriding the reset pulse length.
const PLUSARG_RESET_PULSE: &str = "+reset-pulse=";

/// Errors raised while loading or overriding configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The JSON text did not describe a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A recognized plusarg carried a malformed value.
    #[error("invalid plusarg `{arg}`: {reason}")]
    Plusarg {
        /// The argument as given.
        arg: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Root harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarnessConfig {
    /// Seed of the stimulus generator.
    #[serde(default = "HarnessConfig::default_random_seed")]
    pub random_seed: u64,

    /// Log every step/poke/peek/expect at `info` (otherwise at `debug`).
    #[serde(default = "HarnessConfig::default_log")]
    pub log: bool,

    /// Name of the reset input driven by `target_reset`.
    #[serde(default = "HarnessConfig::default_reset_signal")]
    pub reset_signal: String,

    /// Default pulse length for `reset`.
    #[serde(default = "HarnessConfig::default_reset_pulse_length")]
    pub reset_pulse_length: u32,

    /// Compare host and device token digests at synchronization points.
    #[serde(default = "HarnessConfig::default_verify_tokens")]
    pub verify_tokens: bool,

    /// Bridges to register, in initialization order.
    #[serde(default)]
    pub bridges: Vec<BridgeConfig>,
}

impl HarnessConfig {
    /// Returns the default stimulus seed.
    const fn default_random_seed() -> u64 {
        defaults::RANDOM_SEED
    }

    /// Returns the default logging switch.
    const fn default_log() -> bool {
        defaults::LOG
    }

    /// Returns the default reset signal name.
    fn default_reset_signal() -> String {
        defaults::RESET_SIGNAL.to_owned()
    }

    /// Returns the default reset pulse length.
    const fn default_reset_pulse_length() -> u32 {
        defaults::RESET_PULSE_LENGTH
    }

    /// Returns the default token verification switch.
    const fn default_verify_tokens() -> bool {
        defaults::VERIFY_TOKENS
    }

    /// Parses a configuration from JSON text; missing fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `text` - JSON object.
    ///
    /// # Returns
    ///
    /// The parsed configuration, or `ConfigError::Parse`.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Applies recognized plusargs from a test argument list.
    ///
    /// Recognized: `+seed=<u64>`, `+nolog`, `+reset-pulse=<u32>`. All other arguments belong to
    /// the test body and are ignored here.
    ///
    /// # Arguments
    ///
    /// * `args` - Test arguments, in order; later occurrences win.
    ///
    /// # Returns
    ///
    /// `ConfigError::Plusarg` if a recognized plusarg has an unparseable value.
    pub fn apply_plusargs<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), ConfigError> {
        for arg in args {
            let arg = arg.as_ref();
            if let Some(value) = arg.strip_prefix(PLUSARG_SEED) {
                self.random_seed = parse_plusarg(arg, value)?;
                info!("Using custom seed: {}", self.random_seed);
            } else if arg == PLUSARG_NOLOG {
                self.log = false;
            } else if let Some(value) = arg.strip_prefix(PLUSARG_RESET_PULSE) {
                self.reset_pulse_length = parse_plusarg(arg, value)?;
            }
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            random_seed: defaults::RANDOM_SEED,
            log: defaults::LOG,
            reset_signal: defaults::RESET_SIGNAL.to_owned(),
            reset_pulse_length: defaults::RESET_PULSE_LENGTH,
            verify_tokens: defaults::VERIFY_TOKENS,
            bridges: Vec::new(),
        }
    }
}

/// Parses the numeric value of a plusarg.
fn parse_plusarg<T>(arg: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::Plusarg {
        arg: arg.to_owned(),
        reason: err.to_string(),
    })
}

/// Description of one bridge widget to register.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeConfig {
    /// UART-style serial bridge.
    Serial(SerialConfig),
    /// Sector-addressed block storage bridge.
    BlockDevice(BlockDeviceConfig),
}

impl BridgeConfig {
    /// Name of the bridge this entry describes.
    pub fn name(&self) -> &str {
        match self {
            Self::Serial(cfg) => &cfg.name,
            Self::BlockDevice(cfg) => &cfg.name,
        }
    }
}

/// Serial bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SerialConfig {
    /// Bridge name, used in logs and finalization reports.
    pub name: String,

    /// Echo each completed output line through `tracing`.
    #[serde(default)]
    pub echo: bool,

    /// Output text that marks the run as failed when seen (matched case-insensitively).
    #[serde(default)]
    pub fail_pattern: Option<String>,

    /// Exact output transcript required for the bridge to pass.
    #[serde(default)]
    pub expect: Option<String>,

    /// Bytes queued for the design before the test starts.
    #[serde(default)]
    pub input: Option<String>,
}

/// Block-device bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockDeviceConfig {
    /// Bridge name, used in logs and finalization reports.
    pub name: String,

    /// Backing image loaded at initialization.
    #[serde(default)]
    pub image: Option<PathBuf>,

    /// Capacity in sectors when no image is given (or minimum capacity when one is).
    #[serde(default)]
    pub sectors: u64,

    /// Sector size in bytes.
    #[serde(default = "BlockDeviceConfig::default_sector_size")]
    pub sector_size: usize,

    /// Write a modified image back to `image` at finalization.
    #[serde(default)]
    pub write_back: bool,
}

impl BlockDeviceConfig {
    /// Returns the default sector size in bytes.
    const fn default_sector_size() -> usize {
        defaults::SECTOR_SIZE
    }
}
