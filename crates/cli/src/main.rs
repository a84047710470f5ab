//! Hardware-in-the-loop test harness CLI.
//!
//! This binary runs a built-in suite against a built-in design on the reference engine. It
//! performs:
//! 1. **Setup:** Loads the harness configuration (JSON) and builds the bridge registry from it.
//! 2. **Run:** Drives the suite through `run_simulation`; trailing arguments (plusargs
//!    included) are passed to the harness.
//! 3. **Exit:** Exits with the test's status: 0 on pass, 1 on failure or fatal error.

mod suites;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use hwloop_core::bridges::SerialBridge;
use hwloop_core::sim::{DESIGN_NAMES, ReferenceEngine, design_by_name};
use hwloop_core::{BridgeRegistry, HarnessConfig, HarnessError, run_simulation};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hwloop",
    author,
    version,
    about = "Hardware-in-the-loop test harness",
    long_about = "Run a built-in test suite against a built-in design on the reference engine.\n\nExamples:\n  hwloop run register\n  hwloop run adder -- +seed=7 +iterations=500\n  hwloop run serial-echo --config serial.json -- +nolog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the suite for a design.
    Run {
        /// Design to simulate (see `hwloop list`).
        design: String,

        /// Harness configuration file (JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Clock edges the reference engine advances per poll.
        #[arg(long, default_value_t = 1)]
        cycles_per_poll: u32,

        /// Test arguments, e.g. `+seed=7 +nolog +iterations=100`.
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// List the built-in designs.
    List,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            design,
            config,
            cycles_per_poll,
            args,
        } => match cmd_run(&design, config, cycles_per_poll, &args) {
            Ok(status) => process::exit(status),
            Err(err) => {
                error!("{err}");
                process::exit(1);
            }
        },
        Commands::List => {
            for name in DESIGN_NAMES {
                println!("{name}");
            }
        }
    }
}

/// Builds the engine, registry, and suite for `design` and runs it.
///
/// # Returns
///
/// The test's exit status, or the error that stopped it.
fn cmd_run(
    design: &str,
    config_path: Option<PathBuf>,
    cycles_per_poll: u32,
    args: &[String],
) -> Result<i32, HarnessError> {
    let config = match config_path {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };

    let target = design_by_name(design).ok_or_else(|| {
        HarnessError::Configuration(format!(
            "unknown design `{design}` (available: {})",
            DESIGN_NAMES.join(", ")
        ))
    })?;
    let mut engine = ReferenceEngine::new(target).with_cycles_per_poll(cycles_per_poll);

    let mut registry = BridgeRegistry::from_config(&config.bridges)?;
    if design == "serial-echo" && registry.get_all::<SerialBridge>().is_empty() {
        registry.add_bridge(Box::new(
            SerialBridge::new("uart0")
                .with_echo(true)
                .with_input(b"hello, hwloop\n")
                .with_expected_transcript("hello, hwloop\n"),
        ));
    }

    let mut suite = suites::suite_for(design).ok_or_else(|| {
        HarnessError::Configuration(format!("no built-in suite for design `{design}`"))
    })?;
    let outcome = run_simulation(&mut engine, &mut registry, args, config, suite.as_mut())?;
    Ok(outcome.exit_status())
}
