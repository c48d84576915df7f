//! Power demo - desktop emulator entry point
//!
//! Runs one of the demos against host bindings:
//!
//! ```bash
//! cargo run -p firmware --features emulator -- frequency
//! POWER_MODE=LIGHT_SLEEP_TIMER cargo run -p firmware --features emulator -- sleep
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use firmware::config::{self, WAKE_TIMER_US};
use firmware::emulator::{host_power_manager, HostSleep, LoggingLed, TracingLog};
use firmware::{DemoError, FrequencySweep, ModeSelection, SleepDemo};
use platform::EmbassyClock;

#[derive(Parser)]
#[command(name = "power-demo")]
#[command(about = "Power-management demos on the desktop emulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// Report power configuration and DFS locks, then sweep 80/160/240 MHz
    Frequency,
    /// Run the build-time selected sleep mode (POWER_MODE)
    Sleep,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let result = match cli.demo {
        Demo::Frequency => run_frequency().await,
        Demo::Sleep => run_sleep().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fatal(&err),
    }
}

async fn run_frequency() -> Result<(), DemoError> {
    let mut demo = FrequencySweep::new(host_power_manager(), EmbassyClock::new(), TracingLog);
    match demo.run().await? {}
}

async fn run_sleep() -> Result<(), DemoError> {
    let selection = config::mode_selection();
    let sleep = HostSleep::from_env();
    if let ModeSelection::Mode(mode) = selection {
        tracing::info!(
            mode = mode.name(),
            wake_us = WAKE_TIMER_US,
            boot = sleep.boot_count(),
            "Sleep demo"
        );
    }

    SleepDemo::new(sleep, EmbassyClock::new(), TracingLog, LoggingLed::new())
        .run(selection)
        .await
}

/// Hardware call failures are unrecoverable: report and abort.
fn fatal(err: &DemoError) -> ExitCode {
    match err.call() {
        Some(call) => tracing::error!(call = call.name(), "Fatal: {}", err),
        None => tracing::error!("Fatal: {}", err),
    }
    ExitCode::FAILURE
}
