// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Power demo development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the no_std platform crate, the emulator build, clippy and formatting
    Check,
    /// Run all tests (unit, integration, property and doc tests)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Build and run a demo on the desktop emulator
    Run {
        #[command(subcommand)]
        demo: run::Demo,
        /// Sleep demo mode (ACTIVE, LIGHT_SLEEP_TIMER, DEEP_SLEEP_TIMER), baked in at build time
        #[arg(long, global = true, env = "POWER_MODE")]
        mode: Option<String>,
        /// Wake timer in microseconds, baked in at build time
        #[arg(long, global = true, env = "WAKE_TIMER_US")]
        wake_us: Option<u64>,
        /// Emulator log filter (RUST_LOG syntax)
        #[arg(long, global = true, default_value = "info")]
        log: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Run {
            demo,
            mode,
            wake_us,
            log,
        } => run::run(demo, mode.as_deref(), wake_us, &log),
    }
}
